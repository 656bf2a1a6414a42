//! Daily trigger.
//!
//! The trigger polls a [`Clock`] and runs a job once per day at a fixed local wall-clock time.
//! Time and sleeping are behind traits so the loop can be driven deterministically in tests.

use chrono::{Local, NaiveDateTime, NaiveTime};
use std::time::Duration;

/// Source of the current local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Blocks the calling thread between polls.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// [`Clock`] reading the system's local time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// [`Sleeper`] using `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Once a day at `at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// The first occurrence of the daily time strictly after `now`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use mirror_core::schedule::DailySchedule;
    ///
    /// let schedule = DailySchedule::new(NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    /// let morning = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
    /// let evening = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(18, 0, 0).unwrap();
    ///
    /// assert_eq!(schedule.next_after(morning).to_string(), "2024-03-01 14:00:00");
    /// assert_eq!(schedule.next_after(evening).to_string(), "2024-03-02 14:00:00");
    /// ```
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + chrono::Duration::days(1)
        }
    }
}

/// Blocking poll loop around a [`DailySchedule`].
#[derive(Debug)]
pub struct Scheduler<C = SystemClock, S = ThreadSleeper> {
    schedule: DailySchedule,
    clock: C,
    sleeper: S,
    poll_interval: Duration,
    next_run: NaiveDateTime,
}

impl Scheduler {
    /// Scheduler on the system clock, sleeping the current thread between polls.
    pub fn system(schedule: DailySchedule, poll_interval: Duration) -> Self {
        Self::new(schedule, SystemClock, ThreadSleeper, poll_interval)
    }
}

impl<C: Clock, S: Sleeper> Scheduler<C, S> {
    /// Create a scheduler whose first run is the next occurrence after the clock's current time.
    pub fn new(schedule: DailySchedule, clock: C, sleeper: S, poll_interval: Duration) -> Self {
        let next_run = schedule.next_after(clock.now());
        Self {
            schedule,
            clock,
            sleeper,
            poll_interval,
            next_run,
        }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    /// Run `job` if its time has come, then move the next run to the following day.
    ///
    /// Missed occurrences (for example after the machine slept through several days) collapse
    /// into a single run.
    ///
    /// # Returns
    ///
    /// `true` if the job ran.
    pub fn run_pending<F: FnMut()>(&mut self, job: &mut F) -> bool {
        let now = self.clock.now();
        if now < self.next_run {
            return false;
        }

        job();
        self.next_run = self.schedule.next_after(self.clock.now());
        tracing::info!("next run scheduled for {}", self.next_run);
        true
    }

    /// One poll: [`Self::run_pending`] followed by a sleep of the poll interval.
    pub fn tick<F: FnMut()>(&mut self, job: &mut F) -> bool {
        let ran = self.run_pending(job);
        self.sleeper.sleep(self.poll_interval);
        ran
    }

    /// Poll forever.
    pub fn run_forever<F: FnMut()>(&mut self, mut job: F) -> ! {
        tracing::info!("first run scheduled for {}", self.next_run);
        loop {
            self.tick(&mut job);
        }
    }
}
