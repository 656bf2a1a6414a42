use std::sync::Arc;

use mirror_core::{logging::init_tracing, MirrorConfig, MirrorService};

/// Main entry point for the scheduled FTP mirror
///
/// Resolves the configuration once, then runs one download-and-replicate pass
/// every day at the configured time until the process is killed.
///
/// # Environment Variables
/// - `FTP_MIRROR_HOST`, `FTP_MIRROR_PORT`, `FTP_MIRROR_REMOTE_PATH`: the remote directory
/// - `FTP_MIRROR_STAGING_DIR`, `FTP_MIRROR_REPLICA_DIR`: the local directories
/// - `FTP_MIRROR_RUN_AT`: daily trigger time, `HH:MM` (default "14:00")
/// - `FTP_MIRROR_RUN_ON_START`: also run once immediately at startup
/// - `FTP_MIRROR_LOG_FILE`: log file path, empty to log to the console only
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cfg = MirrorConfig::from_env()?;
    init_tracing(cfg.log_file())?;

    let cfg = Arc::new(cfg);
    let service = MirrorService::new(cfg.clone());

    tracing::info!(
        "++ Mirroring {} into {} daily at {}",
        cfg.endpoint(),
        cfg.replica_dir().display(),
        cfg.run_at()
    );

    if cfg.run_on_start() {
        service.run_once();
    }

    service.scheduler().run_forever(|| {
        service.run_once();
    })
}
