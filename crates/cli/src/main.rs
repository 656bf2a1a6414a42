use clap::{Parser, Subcommand};
use mirror_core::{
    logging::init_tracing, DailySchedule, MirrorConfig, MirrorService, RemoteEndpoint,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ftp-mirror")]
#[command(about = "Mirror an FTP directory into a local replica directory")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one download-and-replicate pass now
    Run {
        /// FTP server hostname
        #[arg(long)]
        host: Option<String>,
        /// FTP control port
        #[arg(long)]
        port: Option<u16>,
        /// Remote directory to mirror
        #[arg(long)]
        remote_path: Option<String>,
        /// Local staging directory
        #[arg(long)]
        staging_dir: Option<PathBuf>,
        /// Local replica (internal network) directory
        #[arg(long)]
        replica_dir: Option<PathBuf>,
        /// Log to the console only
        #[arg(long)]
        no_log_file: bool,
    },
    /// Show when the daily run would next happen
    NextRun,
    /// Print the resolved configuration
    ShowConfig,
}

/// Applies command-line overrides on top of the environment configuration.
fn apply_overrides(
    cfg: MirrorConfig,
    host: Option<String>,
    port: Option<u16>,
    remote_path: Option<String>,
    staging_dir: Option<PathBuf>,
    replica_dir: Option<PathBuf>,
) -> mirror_core::MirrorResult<MirrorConfig> {
    let current = cfg.endpoint().clone();
    let endpoint = RemoteEndpoint::new(
        host.as_deref().unwrap_or(current.host()),
        remote_path.as_deref().unwrap_or(current.remote_path()),
    )?
    .with_port(port.unwrap_or(current.port()))?;

    let staging_dir = staging_dir.unwrap_or_else(|| cfg.staging_dir().to_path_buf());
    let replica_dir = replica_dir.unwrap_or_else(|| cfg.replica_dir().to_path_buf());

    cfg.with_endpoint(endpoint)
        .with_directories(staging_dir, replica_dir)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            host,
            port,
            remote_path,
            staging_dir,
            replica_dir,
            no_log_file,
        }) => {
            let cfg = apply_overrides(
                MirrorConfig::from_env()?,
                host,
                port,
                remote_path,
                staging_dir,
                replica_dir,
            )?;
            init_tracing(if no_log_file { None } else { cfg.log_file() })?;

            let service = MirrorService::new(Arc::new(cfg));
            let report = service.run_once();

            println!("{}", report.summary());
            for name in report.failed_downloads() {
                println!("  download failed: {}", name);
            }
            for name in report.failed_copies() {
                println!("  copy failed: {}", name);
            }
            if let Some(reason) = &report.aborted {
                println!("  aborted: {}", reason);
            }
        }
        Some(Commands::NextRun) => {
            let cfg = MirrorConfig::from_env()?;
            let now = chrono::Local::now().naive_local();
            let next = DailySchedule::new(cfg.run_at()).next_after(now);
            println!("Next run: {} (daily at {})", next, cfg.run_at());
        }
        Some(Commands::ShowConfig) => {
            let cfg = MirrorConfig::from_env()?;
            print!("{}", serde_yaml::to_string(&cfg)?);
        }
        None => {
            println!("Use 'ftp-mirror --help' for commands");
        }
    }

    Ok(())
}
