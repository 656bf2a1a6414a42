#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] mirror_types::TextError),

    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to connect: {0}")]
    Connect(suppaftp::FtpError),
    #[error("anonymous login rejected: {0}")]
    Login(suppaftp::FtpError),
    #[error("failed to change remote directory to '{path}': {source}")]
    ChangeDir {
        path: String,
        #[source]
        source: suppaftp::FtpError,
    },
    #[error("failed to switch to binary transfer mode: {0}")]
    TransferMode(suppaftp::FtpError),
    #[error("failed to list remote directory: {0}")]
    List(suppaftp::FtpError),
    #[error("failed to retrieve '{name}': {source}")]
    Retrieve {
        name: String,
        #[source]
        source: suppaftp::FtpError,
    },
    #[error("failed to close connection: {0}")]
    Quit(suppaftp::FtpError),

    #[error("failed to prepare staging directory: {0}")]
    StagingDir(mirror_files::FilesError),
    #[error("failed to prepare replica directory: {0}")]
    ReplicaDir(mirror_files::FilesError),
    #[error(transparent)]
    Files(#[from] mirror_files::FilesError),

    #[error("failed to open log file {}: {source}", .path.display())]
    LogFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to initialise logging: {0}")]
    LogSetup(String),
}

pub type MirrorResult<T> = std::result::Result<T, MirrorError>;
