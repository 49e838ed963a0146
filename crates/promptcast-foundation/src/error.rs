use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Browser surface error: {0}")]
    Surface(String),

    #[error("Shutdown requested")]
    ShutdownRequested,

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}
