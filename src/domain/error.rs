use thiserror::Error;

/// SockShell unified error type
#[derive(Error, Debug)]
pub enum SockShellError {
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Bind failed on {addr} after {attempts} attempts: {source}")]
    Bind {
        addr: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("No client connected")]
    NotConnected,

    #[error("Invalid transport state: {0}")]
    InvalidState(String),

    #[error("Shell error: {0}")]
    Shell(String),

    #[error("Reset failed: {0}")]
    Reset(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

pub type SockShellResult<T> = Result<T, SockShellError>;
