use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum WaypostError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Advertising already started")]
    AlreadyStarted,

    #[error("Transport error for peer {peer}: {message}")]
    Transport { peer: String, message: String },

    #[error("Registry peer {peer} rejected advertise: {status}")]
    Rejected { peer: String, status: u16 },

    #[error("No response from peer {0} within the response wait")]
    ResponseTimeout(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, WaypostError>;

impl From<std::io::Error> for WaypostError {
    fn from(e: std::io::Error) -> Self {
        WaypostError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for WaypostError {
    fn from(e: serde_json::Error) -> Self {
        WaypostError::Json(e.to_string())
    }
}
