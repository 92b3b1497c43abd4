use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error from {endpoint}: status {status}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl AppError {
    /// Whether this error came from the transport or a non-success status.
    pub fn is_network(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::HttpStatus { .. } => true,
            AppError::Reqwest(e) => !e.is_decode(),
            _ => false,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::WebSocket(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
