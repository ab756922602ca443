use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BrowserWalletError {
    #[error("{operation} rejected: {reason}")]
    Rejected { operation: &'static str, reason: String },

    #[error("transaction failed: {0}")]
    Submission(String),

    #[error("browser wallet did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("no wallet detected in the browser: {0}")]
    Unavailable(String),

    #[error("browser wallet is not connected")]
    NotConnected,

    #[error("browser wallet server error: {0}")]
    Io(#[from] std::io::Error),
}
