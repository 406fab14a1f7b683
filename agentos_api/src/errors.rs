//! Error types for the API client.

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or invalid URL).
    #[error("Request failed")]
    RequestFailed,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body could not be understood.
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// The backend answered `ok: false`.
    #[error("Rejected by backend: {0}")]
    Rejected(String),
}

impl Error {
    /// Short, user-facing description of the failure. Never includes a body dump.
    pub fn user_message(&self) -> String {
        match self {
            Error::RequestFailed => "backend unreachable".to_string(),
            Error::HttpStatus { status, .. } => format!("backend returned HTTP {}", status),
            Error::Malformed(_) => "unexpected response from backend".to_string(),
            Error::Rejected(msg) => msg.clone(),
        }
    }
}
