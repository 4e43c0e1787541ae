use thiserror::Error;

/// Gateway-level error type. Every public operation returns
/// `Result<T, GatewayError>`, whether it was served by the remote backend or
/// the fallback engine.
///
/// Transient kinds (`NetworkUnreachable`, `Timeout`, cold-start 502/503) are
/// retried inside the request executor and only surface once the attempt
/// budget is exhausted. Authentication failures always surface so the UI can
/// redirect to login.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Authentication expired")]
    AuthenticationExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },
}

impl GatewayError {
    /// Classifies a reqwest transport failure. A deadline miss is a distinct
    /// kind from a refused/dropped connection.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(err.to_string())
        } else {
            GatewayError::NetworkUnreachable(err.to_string())
        }
    }

    /// True when the remote service is confirmed unreachable — the trigger
    /// for the one-directional switch into fallback mode.
    pub(crate) fn is_unreachable(&self) -> bool {
        matches!(self, GatewayError::NetworkUnreachable(_))
    }
}
