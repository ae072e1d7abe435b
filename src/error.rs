use thiserror::Error;

/// Errors from the authoritative platform API.
///
/// The taxonomy matters more than the payload: an `Unauthenticated` rejection
/// prompts a re-login, a `Transient` failure degrades to last-known values
/// and is retry-safe, and a `Rejected` request surfaces the backend-provided
/// message to the user.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether retrying later with the same inputs could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        // Network-level failures (DNS, connect, timeout) are all retry-safe.
        ApiError::Transient(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ApiError::Transient("timeout".into()).is_transient());
        assert!(!ApiError::Unauthenticated.is_transient());
        assert!(!ApiError::Rejected("insufficient balance".into()).is_transient());
        assert!(!ApiError::Decode("bad json".into()).is_transient());
    }

    #[test]
    fn test_display_carries_backend_message() {
        let e = ApiError::Rejected("Insufficient USDT balance".into());
        assert_eq!(e.to_string(), "rejected by backend: Insufficient USDT balance");
    }
}
