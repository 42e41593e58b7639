//! Client error types.

use plaza_common::AppError;
use thiserror::Error;

/// Client result type.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by a feed session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote call failed.
    #[error("Remote error: {0}")]
    Remote(#[from] AppError),

    /// A feed entry is missing the target its kind requires.
    #[error("Invalid feed entry {id}: {reason}")]
    InvalidEntry { id: String, reason: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_wraps_app_error() {
        let err: ClientError = AppError::NotFound("User or post not found".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Remote error: Not found: User or post not found"
        );
    }

    #[test]
    fn test_invalid_entry_display() {
        let err = ClientError::InvalidEntry {
            id: "01j".to_string(),
            reason: "missing target post",
        };
        assert_eq!(err.to_string(), "Invalid feed entry 01j: missing target post");
    }
}
