//! Handler error types

use parley_core::ServerEvent;
use parley_service::ServiceError;
use thiserror::Error;

/// Code sent for frames that do not decode into a client event
pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame is not a well-formed client event
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Service rejected or failed the operation
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl HandlerError {
    /// Whether the failure is ours rather than the client's
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Service(e) if e.is_internal())
    }

    /// The `error` event reported to the initiating connection
    pub fn to_event(&self) -> ServerEvent {
        match self {
            Self::InvalidPayload(reason) => ServerEvent::error(INVALID_PAYLOAD, reason.clone()),
            Self::Service(e) => ServerEvent::Error {
                code: e.error_code().to_string(),
                message: e.client_message(),
                retry_after: e.retry_after(),
            },
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::DomainError;

    #[test]
    fn test_invalid_payload_event() {
        let err = HandlerError::from(serde_json::from_str::<u8>("x").unwrap_err());
        match err.to_event() {
            ServerEvent::Error { code, retry_after, .. } => {
                assert_eq!(code, INVALID_PAYLOAD);
                assert!(retry_after.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!err.is_internal());
    }

    #[test]
    fn test_rate_limited_carries_retry() {
        let err = HandlerError::from(ServiceError::from(DomainError::RateLimited { retry_after_secs: 3 }));
        match err.to_event() {
            ServerEvent::Error { code, retry_after, .. } => {
                assert_eq!(code, "RATE_LIMITED");
                assert_eq!(retry_after, Some(3));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_internal_is_masked() {
        let err = HandlerError::from(ServiceError::Internal("connection reset by peer".into()));
        assert!(err.is_internal());
        match err.to_event() {
            ServerEvent::Error { message, .. } => assert_eq!(message, "Something went wrong"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
