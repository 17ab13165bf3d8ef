//! Validation error taxonomy
//!
//! Every way an inbound envelope can fail validation before it reaches the
//! reconciliation engine. Variants carry human-readable messages that are
//! surfaced verbatim in HTTP 400 responses.

use thiserror::Error;

/// Envelope validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing or empty channel")]
    EmptyChannel,

    #[error("message number must be at least 1")]
    InvalidMessageNumber,

    #[error("missing or invalid rocket type")]
    MissingRocketType,

    #[error("missing or invalid mission")]
    MissingMission,

    #[error("speed change must be at least 1")]
    InvalidSpeedDelta,

    #[error("missing or invalid explosion reason")]
    MissingReason,

    #[error("missing or invalid new mission")]
    MissingNewMission,

    #[error("malformed {kind} payload: {detail}")]
    MalformedPayload { kind: &'static str, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::EmptyChannel;
        assert_eq!(err.to_string(), "missing or empty channel");
    }

    #[test]
    fn test_malformed_payload_display() {
        let err = ValidationError::MalformedPayload {
            kind: "RocketLaunched",
            detail: "missing field `mission`".to_string(),
        };
        assert!(err.to_string().contains("RocketLaunched"));
        assert!(err.to_string().contains("missing field"));
    }
}
