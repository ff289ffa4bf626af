//! # Error Types — Structured Error Taxonomy
//!
//! Defines the error types used throughout the Depot stack. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every business-rule rejection is a distinct [`MovementError`] variant;
//!   callers branch on variants, never on message text.
//! - Precondition failures carry the observed status and the allowed set so
//!   a terminal can tell the operator exactly why a scan bounced.
//! - [`MovementError::Infrastructure`] is reserved for persistence-layer
//!   failure and is never produced by a business rule.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the stack.
pub type MovementResult<T> = Result<T, MovementError>;

/// Top-level error type for booking and movement operations.
#[derive(Error, Debug)]
pub enum MovementError {
    /// The referenced row does not exist.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Row kind: `"asset"` or `"booking"`.
        kind: &'static str,
        /// The key that missed.
        key: String,
    },

    /// The asset exists but its current status does not permit the scan.
    #[error("asset {asset_code} is in status {actual}, expected one of {allowed:?}")]
    InvalidPrecondition {
        /// The asset that was scanned.
        asset_code: String,
        /// Status observed under the row lock.
        actual: String,
        /// Statuses the movement type accepts before a scan.
        allowed: Vec<String>,
    },

    /// The asset is already attached to this same booking.
    ///
    /// Distinct from [`MovementError::InvalidPrecondition`] so a terminal
    /// can render "already in this booking" instead of "blocked".
    #[error("asset {asset_code} is already attached to booking {draft_id}")]
    AlreadyAttached {
        /// The asset that was scanned a second time.
        asset_code: String,
        /// The booking it is already attached to.
        draft_id: String,
    },

    /// The booking's declared origin does not match where the asset last
    /// ended up.
    #[error(
        "asset {asset_code} was last recorded at {last_destination}, \
         booking declares origin {declared_origin}"
    )]
    RoutingMismatch {
        /// The asset that was scanned.
        asset_code: String,
        /// Origin declared on the booking header.
        declared_origin: String,
        /// Destination of the asset's last recorded movement.
        last_destination: String,
    },

    /// A lifecycle call arrived while the booking is in the wrong status.
    #[error("cannot {attempted} a booking in status {from}")]
    IllegalTransition {
        /// Current booking status.
        from: String,
        /// The operation that was attempted.
        attempted: String,
    },

    /// Lost a concurrency race or exhausted a bounded resource. The caller
    /// decides whether to retry; the engine never retries internally.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed identifier or timestamp input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistence-layer failure. Never produced by a business rule.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

/// Error constructing a validated identifier or timestamp.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Asset code outside the barcode alphabet or length bounds.
    #[error("invalid asset code: {0:?}")]
    InvalidAssetCode(String),

    /// Draft id empty, overlong, or containing whitespace.
    #[error("invalid draft id: {0:?}")]
    InvalidDraftId(String),

    /// Site id outside the code alphabet or length bounds.
    #[error("invalid site id: {0:?}")]
    InvalidSiteId(String),

    /// Actor id empty, overlong, or containing control characters.
    #[error("invalid actor id: {0:?}")]
    InvalidActorId(String),

    /// Reference code not matching `<prefix><YYMMDD><NNNN>`.
    #[error("invalid reference code: {0:?}")]
    InvalidRefCode(String),

    /// Timestamp not RFC 3339, or not UTC where UTC is required.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_kind_and_key() {
        let err = MovementError::NotFound {
            kind: "asset",
            key: "A100".to_string(),
        };
        assert_eq!(err.to_string(), "asset not found: A100");
    }

    #[test]
    fn precondition_display_lists_allowed() {
        let err = MovementError::InvalidPrecondition {
            asset_code: "A100".to_string(),
            actual: "ISSUED".to_string(),
            allowed: vec!["AVAILABLE".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("ISSUED"));
        assert!(msg.contains("AVAILABLE"));
    }

    #[test]
    fn illegal_transition_display_names_operation() {
        let err = MovementError::IllegalTransition {
            from: "FINALIZED".to_string(),
            attempted: "cancel".to_string(),
        };
        assert_eq!(err.to_string(), "cannot cancel a booking in status FINALIZED");
    }

    #[test]
    fn validation_error_is_transparent() {
        let err: MovementError = ValidationError::InvalidAssetCode("A 1".to_string()).into();
        assert_eq!(err.to_string(), "invalid asset code: \"A 1\"");
    }
}
