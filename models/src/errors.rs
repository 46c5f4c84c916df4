// models/src/errors.rs

pub use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy for the referral routing core.
///
/// `NotFound` and `InvalidState` are caller-visible outcomes (the HTTP layer
/// maps them to 404/409); the remaining variants are infrastructure failures
/// that propagate as-is.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("{entity} with id {id} was not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("invalid state for {operation}: expected {expected}, found {found}")]
    InvalidState {
        operation: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Storage error: {0}")]
    StorageError(String), // General storage operation error

    #[error("Configuration error: {0}")]
    ConfigError(String), // Error with configuration loading or validation

    #[error("Failed to acquire lock: {0}")]
    LockError(String),

    #[error("An internal error occurred: {0}")]
    InternalError(String),
}

impl RoutingError {
    /// Shorthand for the common not-found cases.
    pub fn facility_not_found(id: Uuid) -> Self {
        RoutingError::NotFound { entity: "Facility", id }
    }

    pub fn referral_not_found(id: Uuid) -> Self {
        RoutingError::NotFound { entity: "Referral", id }
    }

    pub fn reservation_not_found(id: Uuid) -> Self {
        RoutingError::NotFound { entity: "Reservation", id }
    }
}

// Serialization failures only occur on the storage adapter edge; fold them
// into the storage variant rather than growing the taxonomy.
impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::StorageError(format!("JSON processing error: {}", err))
    }
}

pub type RoutingResult<T> = Result<T, RoutingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_the_entity() {
        let id = Uuid::new_v4();
        let err = RoutingError::referral_not_found(id);
        let msg = err.to_string();
        assert!(msg.contains("Referral"));
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn invalid_state_display_carries_both_states() {
        let err = RoutingError::InvalidState {
            operation: "accept_referral",
            expected: "Pending",
            found: "Accepted".to_string(),
        };
        assert!(err.to_string().contains("expected Pending"));
        assert!(err.to_string().contains("found Accepted"));
    }
}
