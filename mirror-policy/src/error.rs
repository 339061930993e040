//! Error types for mirror-policy

use thiserror::Error;

/// Result type alias using our PolicyError
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Policy enforcement errors
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Error from mirror-core
    #[error("Core error: {0}")]
    Core(#[from] mirror_core::Error),

    /// Policy is structurally invalid (enforcer build rejected it)
    #[error("Invalid policy '{policy_id}': {message}")]
    InvalidPolicy {
        /// Id of the rejected policy
        policy_id: String,
        /// What was wrong with it
        message: String,
    },
}

impl PolicyError {
    /// Create an invalid policy error
    pub fn invalid_policy(policy_id: impl Into<String>, message: impl Into<String>) -> Self {
        PolicyError::InvalidPolicy {
            policy_id: policy_id.into(),
            message: message.into(),
        }
    }
}
