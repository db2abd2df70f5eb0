//! Unified error hierarchy for liftrs
//!
//! Distinguishes caller-facing conditions (not found, validation, ownership)
//! from collaborator failures, and integrates with the tracing system.

use std::fmt;
use thiserror::Error;

/// Kind of entity a lookup failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Exercise,
    Workout,
    Goal,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Exercise => write!(f, "exercise"),
            EntityKind::Workout => write!(f, "workout"),
            EntityKind::Goal => write!(f, "goal"),
        }
    }
}

/// Top-level error type for all liftrs operations
#[derive(Debug, Error)]
pub enum LiftError {
    /// An exercise, workout or goal id could not be resolved
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// Invalid input: missing goal fields, bad date window, mismatched workouts
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requesting user does not own the workout or goal
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Workout data or goal store failure
    #[error("Data provider error: {0}")]
    Provider(String),

    /// Notification dispatch failure
    #[error("Notification error: {0}")]
    Notification(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for liftrs operations
pub type Result<T> = std::result::Result<T, LiftError>;

impl LiftError {
    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        LiftError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LiftError::Provider(_) | LiftError::Notification(_) | LiftError::Io(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LiftError::NotFound { .. } => ErrorSeverity::Warning,
            LiftError::Validation(_) => ErrorSeverity::Warning,
            LiftError::Unauthorized(_) => ErrorSeverity::Error,
            LiftError::Notification(_) => ErrorSeverity::Warning,
            LiftError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            LiftError::NotFound { entity, .. } => {
                format!("The requested {} could not be found.", entity)
            }
            LiftError::Unauthorized(_) => {
                "You do not have access to this resource.".to_string()
            }
            LiftError::Provider(_) => {
                "Workout data is temporarily unavailable. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = LiftError::not_found(EntityKind::Workout, "abc");
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = LiftError::Configuration("bad".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_error_retryable() {
        assert!(LiftError::Provider("timeout".to_string()).is_retryable());
        assert!(!LiftError::Validation("test".to_string()).is_retryable());
        assert!(!LiftError::Unauthorized("test".to_string()).is_retryable());
    }

    #[test]
    fn test_not_found_display() {
        let err = LiftError::not_found(EntityKind::Goal, 42);
        assert_eq!(err.to_string(), "goal not found: 42");
        assert!(err.user_message().contains("goal"));
    }
}
