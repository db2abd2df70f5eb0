// Library interface for liftrs modules
// This allows integration tests and benches to access the core functionality

pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;
pub mod formulas;
pub mod goals;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod provider;
pub mod store;

// Re-export commonly used types for convenience
pub use models::*;
pub use analytics::{
    AnalyticsService, AnalyticsSettings, ComparisonAnalyzer, FrequencyAnalyzer,
    StrengthProgressAnalyzer, VolumeAnalyzer, VolumeSetFilter,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use goals::{Goal, GoalId, GoalManager, GoalSettings, GoalTarget, GoalType, NewGoal, SweepReport};
pub use notifications::{Notification, NotificationKind, NotificationRequest};
pub use provider::{GoalStore, NotificationDispatcher, WorkoutDataProvider};
pub use store::{Dataset, InMemoryGoalStore, InMemoryNotificationCenter, InMemoryWorkoutStore};
pub use error::{LiftError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
