//! Collaborator boundaries: workout data, goal persistence and notifications
//!
//! Implementations live outside the engine; `crate::store` ships in-memory
//! versions used by the CLI and tests.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::goals::{Goal, GoalId};
use crate::models::{DateRange, Exercise, ExerciseId, WorkoutId, WorkoutSession};
use crate::notifications::{Notification, NotificationKind, NotificationRequest};

/// Source of hydrated workout history
pub trait WorkoutDataProvider: Send + Sync {
    /// All sessions of a user, optionally bounded by an inclusive date range
    fn fetch_user_workouts(
        &self,
        user_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<WorkoutSession>>;

    /// A single session with its exercises and sets
    fn fetch_workout_detail(&self, workout_id: WorkoutId) -> Result<Option<WorkoutSession>>;

    fn fetch_exercise(&self, exercise_id: ExerciseId) -> Result<Option<Exercise>>;
}

/// Best-effort notification delivery
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch_notification(&self, request: NotificationRequest) -> Result<()>;

    /// Notifications of `kind` about `related_goal_id` created at or after `since`
    fn fetch_recent_notifications(
        &self,
        user_id: &str,
        kind: NotificationKind,
        related_goal_id: GoalId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>>;
}

/// Goal persistence
pub trait GoalStore: Send + Sync {
    fn get_goal(&self, goal_id: GoalId) -> Result<Option<Goal>>;

    fn insert_goal(&self, goal: Goal) -> Result<()>;

    fn update_goal(&self, goal: &Goal) -> Result<()>;

    fn goals_for_user(&self, user_id: &str) -> Result<Vec<Goal>>;

    /// Every non-completed goal across all users
    fn active_goals(&self) -> Result<Vec<Goal>>;
}
