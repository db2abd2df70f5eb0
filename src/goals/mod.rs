//! Fitness goals: model, progress rules and lifecycle management

pub mod lifecycle;
pub mod progress;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{LiftError, Result};
use crate::formulas::clamp_percentage;
use crate::models::{ExerciseId, UserId, WorkoutType};

pub use lifecycle::{GoalManager, SweepFailure, SweepReport};
pub use progress::ProgressContext;

pub type GoalId = Uuid;

/// Highest stored percentage for a goal that has not reached its target
const LAST_INCOMPLETE_PERCENTAGE: Decimal = dec!(99.99);

/// Goal type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalType {
    Strength,
    Volume,
    Frequency,
    Custom,
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalType::Strength => write!(f, "strength"),
            GoalType::Volume => write!(f, "volume"),
            GoalType::Frequency => write!(f, "frequency"),
            GoalType::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strength" => Ok(GoalType::Strength),
            "volume" => Ok(GoalType::Volume),
            "frequency" => Ok(GoalType::Frequency),
            "custom" => Ok(GoalType::Custom),
            _ => Err(format!("Invalid goal type: {}", s)),
        }
    }
}

/// Type-specific goal targets, fixed at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GoalTarget {
    /// Lift `target_weight` for `target_reps`; evaluated over the lifetime history
    Strength {
        exercise_id: ExerciseId,
        target_weight: Decimal,
        target_reps: i32,
    },

    /// Reach `target_volume` in a single session on or after the goal start
    Volume {
        exercise_id: ExerciseId,
        target_volume: Decimal,
    },

    /// Train `target_frequency` times in the current calendar month
    Frequency {
        target_frequency: i32,
        #[serde(default)]
        workout_type: Option<WorkoutType>,
    },

    /// Tracked manually; no progress rule
    Custom,
}

impl GoalTarget {
    pub fn goal_type(&self) -> GoalType {
        match self {
            GoalTarget::Strength { .. } => GoalType::Strength,
            GoalTarget::Volume { .. } => GoalType::Volume,
            GoalTarget::Frequency { .. } => GoalType::Frequency,
            GoalTarget::Custom => GoalType::Custom,
        }
    }

    /// Exercise the goal is scoped to, if any
    pub fn exercise_id(&self) -> Option<ExerciseId> {
        match self {
            GoalTarget::Strength { exercise_id, .. } | GoalTarget::Volume { exercise_id, .. } => {
                Some(*exercise_id)
            }
            GoalTarget::Frequency { .. } | GoalTarget::Custom => None,
        }
    }
}

/// A user's fitness goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target: GoalTarget,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,

    /// Percentage complete in [0, 100]
    pub completion_percentage: Decimal,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn goal_type(&self) -> GoalType {
        self.target.goal_type()
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// Whole days from `today` until the target date (negative once overdue)
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.target_date - today).num_days()
    }

    /// Record a freshly computed, unrounded progress value.
    ///
    /// Returns true when this call moved the goal into the completed state.
    pub fn apply_progress(&mut self, progress: Decimal, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        if progress >= dec!(100) {
            self.mark_completed(now);
            return true;
        }
        // 100 is reserved for completed goals
        self.completion_percentage = clamp_percentage(progress).min(LAST_INCOMPLETE_PERCENTAGE);
        false
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(now);
        self.completion_percentage = dec!(100);
    }
}

/// Goal creation request; type-specific fields are optional until validated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub goal_type: Option<GoalType>,
    pub exercise_id: Option<ExerciseId>,
    pub target_weight: Option<Decimal>,
    pub target_reps: Option<i32>,
    pub target_volume: Option<Decimal>,
    pub target_frequency: Option<i32>,
    pub target_workout_type: Option<WorkoutType>,

    /// Defaults to the creation date
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
}

impl NewGoal {
    /// Build the typed target, failing on missing required fields
    pub fn target(&self) -> Result<GoalTarget> {
        let goal_type = self
            .goal_type
            .ok_or_else(|| LiftError::Validation("Goal type is required".to_string()))?;

        match goal_type {
            GoalType::Strength => Ok(GoalTarget::Strength {
                exercise_id: required(self.exercise_id, goal_type, "exercise")?,
                target_weight: required(self.target_weight, goal_type, "target weight")?,
                target_reps: required(self.target_reps, goal_type, "target reps")?,
            }),
            GoalType::Volume => Ok(GoalTarget::Volume {
                exercise_id: required(self.exercise_id, goal_type, "exercise")?,
                target_volume: required(self.target_volume, goal_type, "target volume")?,
            }),
            GoalType::Frequency => Ok(GoalTarget::Frequency {
                target_frequency: required(self.target_frequency, goal_type, "target frequency")?,
                workout_type: self.target_workout_type.clone(),
            }),
            GoalType::Custom => Ok(GoalTarget::Custom),
        }
    }
}

fn required<T>(value: Option<T>, goal_type: GoalType, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        LiftError::Validation(format!("{} goals require a {}", goal_type, field))
    })
}

/// Editable goal fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
}

/// Goal lifecycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSettings {
    /// Furthest allowed target date, in months from creation
    pub max_horizon_months: u32,

    /// Deadline reminders start this many days before the target date
    pub deadline_window_days: i64,

    /// Minimum spacing between deadline reminders for the same goal
    pub notification_suppression_hours: i64,
}

impl Default for GoalSettings {
    fn default() -> Self {
        GoalSettings {
            max_horizon_months: 18,
            deadline_window_days: 7,
            notification_suppression_hours: 72,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strength_request() -> NewGoal {
        NewGoal {
            title: "Bench 100".to_string(),
            goal_type: Some(GoalType::Strength),
            exercise_id: Some(Uuid::new_v4()),
            target_weight: Some(dec!(100)),
            target_reps: Some(5),
            ..NewGoal::default()
        }
    }

    #[test]
    fn test_strength_target_requires_all_fields() {
        assert!(strength_request().target().is_ok());

        let mut missing_reps = strength_request();
        missing_reps.target_reps = None;
        let err = missing_reps.target().unwrap_err();
        assert!(matches!(err, LiftError::Validation(_)));
        assert!(err.to_string().contains("target reps"));
    }

    #[test]
    fn test_volume_and_frequency_targets() {
        let volume = NewGoal {
            goal_type: Some(GoalType::Volume),
            exercise_id: Some(Uuid::new_v4()),
            ..NewGoal::default()
        };
        assert!(matches!(volume.target(), Err(LiftError::Validation(_))));

        let frequency = NewGoal {
            goal_type: Some(GoalType::Frequency),
            target_frequency: Some(12),
            target_workout_type: Some(WorkoutType::Push),
            ..NewGoal::default()
        };
        let target = frequency.target().unwrap();
        assert_eq!(target.goal_type(), GoalType::Frequency);
        assert_eq!(target.exercise_id(), None);
    }

    #[test]
    fn test_apply_progress_completes_only_at_target() {
        let now = Utc::now();
        let mut goal = Goal {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            title: "Squat volume".to_string(),
            description: None,
            target: GoalTarget::Volume {
                exercise_id: Uuid::new_v4(),
                target_volume: dec!(100000),
            },
            start_date: now.date_naive(),
            target_date: now.date_naive(),
            completion_percentage: Decimal::ZERO,
            completed: false,
            completed_at: None,
            created_at: now,
        };

        assert!(!goal.apply_progress(dec!(99.996), now));
        assert!(!goal.completed);
        assert_eq!(goal.completion_percentage, dec!(99.99));

        assert!(!goal.apply_progress(dec!(42.125), now));
        assert_eq!(goal.completion_percentage, dec!(42.12));

        assert!(goal.apply_progress(dec!(100), now));
        assert!(goal.completed);
        assert_eq!(goal.completion_percentage, dec!(100));
    }

    #[test]
    fn test_goal_type_parsing() {
        assert_eq!("Strength".parse::<GoalType>().unwrap(), GoalType::Strength);
        assert!("distance".parse::<GoalType>().is_err());
    }
}
