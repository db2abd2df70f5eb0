use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{LiftError, Result};

pub type UserId = String;
pub type WorkoutId = Uuid;
pub type ExerciseId = Uuid;

/// Workout types used to categorize training sessions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkoutType {
    FullBody,
    UpperBody,
    LowerBody,
    Push,
    Pull,
    Legs,
    Strength,
    Hypertrophy,
    Power,
    Endurance,
    Cardio,
    /// Free-form tag for user-defined splits
    Custom(String),
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutType::FullBody => write!(f, "Full Body"),
            WorkoutType::UpperBody => write!(f, "Upper Body"),
            WorkoutType::LowerBody => write!(f, "Lower Body"),
            WorkoutType::Push => write!(f, "Push"),
            WorkoutType::Pull => write!(f, "Pull"),
            WorkoutType::Legs => write!(f, "Legs"),
            WorkoutType::Strength => write!(f, "Strength"),
            WorkoutType::Hypertrophy => write!(f, "Hypertrophy"),
            WorkoutType::Power => write!(f, "Power"),
            WorkoutType::Endurance => write!(f, "Endurance"),
            WorkoutType::Cardio => write!(f, "Cardio"),
            WorkoutType::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl std::str::FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "" => Err("Workout type cannot be empty".to_string()),
            "fullbody" => Ok(WorkoutType::FullBody),
            "upperbody" | "upper" => Ok(WorkoutType::UpperBody),
            "lowerbody" | "lower" => Ok(WorkoutType::LowerBody),
            "push" => Ok(WorkoutType::Push),
            "pull" => Ok(WorkoutType::Pull),
            "legs" => Ok(WorkoutType::Legs),
            "strength" => Ok(WorkoutType::Strength),
            "hypertrophy" => Ok(WorkoutType::Hypertrophy),
            "power" => Ok(WorkoutType::Power),
            "endurance" => Ok(WorkoutType::Endurance),
            "cardio" => Ok(WorkoutType::Cardio),
            _ => Ok(WorkoutType::Custom(s.trim().to_string())),
        }
    }
}

/// How a set was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SetType {
    Warmup,
    #[default]
    Working,
    DropSet,
    Failure,
    Amrap,
}

/// Exercise catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,

    /// Display name, not guaranteed unique
    pub name: String,

    /// Optional muscle group or equipment category
    #[serde(default)]
    pub category: Option<String>,
}

/// A single logged set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    #[serde(default)]
    pub set_type: SetType,

    /// Load in the user's unit (kg or lb)
    pub weight: Decimal,

    pub reps: i32,

    /// Rate of perceived exertion (0-10)
    #[serde(default)]
    pub rpe: Decimal,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub order: u32,
}

impl ExerciseSet {
    /// Volume lifted in this set (weight × reps)
    pub fn volume(&self) -> Decimal {
        crate::formulas::set_volume(self.weight, self.reps)
    }
}

/// An exercise performed within a session, with its sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub exercise: Exercise,

    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

impl WorkoutExercise {
    /// Total volume across every set, completed or not
    pub fn total_volume(&self) -> Decimal {
        self.sets.iter().map(ExerciseSet::volume).sum()
    }

    /// Volume over completed sets only
    pub fn completed_volume(&self) -> Decimal {
        self.sets
            .iter()
            .filter(|set| set.completed)
            .map(ExerciseSet::volume)
            .sum()
    }
}

/// A fully hydrated workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: WorkoutId,

    pub user_id: UserId,

    pub date: NaiveDate,

    pub workout_type: WorkoutType,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl WorkoutSession {
    /// All sets recorded for the given exercise, across repeated entries
    pub fn sets_for(&self, exercise_id: ExerciseId) -> impl Iterator<Item = &ExerciseSet> {
        self.exercises
            .iter()
            .filter(move |we| we.exercise.id == exercise_id)
            .flat_map(|we| we.sets.iter())
    }

    /// True if at least one set of the exercise was logged
    pub fn contains_exercise(&self, exercise_id: ExerciseId) -> bool {
        self.sets_for(exercise_id).next().is_some()
    }

    /// Every set of every exercise in the session
    pub fn all_sets(&self) -> impl Iterator<Item = &ExerciseSet> {
        self.exercises.iter().flat_map(|we| we.sets.iter())
    }

    pub fn total_volume(&self) -> Decimal {
        self.exercises.iter().map(WorkoutExercise::total_volume).sum()
    }

    /// (year, month) bucket of the session date
    pub fn year_month(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting start > end
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LiftError::Validation(format!(
                "Start date {} must not be after end date {}",
                start, end
            )));
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn set(weight: Decimal, reps: i32, completed: bool) -> ExerciseSet {
        ExerciseSet {
            set_type: SetType::Working,
            weight,
            reps,
            rpe: dec!(8),
            completed,
            order: 0,
        }
    }

    #[test]
    fn test_workout_exercise_volumes() {
        let we = WorkoutExercise {
            exercise: Exercise {
                id: Uuid::new_v4(),
                name: "Squat".to_string(),
                category: None,
            },
            order: 0,
            sets: vec![set(dec!(100), 5, true), set(dec!(110), 3, false)],
        };

        assert_eq!(we.total_volume(), dec!(830));
        assert_eq!(we.completed_volume(), dec!(500));
    }

    #[test]
    fn test_workout_type_parsing() {
        assert_eq!("full-body".parse::<WorkoutType>().unwrap(), WorkoutType::FullBody);
        assert_eq!("Push".parse::<WorkoutType>().unwrap(), WorkoutType::Push);
        assert_eq!(
            "Arms Day".parse::<WorkoutType>().unwrap(),
            WorkoutType::Custom("Arms Day".to_string())
        );
        assert!("  ".parse::<WorkoutType>().is_err());
    }

    #[test]
    fn test_date_range_validation() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert!(matches!(
            DateRange::new(start, end),
            Err(LiftError::Validation(_))
        ));

        let range = DateRange::new(end, start).unwrap();
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()));
    }
}
