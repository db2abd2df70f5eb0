use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{LiftError, Result};
use crate::formulas::{mean, percentage_change, round2};
use crate::models::{ExerciseId, ExerciseSet, WorkoutId, WorkoutSession, WorkoutType};

/// Aggregate figures of one workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutStats {
    pub workout_id: WorkoutId,
    pub date: NaiveDate,
    pub workout_type: WorkoutType,
    pub total_volume: Decimal,
    pub total_sets: u32,
    pub average_rpe: Decimal,
}

impl WorkoutStats {
    pub fn from_session(session: &WorkoutSession) -> Self {
        let sets: Vec<&ExerciseSet> = session.all_sets().collect();

        WorkoutStats {
            workout_id: session.id,
            date: session.date,
            workout_type: session.workout_type.clone(),
            total_volume: sets.iter().map(|s| s.volume()).sum(),
            total_sets: sets.len() as u32,
            average_rpe: round2(average_rpe(session)),
        }
    }
}

/// Unrounded mean RPE over every set of the session
fn average_rpe(session: &WorkoutSession) -> Decimal {
    mean(session.all_sets().map(|s| s.rpe))
}

/// One exercise's volume in both workouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseComparison {
    pub exercise_id: ExerciseId,

    /// Display only; matching is by id
    pub exercise_name: String,
    pub first_volume: Decimal,
    pub second_volume: Decimal,
    pub first_sets: u32,
    pub second_sets: u32,
    pub volume_change: Decimal,
    pub volume_change_percentage: Decimal,
}

/// Differences between two workouts of the same type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutComparison {
    pub first: WorkoutStats,
    pub second: WorkoutStats,
    pub volume_change: Decimal,
    pub volume_change_percentage: Decimal,
    pub intensity_change: Decimal,
    pub intensity_change_percentage: Decimal,
    pub exercises: Vec<ExerciseComparison>,
}

#[derive(Debug, Clone)]
struct ExerciseTally {
    exercise_id: ExerciseId,
    name: String,
    volume: Decimal,
    sets: u32,
}

/// Compares two already-resolved sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonAnalyzer;

impl ComparisonAnalyzer {
    pub fn new() -> Self {
        ComparisonAnalyzer
    }

    /// `first` is the baseline; fails if the workout types differ
    pub fn compare(&self, first: &WorkoutSession, second: &WorkoutSession) -> Result<WorkoutComparison> {
        if first.workout_type != second.workout_type {
            return Err(LiftError::Validation(format!(
                "Cannot compare a {} workout with a {} workout",
                first.workout_type, second.workout_type
            )));
        }

        let first_stats = WorkoutStats::from_session(first);
        let second_stats = WorkoutStats::from_session(second);
        let (first_rpe, second_rpe) = (average_rpe(first), average_rpe(second));

        Ok(WorkoutComparison {
            volume_change: second_stats.total_volume - first_stats.total_volume,
            volume_change_percentage: percentage_change(
                first_stats.total_volume,
                second_stats.total_volume,
            ),
            intensity_change: round2(second_rpe - first_rpe),
            intensity_change_percentage: percentage_change(first_rpe, second_rpe),
            exercises: Self::compare_exercises(first, second),
            first: first_stats,
            second: second_stats,
        })
    }

    /// Union of exercises in either workout: first workout's order, then new ones
    pub fn compare_exercises(first: &WorkoutSession, second: &WorkoutSession) -> Vec<ExerciseComparison> {
        let first_tally = tally(first);
        let second_tally = tally(second);

        let mut ids: Vec<(ExerciseId, &str)> = first_tally
            .iter()
            .map(|t| (t.exercise_id, t.name.as_str()))
            .collect();
        for t in &second_tally {
            if !ids.iter().any(|(id, _)| *id == t.exercise_id) {
                ids.push((t.exercise_id, t.name.as_str()));
            }
        }

        let lookup = |tallies: &[ExerciseTally], id: ExerciseId| {
            tallies
                .iter()
                .find(|t| t.exercise_id == id)
                .map_or((Decimal::ZERO, 0), |t| (t.volume, t.sets))
        };

        ids.into_iter()
            .map(|(exercise_id, name)| {
                let (first_volume, first_sets) = lookup(&first_tally, exercise_id);
                let (second_volume, second_sets) = lookup(&second_tally, exercise_id);

                ExerciseComparison {
                    exercise_id,
                    exercise_name: name.to_string(),
                    first_volume,
                    second_volume,
                    first_sets,
                    second_sets,
                    volume_change: second_volume - first_volume,
                    volume_change_percentage: exercise_volume_change(first_volume, second_volume),
                }
            })
            .collect()
    }
}

/// Volume appearing from a zero baseline counts as a 100% increase
pub fn exercise_volume_change(first: Decimal, second: Decimal) -> Decimal {
    if first <= Decimal::ZERO {
        return if second > Decimal::ZERO { dec!(100) } else { Decimal::ZERO };
    }
    percentage_change(first, second)
}

/// Per-exercise volume and set count, in session order
fn tally(session: &WorkoutSession) -> Vec<ExerciseTally> {
    let mut tallies: Vec<ExerciseTally> = Vec::new();

    for we in &session.exercises {
        let volume = we.total_volume();
        let sets = we.sets.len() as u32;

        match tallies.iter_mut().find(|t| t.exercise_id == we.exercise.id) {
            Some(existing) => {
                existing.volume += volume;
                existing.sets += sets;
            }
            None => tallies.push(ExerciseTally {
                exercise_id: we.exercise.id,
                name: we.exercise.name.clone(),
                volume,
                sets,
            }),
        }
    }
    tallies
}
