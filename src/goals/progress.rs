//! Per-type goal progress rules

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::GoalTarget;
use crate::formulas::{capped_progress, clamp_progress};
use crate::models::{ExerciseId, ExerciseSet, WorkoutSession, WorkoutType};

const WEIGHT_SHARE: Decimal = dec!(0.7);
const REPS_SHARE: Decimal = dec!(0.3);
const COMPLETE: Decimal = dec!(100);

/// Evaluation inputs that do not come from workout history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressContext {
    /// Goal start date; bounds volume goals
    pub start_date: NaiveDate,

    /// Evaluation date; selects the month for frequency goals
    pub today: NaiveDate,
}

impl GoalTarget {
    /// Unrounded percentage complete in [0, 100], or None for goals without a rule
    pub fn compute_progress(
        &self,
        history: &[WorkoutSession],
        context: &ProgressContext,
    ) -> Option<Decimal> {
        match self {
            GoalTarget::Strength {
                exercise_id,
                target_weight,
                target_reps,
            } => Some(strength_progress(
                history,
                *exercise_id,
                *target_weight,
                *target_reps,
            )),
            GoalTarget::Volume {
                exercise_id,
                target_volume,
            } => Some(volume_progress(
                history,
                *exercise_id,
                *target_volume,
                context.start_date,
            )),
            GoalTarget::Frequency {
                target_frequency,
                workout_type,
            } => Some(frequency_progress(
                history,
                *target_frequency,
                workout_type.as_ref(),
                context.today,
            )),
            GoalTarget::Custom => None,
        }
    }
}

/// Strength goals count every completed set ever logged for the exercise,
/// regardless of the goal start date.
pub fn strength_progress(
    history: &[WorkoutSession],
    exercise_id: ExerciseId,
    target_weight: Decimal,
    target_reps: i32,
) -> Decimal {
    let completed_sets: Vec<&ExerciseSet> = history
        .iter()
        .flat_map(|session| session.sets_for(exercise_id))
        .filter(|set| set.completed)
        .collect();

    if completed_sets
        .iter()
        .any(|set| set.weight >= target_weight && set.reps >= target_reps)
    {
        return COMPLETE;
    }

    let max_weight = completed_sets
        .iter()
        .map(|set| set.weight)
        .max()
        .unwrap_or(Decimal::ZERO);

    let max_reps_at_target = completed_sets
        .iter()
        .filter(|set| set.weight >= target_weight)
        .map(|set| set.reps.max(0))
        .max()
        .unwrap_or(0);

    let weight_progress = capped_progress(max_weight, target_weight);
    let reps_progress = capped_progress(
        Decimal::from(max_reps_at_target),
        Decimal::from(target_reps),
    );

    clamp_progress(WEIGHT_SHARE * weight_progress + REPS_SHARE * reps_progress)
}

/// Best single-session volume on completed sets since the goal started
pub fn volume_progress(
    history: &[WorkoutSession],
    exercise_id: ExerciseId,
    target_volume: Decimal,
    start_date: NaiveDate,
) -> Decimal {
    let best_session_volume = history
        .iter()
        .filter(|session| session.date >= start_date)
        .map(|session| {
            session
                .sets_for(exercise_id)
                .filter(|set| set.completed)
                .map(ExerciseSet::volume)
                .sum::<Decimal>()
        })
        .max()
        .unwrap_or(Decimal::ZERO);

    clamp_progress(capped_progress(best_session_volume, target_volume))
}

/// Sessions in the calendar month of `today`, optionally of one workout type
pub fn frequency_progress(
    history: &[WorkoutSession],
    target_frequency: i32,
    workout_type: Option<&WorkoutType>,
    today: NaiveDate,
) -> Decimal {
    let current_month = (today.year(), today.month());

    let count = history
        .iter()
        .filter(|session| session.year_month() == current_month)
        .filter(|session| workout_type.map_or(true, |wt| &session.workout_type == wt))
        .count();

    clamp_progress(capped_progress(
        Decimal::from(count),
        Decimal::from(target_frequency),
    ))
}
