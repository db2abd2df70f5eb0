use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::formulas::{self, epley_one_rep_max_with, percentage_change, round2};
use crate::models::{DateRange, Exercise, ExerciseId, ExerciseSet, WorkoutId, WorkoutSession};

/// Best effort on one exercise in one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthProgressPoint {
    pub date: NaiveDate,
    pub workout_id: WorkoutId,

    /// Heaviest weight lifted in the session
    pub max_weight: Decimal,

    /// Reps of the heaviest set used for the 1RM estimate
    pub reps_at_max_weight: i32,

    /// Epley estimate from the heaviest set
    pub estimated_one_rep_max: Decimal,

    /// Σ weight × reps for the exercise in the session
    pub total_volume: Decimal,

    pub average_rpe: Decimal,
}

/// First-to-last changes across the series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthProgressSummary {
    pub starting_weight: Decimal,
    pub current_weight: Decimal,
    pub weight_gain: Decimal,
    pub weight_gain_percentage: Decimal,
    pub starting_one_rep_max: Decimal,
    pub current_one_rep_max: Decimal,
    pub one_rep_max_gain: Decimal,
    pub one_rep_max_gain_percentage: Decimal,
}

/// Strength trend of one exercise over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthProgress {
    pub exercise_id: ExerciseId,
    pub exercise_name: String,
    pub range: DateRange,
    pub points: Vec<StrengthProgressPoint>,
    pub summary: StrengthProgressSummary,
}

/// Builds per-session strength time series
#[derive(Debug, Clone)]
pub struct StrengthProgressAnalyzer {
    epley_coefficient: Decimal,
}

impl StrengthProgressAnalyzer {
    pub fn new() -> Self {
        StrengthProgressAnalyzer {
            epley_coefficient: formulas::EPLEY_COEFFICIENT,
        }
    }

    pub fn with_coefficient(epley_coefficient: Decimal) -> Self {
        StrengthProgressAnalyzer { epley_coefficient }
    }

    /// Analyze `sessions` for one exercise, keeping only sessions inside `range`
    pub fn analyze(
        &self,
        exercise: &Exercise,
        range: DateRange,
        sessions: &[WorkoutSession],
    ) -> StrengthProgress {
        let in_range: Vec<&WorkoutSession> =
            sessions.iter().filter(|s| range.contains(s.date)).collect();

        let points = self.progress_points(&in_range, exercise.id);
        let summary = Self::summarize(&points);

        StrengthProgress {
            exercise_id: exercise.id,
            exercise_name: exercise.name.clone(),
            range,
            points,
            summary,
        }
    }

    /// One point per session that logged the exercise, ascending by date
    pub fn progress_points(
        &self,
        sessions: &[&WorkoutSession],
        exercise_id: ExerciseId,
    ) -> Vec<StrengthProgressPoint> {
        let mut points: Vec<StrengthProgressPoint> = sessions
            .par_iter()
            .filter_map(|session| self.point_for_session(session, exercise_id))
            .collect();

        points.sort_by_key(|p| p.date);
        points
    }

    /// None when the session has no sets for the exercise
    pub fn point_for_session(
        &self,
        session: &WorkoutSession,
        exercise_id: ExerciseId,
    ) -> Option<StrengthProgressPoint> {
        let sets: Vec<&ExerciseSet> = session.sets_for(exercise_id).collect();

        // Heaviest set, ties broken by most reps
        let top_set = sets
            .iter()
            .max_by(|a, b| a.weight.cmp(&b.weight).then(a.reps.cmp(&b.reps)))?;

        Some(StrengthProgressPoint {
            date: session.date,
            workout_id: session.id,
            max_weight: top_set.weight,
            reps_at_max_weight: top_set.reps,
            estimated_one_rep_max: epley_one_rep_max_with(
                top_set.weight,
                top_set.reps,
                self.epley_coefficient,
            ),
            total_volume: sets.iter().map(|s| s.volume()).sum(),
            average_rpe: round2(formulas::mean(sets.iter().map(|s| s.rpe))),
        })
    }

    /// Compare the first and last points; all zero for an empty series
    pub fn summarize(points: &[StrengthProgressPoint]) -> StrengthProgressSummary {
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return StrengthProgressSummary::default(),
        };

        StrengthProgressSummary {
            starting_weight: first.max_weight,
            current_weight: last.max_weight,
            weight_gain: last.max_weight - first.max_weight,
            weight_gain_percentage: percentage_change(first.max_weight, last.max_weight),
            starting_one_rep_max: first.estimated_one_rep_max,
            current_one_rep_max: last.estimated_one_rep_max,
            one_rep_max_gain: last.estimated_one_rep_max - first.estimated_one_rep_max,
            one_rep_max_gain_percentage: percentage_change(
                first.estimated_one_rep_max,
                last.estimated_one_rep_max,
            ),
        }
    }
}

impl Default for StrengthProgressAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SetType, WorkoutExercise, WorkoutType};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn bench() -> Exercise {
        Exercise {
            id: Uuid::new_v4(),
            name: "Bench Press".to_string(),
            category: None,
        }
    }

    fn set(weight: Decimal, reps: i32, rpe: Decimal) -> ExerciseSet {
        ExerciseSet {
            set_type: SetType::Working,
            weight,
            reps,
            rpe,
            completed: true,
            order: 0,
        }
    }

    fn session(date: NaiveDate, exercise: &Exercise, sets: Vec<ExerciseSet>) -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            date,
            workout_type: WorkoutType::Push,
            completed: true,
            exercises: vec![WorkoutExercise {
                exercise: exercise.clone(),
                order: 0,
                sets,
            }],
            notes: None,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    #[test]
    fn test_point_uses_heaviest_set_with_most_reps() {
        let exercise = bench();
        let workout = session(
            date(1),
            &exercise,
            vec![
                set(dec!(100), 3, dec!(8)),
                set(dec!(100), 5, dec!(9)),
                set(dec!(80), 10, dec!(7)),
            ],
        );

        let point = StrengthProgressAnalyzer::new()
            .point_for_session(&workout, exercise.id)
            .unwrap();

        assert_eq!(point.max_weight, dec!(100));
        assert_eq!(point.reps_at_max_weight, 5);
        assert_eq!(point.estimated_one_rep_max, dec!(116.65));
        assert_eq!(point.total_volume, dec!(1600));
        assert_eq!(point.average_rpe, dec!(8));
    }

    #[test]
    fn test_series_sorted_and_summarized() {
        let exercise = bench();
        let sessions = vec![
            session(date(15), &exercise, vec![set(dec!(110), 1, dec!(9.5))]),
            session(date(1), &exercise, vec![set(dec!(100), 1, dec!(9))]),
        ];
        let range = DateRange::new(date(1), date(30)).unwrap();

        let progress = StrengthProgressAnalyzer::new().analyze(&exercise, range, &sessions);

        assert_eq!(progress.points.len(), 2);
        assert_eq!(progress.points[0].date, date(1));
        assert_eq!(progress.summary.starting_weight, dec!(100));
        assert_eq!(progress.summary.current_weight, dec!(110));
        assert_eq!(progress.summary.weight_gain, dec!(10));
        assert_eq!(progress.summary.weight_gain_percentage, dec!(10.00));
        assert_eq!(progress.summary.one_rep_max_gain, dec!(10));
    }

    #[test]
    fn test_empty_range_yields_zero_summary() {
        let exercise = bench();
        let sessions = vec![session(date(20), &exercise, vec![set(dec!(100), 5, dec!(8))])];
        let range = DateRange::new(date(1), date(10)).unwrap();

        let progress = StrengthProgressAnalyzer::new().analyze(&exercise, range, &sessions);

        assert!(progress.points.is_empty());
        assert_eq!(progress.summary, StrengthProgressSummary::default());
        assert_eq!(progress.summary.weight_gain_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_sessions_without_exercise_skipped() {
        let exercise = bench();
        let other = bench();
        let sessions = vec![session(date(2), &other, vec![set(dec!(60), 8, dec!(7))])];
        let range = DateRange::new(date(1), date(10)).unwrap();

        let progress = StrengthProgressAnalyzer::new().analyze(&exercise, range, &sessions);
        assert!(progress.points.is_empty());
    }

    #[test]
    fn test_zero_starting_weight_gives_zero_percentage() {
        let exercise = bench();
        let sessions = vec![
            session(date(1), &exercise, vec![set(dec!(0), 12, dec!(5))]),
            session(date(8), &exercise, vec![set(dec!(20), 10, dec!(6))]),
        ];
        let range = DateRange::new(date(1), date(10)).unwrap();

        let summary = StrengthProgressAnalyzer::new()
            .analyze(&exercise, range, &sessions)
            .summary;
        assert_eq!(summary.weight_gain, dec!(20));
        assert_eq!(summary.weight_gain_percentage, dec!(0));
    }
}
