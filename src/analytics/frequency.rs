use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::formulas::{mean, percentage_of, round2};
use crate::models::{DateRange, WorkoutSession, WorkoutType};

/// Share of sessions of one workout type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTypeFrequency {
    pub workout_type: WorkoutType,
    pub count: u32,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCount {
    pub workout_type: WorkoutType,
    pub count: u32,
}

/// Sessions in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFrequency {
    pub year: i32,
    pub month: u32,
    pub workout_count: u32,
    pub by_type: Vec<TypeCount>,
}

/// Training frequency patterns over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAnalysis {
    pub range: DateRange,
    pub total_workouts: u32,

    /// Most frequent type first
    pub by_type: Vec<WorkoutTypeFrequency>,

    /// Chronological
    pub by_month: Vec<MonthlyFrequency>,

    pub average_days_between_workouts: Decimal,
    pub workouts_per_month: Decimal,
}

/// Counts sessions regardless of their completed flag
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyAnalyzer;

impl FrequencyAnalyzer {
    pub fn new() -> Self {
        FrequencyAnalyzer
    }

    pub fn analyze(&self, sessions: &[WorkoutSession], range: DateRange) -> FrequencyAnalysis {
        let in_range: Vec<&WorkoutSession> =
            sessions.iter().filter(|s| range.contains(s.date)).collect();
        let total_workouts = in_range.len() as u32;

        let by_type: Vec<WorkoutTypeFrequency> = sorted_counts(count_by_type(in_range.iter().copied()))
            .into_iter()
            .map(|tc| WorkoutTypeFrequency {
                percentage: percentage_of(Decimal::from(tc.count), Decimal::from(total_workouts)),
                workout_type: tc.workout_type,
                count: tc.count,
            })
            .collect();

        let mut months: BTreeMap<(i32, u32), Vec<&WorkoutSession>> = BTreeMap::new();
        for &session in &in_range {
            months.entry(session.year_month()).or_default().push(session);
        }

        let month_buckets = months.len();
        let by_month: Vec<MonthlyFrequency> = months
            .into_iter()
            .map(|((year, month), sessions)| MonthlyFrequency {
                year,
                month,
                workout_count: sessions.len() as u32,
                by_type: sorted_counts(count_by_type(sessions.into_iter())),
            })
            .collect();

        let workouts_per_month = if month_buckets == 0 {
            Decimal::ZERO
        } else {
            round2(Decimal::from(total_workouts) / Decimal::from(month_buckets))
        };

        FrequencyAnalysis {
            range,
            total_workouts,
            by_type,
            by_month,
            average_days_between_workouts: Self::average_days_between(&in_range),
            workouts_per_month,
        }
    }

    /// Mean gap in days between consecutive sessions; 0 with fewer than two
    pub fn average_days_between(sessions: &[&WorkoutSession]) -> Decimal {
        let mut dates: Vec<_> = sessions.iter().map(|s| s.date).collect();
        if dates.len() < 2 {
            return Decimal::ZERO;
        }
        dates.sort();

        round2(mean(
            dates
                .windows(2)
                .map(|pair| Decimal::from((pair[1] - pair[0]).num_days())),
        ))
    }
}

fn count_by_type<'a, I>(sessions: I) -> BTreeMap<WorkoutType, u32>
where
    I: Iterator<Item = &'a WorkoutSession>,
{
    sessions.fold(BTreeMap::new(), |mut acc, session| {
        *acc.entry(session.workout_type.clone()).or_insert(0) += 1;
        acc
    })
}

/// Count descending; equal counts keep workout type order
fn sorted_counts(counts: BTreeMap<WorkoutType, u32>) -> Vec<TypeCount> {
    let mut sorted: Vec<TypeCount> = counts
        .into_iter()
        .map(|(workout_type, count)| TypeCount { workout_type, count })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn session(y: i32, m: u32, d: u32, workout_type: WorkoutType) -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            workout_type,
            completed: false,
            exercises: vec![],
            notes: None,
        }
    }

    fn year_2024() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_average_days_between_two_sessions() {
        let sessions = vec![
            session(2024, 3, 8, WorkoutType::Push),
            session(2024, 3, 1, WorkoutType::Push),
        ];

        let analysis = FrequencyAnalyzer::new().analyze(&sessions, year_2024());
        assert_eq!(analysis.average_days_between_workouts, dec!(7));
    }

    #[test]
    fn test_type_distribution_and_months() {
        let sessions = vec![
            session(2024, 1, 2, WorkoutType::Push),
            session(2024, 1, 4, WorkoutType::Pull),
            session(2024, 1, 6, WorkoutType::Push),
            session(2024, 2, 1, WorkoutType::Legs),
        ];

        let analysis = FrequencyAnalyzer::new().analyze(&sessions, year_2024());

        assert_eq!(analysis.total_workouts, 4);
        assert_eq!(analysis.by_type[0].workout_type, WorkoutType::Push);
        assert_eq!(analysis.by_type[0].count, 2);
        assert_eq!(analysis.by_type[0].percentage, dec!(50));

        assert_eq!(analysis.by_month.len(), 2);
        assert_eq!((analysis.by_month[0].year, analysis.by_month[0].month), (2024, 1));
        assert_eq!(analysis.by_month[0].workout_count, 3);
        assert_eq!(analysis.by_month[0].by_type[0].count, 2);
        assert_eq!(analysis.workouts_per_month, dec!(2));

        // gaps: 2, 2, 26 → 10
        assert_eq!(analysis.average_days_between_workouts, dec!(10));
    }

    #[test]
    fn test_empty_range() {
        let analysis = FrequencyAnalyzer::new().analyze(&[], year_2024());
        assert_eq!(analysis.total_workouts, 0);
        assert!(analysis.by_type.is_empty());
        assert_eq!(analysis.average_days_between_workouts, dec!(0));
        assert_eq!(analysis.workouts_per_month, dec!(0));
    }

    #[test]
    fn test_single_session_has_no_spacing() {
        let sessions = vec![session(2024, 6, 1, WorkoutType::Cardio)];
        let analysis = FrequencyAnalyzer::new().analyze(&sessions, year_2024());
        assert_eq!(analysis.average_days_between_workouts, dec!(0));
        assert_eq!(analysis.by_type[0].percentage, dec!(100));
    }
}
