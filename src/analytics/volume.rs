use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::VolumeSetFilter;
use crate::formulas::{percentage_of, round2};
use crate::models::{DateRange, ExerciseId, WorkoutId, WorkoutSession, WorkoutType};

/// Accumulated volume of one exercise across the range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseVolume {
    pub exercise_id: ExerciseId,
    pub exercise_name: String,
    pub total_volume: Decimal,

    /// Number of sessions in which the exercise was performed
    pub session_count: u32,

    /// Share of the range's total volume
    pub percentage: Decimal,
}

/// Total volume of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeTrendPoint {
    pub date: NaiveDate,
    pub workout_id: WorkoutId,
    pub total_volume: Decimal,
    pub workout_type: WorkoutType,
}

/// Volume distribution and trend over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    pub range: DateRange,
    pub total_volume: Decimal,
    pub workout_count: u32,
    pub average_volume_per_workout: Decimal,

    /// Sorted by total volume, largest first
    pub exercises: Vec<ExerciseVolume>,

    /// Ascending by date
    pub trend: Vec<VolumeTrendPoint>,
}

/// Per-exercise volumes of a single session
#[derive(Debug, Clone)]
struct SessionVolume {
    trend: VolumeTrendPoint,
    exercises: BTreeMap<ExerciseId, (String, Decimal)>,
}

#[derive(Debug, Clone)]
struct RunningTotal {
    name: String,
    volume: Decimal,
    sessions: u32,
}

/// Aggregates training volume over completed sessions
#[derive(Debug, Clone, Default)]
pub struct VolumeAnalyzer {
    set_filter: VolumeSetFilter,
}

impl VolumeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set_filter(set_filter: VolumeSetFilter) -> Self {
        VolumeAnalyzer { set_filter }
    }

    pub fn analyze(&self, sessions: &[WorkoutSession], range: DateRange) -> VolumeAnalysis {
        let qualifying: Vec<&WorkoutSession> = sessions
            .iter()
            .filter(|s| s.completed && range.contains(s.date))
            .collect();

        let breakdowns: Vec<SessionVolume> = qualifying
            .par_iter()
            .map(|session| self.session_volume(session))
            .collect();

        let totals = breakdowns.iter().fold(
            BTreeMap::<ExerciseId, RunningTotal>::new(),
            |mut acc, session| {
                for (exercise_id, (name, volume)) in &session.exercises {
                    let entry = acc.entry(*exercise_id).or_insert_with(|| RunningTotal {
                        name: name.clone(),
                        volume: Decimal::ZERO,
                        sessions: 0,
                    });
                    entry.volume += *volume;
                    entry.sessions += 1;
                }
                acc
            },
        );

        let total_volume: Decimal = totals.values().map(|t| t.volume).sum();

        let mut exercises: Vec<ExerciseVolume> = totals
            .into_iter()
            .map(|(exercise_id, total)| ExerciseVolume {
                exercise_id,
                exercise_name: total.name,
                total_volume: total.volume,
                session_count: total.sessions,
                percentage: percentage_of(total.volume, total_volume),
            })
            .collect();
        exercises.sort_by(|a, b| {
            b.total_volume
                .cmp(&a.total_volume)
                .then_with(|| a.exercise_name.cmp(&b.exercise_name))
        });

        let mut trend: Vec<VolumeTrendPoint> = breakdowns.into_iter().map(|b| b.trend).collect();
        trend.sort_by_key(|p| p.date);

        let workout_count = trend.len() as u32;
        let average_volume_per_workout = if workout_count == 0 {
            Decimal::ZERO
        } else {
            round2(total_volume / Decimal::from(workout_count))
        };

        VolumeAnalysis {
            range,
            total_volume,
            workout_count,
            average_volume_per_workout,
            exercises,
            trend,
        }
    }

    fn session_volume(&self, session: &WorkoutSession) -> SessionVolume {
        let mut exercises: BTreeMap<ExerciseId, (String, Decimal)> = BTreeMap::new();

        for workout_exercise in &session.exercises {
            let volume = match self.set_filter {
                VolumeSetFilter::AllSets => workout_exercise.total_volume(),
                VolumeSetFilter::CompletedOnly => workout_exercise.completed_volume(),
            };
            exercises
                .entry(workout_exercise.exercise.id)
                .or_insert_with(|| (workout_exercise.exercise.name.clone(), Decimal::ZERO))
                .1 += volume;
        }

        let total_volume = exercises.values().map(|(_, v)| *v).sum();

        SessionVolume {
            trend: VolumeTrendPoint {
                date: session.date,
                workout_id: session.id,
                total_volume,
                workout_type: session.workout_type.clone(),
            },
            exercises,
        }
    }
}
