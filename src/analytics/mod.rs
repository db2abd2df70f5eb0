//! Workout analytics: strength trends, volume distribution, training
//! frequency and workout-to-workout comparison
//!
//! The analyzers are pure functions of already-fetched sessions.
//! `AnalyticsService` resolves users, exercises and workouts through a
//! `WorkoutDataProvider` and hands the history to the analyzers.

pub mod comparison;
pub mod frequency;
pub mod strength;
pub mod volume;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info_span};

use crate::error::{EntityKind, LiftError, Result};
use crate::formulas::EPLEY_COEFFICIENT;
use crate::models::{DateRange, ExerciseId, WorkoutId, WorkoutSession};
use crate::provider::WorkoutDataProvider;

pub use comparison::{ComparisonAnalyzer, ExerciseComparison, WorkoutComparison, WorkoutStats};
pub use frequency::{FrequencyAnalysis, FrequencyAnalyzer, MonthlyFrequency, WorkoutTypeFrequency};
pub use strength::{
    StrengthProgress, StrengthProgressAnalyzer, StrengthProgressPoint, StrengthProgressSummary,
};
pub use volume::{ExerciseVolume, VolumeAnalysis, VolumeAnalyzer, VolumeTrendPoint};

/// Which sets of a completed session contribute to volume analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSetFilter {
    /// Every logged set, completed or not
    #[default]
    AllSets,
    /// Only sets flagged completed, matching volume goal progress
    CompletedOnly,
}

impl std::str::FromStr for VolumeSetFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all" | "all_sets" => Ok(VolumeSetFilter::AllSets),
            "completed" | "completed_only" => Ok(VolumeSetFilter::CompletedOnly),
            _ => Err(format!("Invalid volume set filter: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    pub epley_coefficient: Decimal,
    #[serde(default)]
    pub volume_set_filter: VolumeSetFilter,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        AnalyticsSettings {
            epley_coefficient: EPLEY_COEFFICIENT,
            volume_set_filter: VolumeSetFilter::default(),
        }
    }
}

/// Per-user analytics over a workout data provider
pub struct AnalyticsService {
    provider: Arc<dyn WorkoutDataProvider>,
    settings: AnalyticsSettings,
}

impl AnalyticsService {
    pub fn new(provider: Arc<dyn WorkoutDataProvider>) -> Self {
        Self::with_settings(provider, AnalyticsSettings::default())
    }

    pub fn with_settings(provider: Arc<dyn WorkoutDataProvider>, settings: AnalyticsSettings) -> Self {
        AnalyticsService { provider, settings }
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    /// Strength trend of one exercise; NotFound if the exercise is unknown
    pub fn strength_progress(
        &self,
        user_id: &str,
        exercise_id: ExerciseId,
        range: DateRange,
    ) -> Result<StrengthProgress> {
        let _span = info_span!("strength_progress", user_id, %exercise_id).entered();

        let exercise = self
            .provider
            .fetch_exercise(exercise_id)?
            .ok_or_else(|| LiftError::not_found(EntityKind::Exercise, exercise_id))?;

        let sessions = self.provider.fetch_user_workouts(user_id, Some(range))?;
        debug!("Analyzing {} sessions for {}", sessions.len(), exercise.name);

        Ok(StrengthProgressAnalyzer::with_coefficient(self.settings.epley_coefficient)
            .analyze(&exercise, range, &sessions))
    }

    pub fn volume_analysis(&self, user_id: &str, range: DateRange) -> Result<VolumeAnalysis> {
        let _span = info_span!("volume_analysis", user_id).entered();

        let sessions = self.provider.fetch_user_workouts(user_id, Some(range))?;
        debug!("Analyzing volume over {} sessions", sessions.len());

        Ok(VolumeAnalyzer::with_set_filter(self.settings.volume_set_filter).analyze(&sessions, range))
    }

    pub fn frequency_analysis(&self, user_id: &str, range: DateRange) -> Result<FrequencyAnalysis> {
        let _span = info_span!("frequency_analysis", user_id).entered();

        let sessions = self.provider.fetch_user_workouts(user_id, Some(range))?;
        Ok(FrequencyAnalyzer::new().analyze(&sessions, range))
    }

    /// Compare two of the user's workouts, `first` being the baseline
    pub fn compare_workouts(
        &self,
        user_id: &str,
        first: WorkoutId,
        second: WorkoutId,
    ) -> Result<WorkoutComparison> {
        let _span = info_span!("compare_workouts", user_id, %first, %second).entered();

        let first = self.owned_workout(user_id, first)?;
        let second = self.owned_workout(user_id, second)?;

        ComparisonAnalyzer::new().compare(&first, &second)
    }

    fn owned_workout(&self, user_id: &str, workout_id: WorkoutId) -> Result<WorkoutSession> {
        let session = self
            .provider
            .fetch_workout_detail(workout_id)?
            .ok_or_else(|| LiftError::not_found(EntityKind::Workout, workout_id))?;

        if session.user_id != user_id {
            return Err(LiftError::Unauthorized(format!(
                "Workout {} does not belong to user {}",
                workout_id, user_id
            )));
        }
        Ok(session)
    }
}
