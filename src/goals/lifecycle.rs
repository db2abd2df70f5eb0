//! Goal creation, recalculation and deadline sweeps

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::{Goal, GoalId, GoalSettings, GoalTarget, GoalUpdate, NewGoal, ProgressContext};
use crate::clock::Clock;
use crate::error::{EntityKind, LiftError, Result};
use crate::models::{UserId, WorkoutSession};
use crate::notifications::{self, NotificationKind, NotificationRequest};
use crate::provider::{GoalStore, NotificationDispatcher, WorkoutDataProvider};

/// A goal or user that could not be processed during a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub user_id: UserId,
    pub goal_id: Option<GoalId>,
    pub error: String,

    /// Whether rerunning the sweep may succeed for this entry
    #[serde(default)]
    pub retryable: bool,
}

/// Outcome of a batch sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Users visited
    pub users_processed: usize,

    /// Goals examined
    pub goals_processed: usize,

    /// Goals whose stored progress changed
    pub goals_updated: usize,

    /// Goals that reached 100% during this sweep
    pub goals_completed: usize,

    pub notifications_sent: usize,

    /// Reminders skipped because one was sent recently
    pub notifications_suppressed: usize,

    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn is_fully_successful(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: SweepReport) {
        self.users_processed += other.users_processed;
        self.goals_processed += other.goals_processed;
        self.goals_updated += other.goals_updated;
        self.goals_completed += other.goals_completed;
        self.notifications_sent += other.notifications_sent;
        self.notifications_suppressed += other.notifications_suppressed;
        self.failures.extend(other.failures);
    }

    fn record_failure(&mut self, user_id: &str, goal_id: Option<GoalId>, error: &LiftError) {
        self.failures.push(SweepFailure {
            user_id: user_id.to_string(),
            goal_id,
            error: error.to_string(),
            retryable: error.is_retryable(),
        });
    }
}

enum ReminderOutcome {
    NotDue,
    Suppressed,
    Sent,
}

/// Coordinates goal validation, progress recalculation and notifications
pub struct GoalManager {
    workouts: Arc<dyn WorkoutDataProvider>,
    goals: Arc<dyn GoalStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    settings: GoalSettings,
}

impl GoalManager {
    pub fn new(
        workouts: Arc<dyn WorkoutDataProvider>,
        goals: Arc<dyn GoalStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_settings(workouts, goals, notifier, clock, GoalSettings::default())
    }

    pub fn with_settings(
        workouts: Arc<dyn WorkoutDataProvider>,
        goals: Arc<dyn GoalStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        settings: GoalSettings,
    ) -> Self {
        GoalManager {
            workouts,
            goals,
            notifier,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &GoalSettings {
        &self.settings
    }

    /// Validate and persist a new goal, then compute its initial progress
    pub fn create_goal(&self, user_id: &str, request: NewGoal) -> Result<Goal> {
        let target = request.target()?;

        let title = request.title.trim();
        if title.is_empty() {
            return Err(LiftError::Validation("Goal title is required".to_string()));
        }

        if let Some(exercise_id) = target.exercise_id() {
            self.workouts
                .fetch_exercise(exercise_id)?
                .ok_or_else(|| LiftError::not_found(EntityKind::Exercise, exercise_id))?;
            self.ensure_no_active_duplicate(user_id, &target)?;
        }

        let now = self.clock.now();
        let today = now.date_naive();
        let start_date = request.start_date.unwrap_or(today);
        let target_date = request
            .target_date
            .ok_or_else(|| LiftError::Validation("Target date is required".to_string()))?;
        self.validate_target_date(start_date, target_date, today)?;

        let mut goal = Goal {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: request.description,
            target,
            start_date,
            target_date,
            completion_percentage: rust_decimal::Decimal::ZERO,
            completed: false,
            completed_at: None,
            created_at: now,
        };

        let completed_now = match self.workouts.fetch_user_workouts(user_id, None) {
            Ok(history) => self.refresh_progress(&mut goal, &history, now),
            Err(e) => {
                warn!(user_id, error = %e, "Initial goal progress unavailable");
                false
            }
        };

        self.goals.insert_goal(goal.clone())?;
        info!(
            goal_id = %goal.id,
            user_id,
            goal_type = %goal.goal_type(),
            progress = %goal.completion_percentage,
            "Goal created"
        );

        self.notify(NotificationRequest::for_goal(
            &goal,
            NotificationKind::GoalCreated,
            notifications::goal_created_message(&goal),
        ));
        if completed_now {
            self.notify_completed(&goal);
        }

        Ok(goal)
    }

    /// Fetch a goal owned by `user_id`
    pub fn get_goal(&self, user_id: &str, goal_id: GoalId) -> Result<Goal> {
        let goal = self
            .goals
            .get_goal(goal_id)?
            .ok_or_else(|| LiftError::not_found(EntityKind::Goal, goal_id))?;

        if goal.user_id != user_id {
            return Err(LiftError::Unauthorized(format!(
                "Goal {} does not belong to user {}",
                goal_id, user_id
            )));
        }
        Ok(goal)
    }

    /// All goals of a user, active first then by target date
    pub fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let mut goals = self.goals.goals_for_user(user_id)?;
        goals.sort_by(|a, b| {
            a.completed
                .cmp(&b.completed)
                .then(a.target_date.cmp(&b.target_date))
        });
        Ok(goals)
    }

    /// Edit title, description or target date
    pub fn update_goal(&self, user_id: &str, goal_id: GoalId, update: GoalUpdate) -> Result<Goal> {
        let mut goal = self.get_goal(user_id, goal_id)?;

        if let Some(title) = update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(LiftError::Validation("Goal title is required".to_string()));
            }
            goal.title = title.to_string();
        }

        if let Some(description) = update.description {
            goal.description = Some(description).filter(|d| !d.trim().is_empty());
        }

        if let Some(target_date) = update.target_date {
            self.validate_target_date(goal.start_date, target_date, self.clock.today())?;
            goal.target_date = target_date;
        }

        self.goals.update_goal(&goal)?;
        debug!(goal_id = %goal.id, "Goal updated");
        Ok(goal)
    }

    /// Explicitly complete a goal; completed goals are returned unchanged
    pub fn complete_goal(&self, user_id: &str, goal_id: GoalId) -> Result<Goal> {
        let mut goal = self.get_goal(user_id, goal_id)?;
        if goal.completed {
            return Ok(goal);
        }

        goal.mark_completed(self.clock.now());
        self.goals.update_goal(&goal)?;
        info!(goal_id = %goal.id, user_id, "Goal marked complete");
        self.notify_completed(&goal);
        Ok(goal)
    }

    /// Recompute and store the progress of one goal
    pub fn recalculate_goal(&self, user_id: &str, goal_id: GoalId) -> Result<Goal> {
        let mut goal = self.get_goal(user_id, goal_id)?;
        if goal.completed {
            return Ok(goal);
        }

        let history = self.workouts.fetch_user_workouts(user_id, None)?;
        let now = self.clock.now();
        let previous = goal.completion_percentage;
        let completed_now = self.refresh_progress(&mut goal, &history, now);

        if goal.completion_percentage != previous || completed_now {
            self.goals.update_goal(&goal)?;
        }
        if completed_now {
            self.notify_completed(&goal);
        }
        Ok(goal)
    }

    /// Recalculate every active goal of a user.
    ///
    /// A failure on one goal is logged and recorded; the rest still run.
    pub fn recalculate_user_goals(&self, user_id: &str) -> Result<SweepReport> {
        let _span = info_span!("recalculate_user_goals", user_id).entered();
        let mut report = SweepReport {
            users_processed: 1,
            ..SweepReport::default()
        };

        let active: Vec<Goal> = self
            .goals
            .goals_for_user(user_id)?
            .into_iter()
            .filter(Goal::is_active)
            .collect();
        if active.is_empty() {
            return Ok(report);
        }

        let history = self.workouts.fetch_user_workouts(user_id, None)?;
        let now = self.clock.now();

        for mut goal in active {
            report.goals_processed += 1;
            let previous = goal.completion_percentage;
            let completed_now = self.refresh_progress(&mut goal, &history, now);

            if goal.completion_percentage == previous && !completed_now {
                continue;
            }

            match self.goals.update_goal(&goal) {
                Ok(()) => {
                    report.goals_updated += 1;
                    if completed_now {
                        report.goals_completed += 1;
                        self.notify_completed(&goal);
                    }
                }
                Err(e) => {
                    warn!(goal_id = %goal.id, error = %e, "Failed to store recalculated goal");
                    report.record_failure(user_id, Some(goal.id), &e);
                }
            }
        }

        info!(
            goals = report.goals_processed,
            updated = report.goals_updated,
            completed = report.goals_completed,
            "Goal recalculation finished"
        );
        Ok(report)
    }

    /// Recalculate active goals of every user.
    ///
    /// Users whose goals or history cannot be loaded are recorded and skipped.
    pub fn recalculate_all_goals(&self) -> Result<SweepReport> {
        let _span = info_span!("recalculate_all_goals").entered();
        let mut report = SweepReport::default();

        let mut users: Vec<UserId> = self
            .goals
            .active_goals()?
            .into_iter()
            .map(|goal| goal.user_id)
            .collect();
        users.sort();
        users.dedup();

        for user_id in users {
            match self.recalculate_user_goals(&user_id) {
                Ok(user_report) => report.merge(user_report),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Goal recalculation failed for user");
                    report.users_processed += 1;
                    report.record_failure(&user_id, None, &e);
                }
            }
        }
        Ok(report)
    }

    /// Remind users about active goals whose target date is near.
    ///
    /// A reminder for the same goal is sent at most once per suppression window.
    pub fn send_deadline_reminders(&self) -> Result<SweepReport> {
        let _span = info_span!("deadline_sweep").entered();
        let now = self.clock.now();
        let mut report = SweepReport::default();

        let mut by_user: BTreeMap<UserId, Vec<Goal>> = BTreeMap::new();
        for goal in self.goals.active_goals()? {
            by_user.entry(goal.user_id.clone()).or_default().push(goal);
        }

        for (user_id, goals) in by_user {
            report.users_processed += 1;
            for goal in goals {
                report.goals_processed += 1;
                match self.remind_if_due(&goal, now) {
                    Ok(ReminderOutcome::Sent) => report.notifications_sent += 1,
                    Ok(ReminderOutcome::Suppressed) => report.notifications_suppressed += 1,
                    Ok(ReminderOutcome::NotDue) => {}
                    Err(e) => {
                        warn!(user_id = %user_id, goal_id = %goal.id, error = %e, "Deadline reminder failed");
                        report.record_failure(&user_id, Some(goal.id), &e);
                    }
                }
            }
        }

        info!(
            users = report.users_processed,
            sent = report.notifications_sent,
            suppressed = report.notifications_suppressed,
            failures = report.failures.len(),
            "Deadline sweep finished"
        );
        Ok(report)
    }

    fn remind_if_due(&self, goal: &Goal, now: DateTime<Utc>) -> Result<ReminderOutcome> {
        let days_remaining = goal.days_remaining(now.date_naive());
        if !(0..=self.settings.deadline_window_days).contains(&days_remaining) {
            return Ok(ReminderOutcome::NotDue);
        }

        let since = now - Duration::hours(self.settings.notification_suppression_hours);
        let recent = self.notifier.fetch_recent_notifications(
            &goal.user_id,
            NotificationKind::GoalDeadline,
            goal.id,
            since,
        )?;
        if !recent.is_empty() {
            debug!(goal_id = %goal.id, "Deadline reminder suppressed");
            return Ok(ReminderOutcome::Suppressed);
        }

        self.notifier.dispatch_notification(NotificationRequest::for_goal(
            goal,
            NotificationKind::GoalDeadline,
            notifications::goal_deadline_message(goal, days_remaining, goal.completion_percentage),
        ))?;
        Ok(ReminderOutcome::Sent)
    }

    /// Apply the goal's progress rule; true if the goal just completed
    fn refresh_progress(&self, goal: &mut Goal, history: &[WorkoutSession], now: DateTime<Utc>) -> bool {
        let context = ProgressContext {
            start_date: goal.start_date,
            today: now.date_naive(),
        };

        match goal.target.compute_progress(history, &context) {
            Some(progress) => goal.apply_progress(progress, now),
            None => false,
        }
    }

    fn ensure_no_active_duplicate(&self, user_id: &str, target: &GoalTarget) -> Result<()> {
        let duplicate = self.goals.goals_for_user(user_id)?.into_iter().any(|existing| {
            existing.is_active()
                && existing.goal_type() == target.goal_type()
                && existing.target.exercise_id() == target.exercise_id()
        });

        if duplicate {
            return Err(LiftError::Validation(format!(
                "An active {} goal already exists for this exercise",
                target.goal_type()
            )));
        }
        Ok(())
    }

    fn validate_target_date(&self, start_date: NaiveDate, target_date: NaiveDate, today: NaiveDate) -> Result<()> {
        if target_date <= today {
            return Err(LiftError::Validation(
                "Target date must be in the future".to_string(),
            ));
        }
        if target_date <= start_date {
            return Err(LiftError::Validation(
                "Target date must be after the start date".to_string(),
            ));
        }

        let horizon = today
            .checked_add_months(Months::new(self.settings.max_horizon_months))
            .unwrap_or(NaiveDate::MAX);
        if target_date > horizon {
            return Err(LiftError::Validation(format!(
                "Target date must be within {} months",
                self.settings.max_horizon_months
            )));
        }
        Ok(())
    }

    fn notify_completed(&self, goal: &Goal) {
        self.notify(NotificationRequest::for_goal(
            goal,
            NotificationKind::GoalCompleted,
            notifications::goal_completed_message(goal),
        ));
    }

    /// Fire-and-forget dispatch; failures never reach the caller
    fn notify(&self, request: NotificationRequest) {
        let kind = request.kind;
        if let Err(e) = self.notifier.dispatch_notification(request) {
            warn!(%kind, error = %e, "Notification dispatch failed");
        }
    }
}
