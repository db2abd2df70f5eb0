//! In-memory collaborators and the JSON dataset they are loaded from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::clock::Clock;
use crate::error::{EntityKind, LiftError, Result};
use crate::goals::{Goal, GoalId};
use crate::models::{DateRange, Exercise, ExerciseId, WorkoutId, WorkoutSession};
use crate::notifications::{Notification, NotificationKind, NotificationRequest};
use crate::provider::{GoalStore, NotificationDispatcher, WorkoutDataProvider};

fn poisoned<T>(_: T) -> LiftError {
    LiftError::Provider("store lock poisoned".to_string())
}

/// Read-only workout history keyed by workout id
#[derive(Debug, Default)]
pub struct InMemoryWorkoutStore {
    exercises: HashMap<ExerciseId, Exercise>,
    workouts: BTreeMap<WorkoutId, WorkoutSession>,
}

impl InMemoryWorkoutStore {
    pub fn new(exercises: Vec<Exercise>, workouts: Vec<WorkoutSession>) -> Self {
        let mut catalog: HashMap<ExerciseId, Exercise> = exercises
            .into_iter()
            .map(|exercise| (exercise.id, exercise))
            .collect();

        // Exercises referenced only from sessions are still resolvable
        for exercise in workouts
            .iter()
            .flat_map(|session| session.exercises.iter().map(|we| &we.exercise))
        {
            catalog
                .entry(exercise.id)
                .or_insert_with(|| exercise.clone());
        }

        InMemoryWorkoutStore {
            exercises: catalog,
            workouts: workouts.into_iter().map(|w| (w.id, w)).collect(),
        }
    }

    pub fn exercises(&self) -> Vec<Exercise> {
        let mut exercises: Vec<Exercise> = self.exercises.values().cloned().collect();
        exercises.sort_by(|a, b| a.name.cmp(&b.name));
        exercises
    }

    pub fn workouts(&self) -> Vec<WorkoutSession> {
        self.workouts.values().cloned().collect()
    }
}

impl WorkoutDataProvider for InMemoryWorkoutStore {
    fn fetch_user_workouts(
        &self,
        user_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<WorkoutSession>> {
        let mut sessions: Vec<WorkoutSession> = self
            .workouts
            .values()
            .filter(|w| w.user_id == user_id)
            .filter(|w| range.map_or(true, |r| r.contains(w.date)))
            .cloned()
            .collect();
        sessions.sort_by_key(|w| w.date);
        Ok(sessions)
    }

    fn fetch_workout_detail(&self, workout_id: WorkoutId) -> Result<Option<WorkoutSession>> {
        Ok(self.workouts.get(&workout_id).cloned())
    }

    fn fetch_exercise(&self, exercise_id: ExerciseId) -> Result<Option<Exercise>> {
        Ok(self.exercises.get(&exercise_id).cloned())
    }
}

/// Goal store backed by a lock-protected map
#[derive(Debug, Default)]
pub struct InMemoryGoalStore {
    goals: RwLock<BTreeMap<GoalId, Goal>>,
}

impl InMemoryGoalStore {
    pub fn new(goals: Vec<Goal>) -> Self {
        InMemoryGoalStore {
            goals: RwLock::new(goals.into_iter().map(|g| (g.id, g)).collect()),
        }
    }

    pub fn all_goals(&self) -> Result<Vec<Goal>> {
        Ok(self.goals.read().map_err(poisoned)?.values().cloned().collect())
    }
}

impl GoalStore for InMemoryGoalStore {
    fn get_goal(&self, goal_id: GoalId) -> Result<Option<Goal>> {
        Ok(self.goals.read().map_err(poisoned)?.get(&goal_id).cloned())
    }

    fn insert_goal(&self, goal: Goal) -> Result<()> {
        let mut goals = self.goals.write().map_err(poisoned)?;
        if goals.contains_key(&goal.id) {
            return Err(LiftError::Provider(format!("Duplicate goal id {}", goal.id)));
        }
        goals.insert(goal.id, goal);
        Ok(())
    }

    fn update_goal(&self, goal: &Goal) -> Result<()> {
        let mut goals = self.goals.write().map_err(poisoned)?;
        match goals.get_mut(&goal.id) {
            Some(existing) => {
                *existing = goal.clone();
                Ok(())
            }
            None => Err(LiftError::not_found(EntityKind::Goal, goal.id)),
        }
    }

    fn goals_for_user(&self, user_id: &str) -> Result<Vec<Goal>> {
        Ok(self
            .goals
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    fn active_goals(&self) -> Result<Vec<Goal>> {
        Ok(self
            .goals
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|g| g.is_active())
            .cloned()
            .collect())
    }
}

/// Notification outbox that records every delivered notification
pub struct InMemoryNotificationCenter {
    clock: Arc<dyn Clock>,
    notifications: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationCenter {
    pub fn new(clock: Arc<dyn Clock>, history: Vec<Notification>) -> Self {
        InMemoryNotificationCenter {
            clock,
            notifications: RwLock::new(history),
        }
    }

    /// Everything delivered so far, oldest first
    pub fn notifications(&self) -> Result<Vec<Notification>> {
        Ok(self.notifications.read().map_err(poisoned)?.clone())
    }
}

impl NotificationDispatcher for InMemoryNotificationCenter {
    fn dispatch_notification(&self, request: NotificationRequest) -> Result<()> {
        let notification = Notification::from_request(request, self.clock.now());
        debug!(
            user_id = %notification.user_id,
            kind = %notification.kind,
            "Notification delivered"
        );
        self.notifications
            .write()
            .map_err(poisoned)?
            .push(notification);
        Ok(())
    }

    fn fetch_recent_notifications(
        &self,
        user_id: &str,
        kind: NotificationKind,
        related_goal_id: GoalId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        Ok(self
            .notifications
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|n| {
                n.user_id == user_id
                    && n.kind == kind
                    && n.related_entity_id == Some(related_goal_id)
                    && n.created_at >= since
            })
            .cloned()
            .collect())
    }
}

/// Serialized snapshot of exercises, workouts, goals and notifications
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub workouts: Vec<WorkoutSession>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// In-memory collaborators built from a dataset
pub struct DatasetStores {
    pub workouts: Arc<InMemoryWorkoutStore>,
    pub goals: Arc<InMemoryGoalStore>,
    pub notifications: Arc<InMemoryNotificationCenter>,
}

impl Dataset {
    /// Load a dataset from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let dataset: Dataset = serde_json::from_str(&content)?;
        debug!(
            path = %path.as_ref().display(),
            workouts = dataset.workouts.len(),
            goals = dataset.goals.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Write the dataset as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(())
    }

    pub fn into_stores(self, clock: Arc<dyn Clock>) -> DatasetStores {
        DatasetStores {
            workouts: Arc::new(InMemoryWorkoutStore::new(self.exercises, self.workouts)),
            goals: Arc::new(InMemoryGoalStore::new(self.goals)),
            notifications: Arc::new(InMemoryNotificationCenter::new(clock, self.notifications)),
        }
    }
}

impl DatasetStores {
    /// Snapshot the current state of every store
    pub fn to_dataset(&self) -> Result<Dataset> {
        Ok(Dataset {
            exercises: self.workouts.exercises(),
            workouts: self.workouts.workouts(),
            goals: self.goals.all_goals()?,
            notifications: self.notifications.notifications()?,
        })
    }
}
