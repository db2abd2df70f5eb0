//! Notification records exchanged with the dispatch collaborator

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::goals::Goal;
use crate::models::UserId;

/// Notification categories produced by the goal lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    GoalCreated,
    GoalDeadline,
    GoalCompleted,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::GoalCreated => write!(f, "goal_created"),
            NotificationKind::GoalDeadline => write!(f, "goal_deadline"),
            NotificationKind::GoalCompleted => write!(f, "goal_completed"),
        }
    }
}

/// Entity a notification points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedEntityType {
    Goal,
}

/// Outgoing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub related_entity_type: Option<RelatedEntityType>,
    pub related_entity_id: Option<Uuid>,
}

impl NotificationRequest {
    /// Notification about a specific goal
    pub fn for_goal(goal: &Goal, kind: NotificationKind, message: String) -> Self {
        NotificationRequest {
            user_id: goal.user_id.clone(),
            kind,
            message,
            related_entity_type: Some(RelatedEntityType::Goal),
            related_entity_id: Some(goal.id),
        }
    }
}

/// A notification already delivered to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub related_entity_type: Option<RelatedEntityType>,
    pub related_entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn from_request(request: NotificationRequest, created_at: DateTime<Utc>) -> Self {
        Notification {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            kind: request.kind,
            message: request.message,
            related_entity_type: request.related_entity_type,
            related_entity_id: request.related_entity_id,
            created_at,
            read: false,
        }
    }
}

pub fn goal_created_message(goal: &Goal) -> String {
    format!(
        "New goal \"{}\" created. Target date: {}.",
        goal.title,
        goal.target_date.format("%Y-%m-%d")
    )
}

pub fn goal_completed_message(goal: &Goal) -> String {
    format!("Congratulations! You achieved your goal \"{}\".", goal.title)
}

pub fn goal_deadline_message(goal: &Goal, days_remaining: i64, completion: Decimal) -> String {
    let due = match days_remaining {
        0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        n => format!("in {} days", n),
    };
    format!(
        "Your goal \"{}\" is due {}. Current progress: {}%.",
        goal.title, due, completion
    )
}
