use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::AssignmentStatus;
use sqlx::FromRow;

use super::{parse_uuid, RowError};

/// Database model for task assignments
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub id: String,
    pub task_id: String,
    pub assigned_to: String,
    pub due_date: NaiveDate,
    pub due_datetime: Option<DateTime<Utc>>,
    pub rotation_order: i64,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub awarded_points: Option<i64>,
    pub awarded_streak_bonus: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn assignment_status(&self) -> Result<AssignmentStatus, RowError> {
        let stamp = match (self.completed_by.as_deref(), self.completed_at) {
            (Some(by), Some(at)) => Some((parse_uuid("task_assignments.completed_by", by)?, at)),
            _ => None,
        };

        match (self.status.as_str(), stamp) {
            ("pending", None) => Ok(AssignmentStatus::Pending),
            ("completed", Some((completed_by, completed_at))) => Ok(AssignmentStatus::Completed {
                completed_by,
                completed_at,
            }),
            ("archived", Some((archived_by, archived_at))) => Ok(AssignmentStatus::Archived {
                archived_by,
                archived_at,
            }),
            _ => Err(RowError::new("task_assignments.status", &self.status)),
        }
    }

    pub fn to_shared(&self) -> Result<shared::TaskAssignment, RowError> {
        Ok(shared::TaskAssignment {
            id: parse_uuid("task_assignments.id", &self.id)?,
            task_id: parse_uuid("task_assignments.task_id", &self.task_id)?,
            assigned_to: parse_uuid("task_assignments.assigned_to", &self.assigned_to)?,
            due_date: self.due_date,
            due_datetime: self.due_datetime,
            rotation_order: self.rotation_order,
            status: self.assignment_status()?,
            awarded_points: self.awarded_points,
            awarded_streak_bonus: self.awarded_streak_bonus,
            created_at: self.created_at,
        })
    }
}
