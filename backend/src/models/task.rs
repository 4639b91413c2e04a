use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{FrequencyType, Recurrence, TaskStatus, TimeOfDay};
use sqlx::FromRow;

use super::{parse_optional_uuid, parse_uuid, RowError};

/// Database model for tasks
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub household_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub is_recurring: bool,
    pub frequency_type: Option<String>,
    pub frequency_value: i64,
    pub scheduled_days: Option<String>,
    pub scheduled_time: Option<String>,
    pub earliest_completion_time: Option<String>,
    pub points_value: i64,
    pub notify_on_incomplete: bool,
    pub created_by: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Weekday list as stored in `tasks.scheduled_days`.
pub fn encode_scheduled_days(days: &[u8]) -> Option<String> {
    if days.is_empty() {
        None
    } else {
        serde_json::to_string(days).ok()
    }
}

fn parse_time(column: &'static str, value: Option<&str>) -> Result<Option<TimeOfDay>, RowError> {
    value
        .map(|v| v.parse().map_err(|_| RowError::new(column, v)))
        .transpose()
}

impl TaskRow {
    fn recurrence(&self) -> Result<Option<Recurrence>, RowError> {
        if !self.is_recurring {
            return Ok(None);
        }

        let raw_type = self.frequency_type.as_deref().unwrap_or_default();
        let frequency_type: FrequencyType = raw_type
            .parse()
            .map_err(|_| RowError::new("tasks.frequency_type", raw_type))?;

        let scheduled_days: Vec<u8> = match self.scheduled_days.as_deref() {
            Some(raw) => serde_json::from_str(raw).map_err(|_| RowError::new("tasks.scheduled_days", raw))?,
            None => Vec::new(),
        };

        let frequency_value = u32::try_from(self.frequency_value)
            .map_err(|_| RowError::new("tasks.frequency_value", self.frequency_value.to_string()))?;

        let scheduled_time = parse_time("tasks.scheduled_time", self.scheduled_time.as_deref())?;

        Recurrence::new(frequency_type, frequency_value, scheduled_days, scheduled_time)
            .map(Some)
            .map_err(|e| RowError::new("tasks.recurrence", e.to_string()))
    }

    fn status(&self) -> Result<TaskStatus, RowError> {
        if !self.is_deleted {
            return Ok(TaskStatus::Active);
        }

        match (self.deleted_by.as_deref(), self.deleted_at) {
            (Some(by), Some(at)) => Ok(TaskStatus::Deleted {
                deleted_by: parse_uuid("tasks.deleted_by", by)?,
                deleted_at: at,
            }),
            _ => Err(RowError::new("tasks.is_deleted", "deleted without stamp")),
        }
    }

    pub fn to_shared(&self) -> Result<shared::Task, RowError> {
        Ok(shared::Task {
            id: parse_uuid("tasks.id", &self.id)?,
            household_id: parse_uuid("tasks.household_id", &self.household_id)?,
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            recurrence: self.recurrence()?,
            earliest_completion_time: parse_time(
                "tasks.earliest_completion_time",
                self.earliest_completion_time.as_deref(),
            )?,
            points_value: self.points_value,
            notify_on_incomplete: self.notify_on_incomplete,
            created_by: parse_optional_uuid("tasks.created_by", self.created_by.as_deref())?,
            status: self.status()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn weekly_row() -> TaskRow {
        let now = Utc::now();
        TaskRow {
            id: Uuid::new_v4().to_string(),
            household_id: Uuid::new_v4().to_string(),
            title: "Take out trash".to_string(),
            description: None,
            category: "general".to_string(),
            is_recurring: true,
            frequency_type: Some("weekly".to_string()),
            frequency_value: 1,
            scheduled_days: Some("[5,1]".to_string()),
            scheduled_time: Some("09:00".to_string()),
            earliest_completion_time: None,
            points_value: 10,
            notify_on_incomplete: false,
            created_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_task_row_to_shared_recurring() {
        let task = weekly_row().to_shared().unwrap();
        let recurrence = task.recurrence.unwrap();

        assert_eq!(recurrence.frequency_type, FrequencyType::Weekly);
        assert_eq!(recurrence.scheduled_days, vec![1, 5]);
        assert_eq!(recurrence.scheduled_time, Some(TimeOfDay::new(9, 0).unwrap()));
        assert_eq!(task.status, TaskStatus::Active);
    }

    #[test]
    fn test_task_row_one_off_ignores_frequency_columns() {
        let mut row = weekly_row();
        row.is_recurring = false;
        assert!(row.to_shared().unwrap().recurrence.is_none());
    }

    #[test]
    fn test_task_row_deleted_status() {
        let deleter = Uuid::new_v4();
        let mut row = weekly_row();
        row.is_deleted = true;
        row.deleted_by = Some(deleter.to_string());
        row.deleted_at = Some(Utc::now());

        let task = row.to_shared().unwrap();
        assert!(task.is_deleted());
        assert!(matches!(task.status, TaskStatus::Deleted { deleted_by, .. } if deleted_by == deleter));
    }

    #[test]
    fn test_task_row_rejects_bad_frequency() {
        let mut row = weekly_row();
        row.frequency_type = Some("yearly".to_string());
        assert_eq!(row.to_shared().unwrap_err().column, "tasks.frequency_type");
    }

    #[test]
    fn test_encode_scheduled_days() {
        assert_eq!(encode_scheduled_days(&[]), None);
        assert_eq!(encode_scheduled_days(&[1, 5]), Some("[1,5]".to_string()));
    }
}
