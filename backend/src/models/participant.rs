use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_uuid, RowError};

/// Database model for task rotation members
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub rotation_order: i64,
    pub is_active: bool,
}

impl ParticipantRow {
    pub fn to_shared(&self) -> Result<shared::TaskParticipant, RowError> {
        Ok(shared::TaskParticipant {
            id: parse_uuid("task_participants.id", &self.id)?,
            task_id: parse_uuid("task_participants.task_id", &self.task_id)?,
            user_id: parse_uuid("task_participants.user_id", &self.user_id)?,
            rotation_order: self.rotation_order,
            is_active: self.is_active,
        })
    }
}
