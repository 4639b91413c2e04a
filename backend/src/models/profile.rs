use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_optional_uuid, parse_uuid, RowError};

/// Database model for member profiles
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub household_id: Option<String>,
    pub display_name: String,
    pub role: String,
    pub current_streak: i64,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn to_shared(&self) -> Result<shared::Profile, RowError> {
        let role = self
            .role
            .parse()
            .map_err(|_| RowError::new("profiles.role", &self.role))?;

        Ok(shared::Profile {
            id: parse_uuid("profiles.id", &self.id)?,
            household_id: parse_optional_uuid("profiles.household_id", self.household_id.as_deref())?,
            display_name: self.display_name.clone(),
            role,
            current_streak: self.current_streak,
            total_points: self.total_points,
            created_at: self.created_at,
        })
    }
}
