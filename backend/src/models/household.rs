use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_uuid, RowError};

/// Database model for households
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HouseholdRow {
    pub id: String,
    pub name: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl HouseholdRow {
    pub fn to_shared(&self) -> Result<shared::Household, RowError> {
        Ok(shared::Household {
            id: parse_uuid("households.id", &self.id)?,
            name: self.name.clone(),
            timezone: self.timezone.clone(),
            created_at: self.created_at,
        })
    }
}
