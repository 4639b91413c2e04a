use chrono_tz::Tz;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{HouseholdRow, RowError};
use crate::services::schedule;
use shared::Household;

#[derive(Debug, Error)]
pub enum HouseholdError {
    #[error("Household not found")]
    NotFound,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("{0}")]
    InvalidRow(#[from] RowError),
}

pub async fn get_household(pool: &SqlitePool, household_id: &Uuid) -> Result<Option<Household>, HouseholdError> {
    let household: Option<HouseholdRow> = sqlx::query_as("SELECT * FROM households WHERE id = ?")
        .bind(household_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(household.map(|h| h.to_shared()).transpose()?)
}

/// Timezone that defines "today" for a household.
pub async fn household_timezone(pool: &SqlitePool, household_id: &Uuid, fallback: Tz) -> Result<Tz, HouseholdError> {
    let timezone: Option<String> = sqlx::query_scalar("SELECT timezone FROM households WHERE id = ?")
        .bind(household_id.to_string())
        .fetch_optional(pool)
        .await?;

    match timezone {
        Some(name) => Ok(schedule::parse_timezone(&name, fallback)),
        None => Err(HouseholdError::NotFound),
    }
}
