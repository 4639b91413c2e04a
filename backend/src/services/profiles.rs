use std::collections::HashSet;

use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ProfileRow, RowError};
use shared::{LeaderboardEntry, Profile, Role, Task};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,
    #[error("User does not belong to a household")]
    NoHousehold,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("{0}")]
    InvalidRow(#[from] RowError),
}

/// The authenticated user acting on a household.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub household_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Tasks are mutable by their creator or a household admin.
    pub fn can_modify_task(&self, task: &Task) -> bool {
        task.household_id == self.household_id
            && (self.is_admin() || task.created_by == Some(self.user_id))
    }
}

pub async fn get_profile(pool: &SqlitePool, user_id: &Uuid) -> Result<Option<Profile>, ProfileError> {
    let profile: Option<ProfileRow> = sqlx::query_as("SELECT * FROM profiles WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(profile.map(|p| p.to_shared()).transpose()?)
}

pub async fn resolve_actor(pool: &SqlitePool, user_id: &Uuid) -> Result<Actor, ProfileError> {
    let profile = get_profile(pool, user_id).await?.ok_or(ProfileError::NotFound)?;
    let household_id = profile.household_id.ok_or(ProfileError::NoHousehold)?;

    Ok(Actor {
        user_id: profile.id,
        household_id,
        role: profile.role,
    })
}

pub async fn household_member_ids(pool: &SqlitePool, household_id: &Uuid) -> Result<HashSet<Uuid>, ProfileError> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM profiles WHERE household_id = ?")
        .bind(household_id.to_string())
        .fetch_all(pool)
        .await?;

    ids.iter()
        .map(|id| crate::models::parse_uuid("profiles.id", id).map_err(ProfileError::from))
        .collect()
}

pub async fn is_household_member(pool: &SqlitePool, household_id: &Uuid, user_id: &Uuid) -> Result<bool, ProfileError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles WHERE id = ? AND household_id = ?")
        .bind(user_id.to_string())
        .bind(household_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// Award a settled completion: points are added in place, the streak is set.
pub async fn apply_completion(
    pool: &SqlitePool,
    user_id: &Uuid,
    points: i64,
    new_streak: i64,
) -> Result<(), ProfileError> {
    let result = sqlx::query(
        "UPDATE profiles SET total_points = total_points + ?, current_streak = ? WHERE id = ?",
    )
    .bind(points)
    .bind(new_streak)
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ProfileError::NotFound);
    }

    Ok(())
}

/// Take back a completion. Points and streak never drop below zero.
pub async fn apply_reversal(pool: &SqlitePool, user_id: &Uuid, points: i64) -> Result<Profile, ProfileError> {
    let result = sqlx::query(
        r#"
        UPDATE profiles
        SET total_points = MAX(total_points - ?, 0),
            current_streak = MAX(current_streak - 1, 0)
        WHERE id = ?
        "#,
    )
    .bind(points)
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ProfileError::NotFound);
    }

    get_profile(pool, user_id).await?.ok_or(ProfileError::NotFound)
}

/// Household members ranked by points, ties broken by streak.
pub async fn get_leaderboard(pool: &SqlitePool, household_id: &Uuid) -> Result<Vec<LeaderboardEntry>, ProfileError> {
    let rows: Vec<ProfileRow> = sqlx::query_as(
        r#"
        SELECT * FROM profiles
        WHERE household_id = ?
        ORDER BY total_points DESC, current_streak DESC, display_name ASC
        "#,
    )
    .bind(household_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(rows.len());

    for (rank, row) in rows.iter().enumerate() {
        let tasks_completed = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM task_assignments a
            JOIN tasks t ON a.task_id = t.id
            WHERE t.household_id = ? AND a.completed_by = ? AND a.status = 'completed'
            "#,
        )
        .bind(household_id.to_string())
        .bind(&row.id)
        .fetch_one(pool)
        .await?;

        entries.push(LeaderboardEntry {
            rank: (rank + 1) as i32,
            profile: row.to_shared()?,
            tasks_completed,
        });
    }

    Ok(entries)
}
