use std::collections::HashSet;

use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{encode_scheduled_days, ParticipantRow, RowError, TaskRow};
use crate::services::assignments as assignment_service;
use crate::services::profiles::{self, Actor, ProfileError};
use crate::services::schedule::HouseholdClock;
use shared::{
    build_recurrence, ArchiveSummary, CreateTaskRequest, Recurrence, Task, TaskAssignment, TaskDetails,
    TaskParticipant, TaskStatus, UpdateTaskRequest, ValidationError, DEFAULT_CATEGORY,
    DEFAULT_POINTS_VALUE,
};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound,
    #[error("Task has been archived")]
    Archived,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("{0}")]
    InvalidRow(#[from] RowError),
}

/// Drop duplicate participants (first occurrence wins) and reject anyone
/// outside the household.
pub fn normalize_participants(requested: &[Uuid], members: &HashSet<Uuid>) -> Result<Vec<Uuid>, ValidationError> {
    let mut seen = HashSet::new();
    let mut participants = Vec::with_capacity(requested.len());

    for user_id in requested {
        if !members.contains(user_id) {
            return Err(ValidationError::NotInHousehold(*user_id));
        }
        if seen.insert(*user_id) {
            participants.push(*user_id);
        }
    }

    Ok(participants)
}

async fn insert_participants(
    conn: &mut SqliteConnection,
    task_id: &Uuid,
    user_ids: &[Uuid],
) -> Result<Vec<TaskParticipant>, sqlx::Error> {
    let mut participants = Vec::with_capacity(user_ids.len());

    for (index, user_id) in user_ids.iter().enumerate() {
        let participant = TaskParticipant {
            id: Uuid::new_v4(),
            task_id: *task_id,
            user_id: *user_id,
            rotation_order: index as i64 + 1,
            is_active: true,
        };

        sqlx::query(
            r#"
            INSERT INTO task_participants (id, task_id, user_id, rotation_order, is_active)
            VALUES (?, ?, ?, ?, 1)
            "#,
        )
        .bind(participant.id.to_string())
        .bind(task_id.to_string())
        .bind(user_id.to_string())
        .bind(participant.rotation_order)
        .execute(&mut *conn)
        .await?;

        participants.push(participant);
    }

    Ok(participants)
}

/// Replace the rotation of a task wholesale (orders restart at 1) and, for a
/// recurring task left without pending work, seed a fresh assignment.
async fn replace_participants(
    conn: &mut SqliteConnection,
    task: &Task,
    user_ids: &[Uuid],
    actor: &Actor,
    clock: &HouseholdClock,
) -> Result<Option<TaskAssignment>, sqlx::Error> {
    sqlx::query("DELETE FROM task_participants WHERE task_id = ?")
        .bind(task.id.to_string())
        .execute(&mut *conn)
        .await?;

    insert_participants(conn, &task.id, user_ids).await?;

    if !task.is_recurring() || assignment_service::count_pending(conn, &task.id).await? > 0 {
        return Ok(None);
    }

    let fallback = task.created_by.unwrap_or(actor.user_id);
    let seeded = assignment_service::seed_initial_assignment(conn, task, user_ids, fallback, clock).await?;
    Ok(Some(seeded))
}

fn recurrence_columns(recurrence: Option<&Recurrence>) -> (bool, Option<&'static str>, i64, Option<String>, Option<String>) {
    match recurrence {
        Some(r) => (
            true,
            Some(r.frequency_type.as_str()),
            i64::from(r.frequency_value),
            encode_scheduled_days(&r.scheduled_days),
            r.scheduled_time.map(|t| t.to_string()),
        ),
        None => (false, None, 1, None, None),
    }
}

/// Create a task with its rotation and first assignment.
pub async fn create_task(
    pool: &SqlitePool,
    actor: &Actor,
    request: &CreateTaskRequest,
    clock: &HouseholdClock,
) -> Result<TaskDetails, TaskError> {
    let recurrence = request.validate()?;
    let members = profiles::household_member_ids(pool, &actor.household_id).await?;
    let participant_ids = normalize_participants(&request.participants, &members)?;

    let now = clock.now;
    let task = Task {
        id: Uuid::new_v4(),
        household_id: actor.household_id,
        title: request.title.trim().to_string(),
        description: request.description.clone(),
        category: request
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        recurrence,
        earliest_completion_time: request.earliest_completion_time,
        points_value: request.points_value.unwrap_or(DEFAULT_POINTS_VALUE),
        notify_on_incomplete: request.notify_on_incomplete.unwrap_or(false),
        created_by: Some(actor.user_id),
        status: TaskStatus::Active,
        created_at: now,
        updated_at: now,
    };

    let (is_recurring, frequency_type, frequency_value, scheduled_days, scheduled_time) =
        recurrence_columns(task.recurrence.as_ref());

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO tasks (id, household_id, title, description, category, is_recurring, frequency_type,
                           frequency_value, scheduled_days, scheduled_time, earliest_completion_time,
                           points_value, notify_on_incomplete, created_by, is_deleted, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(task.id.to_string())
    .bind(task.household_id.to_string())
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.category)
    .bind(is_recurring)
    .bind(frequency_type)
    .bind(frequency_value)
    .bind(scheduled_days)
    .bind(scheduled_time)
    .bind(task.earliest_completion_time.map(|t| t.to_string()))
    .bind(task.points_value)
    .bind(task.notify_on_incomplete)
    .bind(actor.user_id.to_string())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let participants = insert_participants(&mut *tx, &task.id, &participant_ids).await?;
    let initial =
        assignment_service::seed_initial_assignment(&mut *tx, &task, &participant_ids, actor.user_id, clock).await?;

    tx.commit().await?;

    log::info!(
        "Task {} '{}' created by {} with {} participants",
        task.id,
        task.title,
        actor.user_id,
        participants.len()
    );

    Ok(TaskDetails {
        task,
        participants,
        pending_assignments: vec![initial],
    })
}

/// Any task by id, archived ones included.
pub async fn get_task(pool: &SqlitePool, task_id: &Uuid) -> Result<Option<Task>, TaskError> {
    let task: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(task.map(|t| t.to_shared()).transpose()?)
}

/// Active tasks of a household, newest first.
pub async fn list_tasks(pool: &SqlitePool, household_id: &Uuid) -> Result<Vec<Task>, TaskError> {
    let tasks: Vec<TaskRow> = sqlx::query_as(
        "SELECT * FROM tasks WHERE household_id = ? AND is_deleted = 0 ORDER BY created_at DESC",
    )
    .bind(household_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(tasks.iter().map(|t| t.to_shared()).collect::<Result<_, _>>()?)
}

pub async fn fetch_active_participants(pool: &SqlitePool, task_id: &Uuid) -> Result<Vec<TaskParticipant>, TaskError> {
    let rows: Vec<ParticipantRow> = sqlx::query_as(
        "SELECT * FROM task_participants WHERE task_id = ? AND is_active = 1 ORDER BY rotation_order ASC",
    )
    .bind(task_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|r| r.to_shared()).collect::<Result<_, _>>()?)
}

async fn load_details(pool: &SqlitePool, task: Task) -> Result<TaskDetails, TaskError> {
    let participants = fetch_active_participants(pool, &task.id).await?;
    let pending_assignments = assignment_service::fetch_pending_rows(pool, &task.id)
        .await?
        .iter()
        .map(|r| r.to_shared())
        .collect::<Result<_, _>>()?;

    Ok(TaskDetails {
        task,
        participants,
        pending_assignments,
    })
}

/// Task with participants and pending assignments, visible to its household.
pub async fn get_task_details(pool: &SqlitePool, actor: &Actor, task_id: &Uuid) -> Result<TaskDetails, TaskError> {
    let task = get_task(pool, task_id).await?.ok_or(TaskError::NotFound)?;

    if task.household_id != actor.household_id {
        return Err(TaskError::NotFound);
    }

    load_details(pool, task).await
}

/// Load a task the actor is allowed to change.
async fn load_for_edit(pool: &SqlitePool, actor: &Actor, task_id: &Uuid) -> Result<Task, TaskError> {
    let task = get_task(pool, task_id).await?.ok_or(TaskError::NotFound)?;

    if task.household_id != actor.household_id {
        return Err(TaskError::NotFound);
    }
    if !actor.can_modify_task(&task) {
        return Err(TaskError::Forbidden("Only the creator or an admin can change this task"));
    }
    if task.is_deleted() {
        return Err(TaskError::Archived);
    }

    Ok(task)
}

/// Merge a partial update into `task`. Frequency fields not mentioned keep
/// their current values; turning recurrence off drops them.
pub fn apply_update(task: &Task, request: &UpdateTaskRequest) -> Result<Task, ValidationError> {
    let mut updated = task.clone();

    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        updated.title = title.trim().to_string();
    }
    if let Some(description) = &request.description {
        updated.description = description.clone();
    }
    if let Some(category) = &request.category {
        updated.category = if category.trim().is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.clone()
        };
    }
    if let Some(points_value) = request.points_value {
        updated.points_value = shared::validate_points_value(points_value)?;
    }
    if let Some(notify) = request.notify_on_incomplete {
        updated.notify_on_incomplete = notify;
    }
    if let Some(earliest) = request.earliest_completion_time {
        updated.earliest_completion_time = earliest;
    }

    let current = task.recurrence.as_ref();
    let is_recurring = request.is_recurring.unwrap_or(current.is_some());
    updated.recurrence = build_recurrence(
        is_recurring,
        request.frequency_type.or(current.map(|r| r.frequency_type)),
        request.frequency_value.or(current.map(|r| r.frequency_value)),
        request
            .scheduled_days
            .clone()
            .or_else(|| current.map(|r| r.scheduled_days.clone())),
        match request.scheduled_time {
            Some(time) => time,
            None => current.and_then(|r| r.scheduled_time),
        },
    )?;

    Ok(updated)
}

pub async fn update_task(
    pool: &SqlitePool,
    actor: &Actor,
    task_id: &Uuid,
    request: &UpdateTaskRequest,
    clock: &HouseholdClock,
) -> Result<TaskDetails, TaskError> {
    let task = load_for_edit(pool, actor, task_id).await?;
    let mut updated = apply_update(&task, request)?;
    updated.updated_at = clock.now;

    let participant_ids = match &request.participants {
        Some(requested) => {
            let members = profiles::household_member_ids(pool, &actor.household_id).await?;
            Some(normalize_participants(requested, &members)?)
        }
        None => None,
    };

    let (is_recurring, frequency_type, frequency_value, scheduled_days, scheduled_time) =
        recurrence_columns(updated.recurrence.as_ref());

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?, description = ?, category = ?, is_recurring = ?, frequency_type = ?,
            frequency_value = ?, scheduled_days = ?, scheduled_time = ?, earliest_completion_time = ?,
            points_value = ?, notify_on_incomplete = ?, updated_at = ?
        WHERE id = ? AND is_deleted = 0
        "#,
    )
    .bind(&updated.title)
    .bind(&updated.description)
    .bind(&updated.category)
    .bind(is_recurring)
    .bind(frequency_type)
    .bind(frequency_value)
    .bind(scheduled_days)
    .bind(scheduled_time)
    .bind(updated.earliest_completion_time.map(|t| t.to_string()))
    .bind(updated.points_value)
    .bind(updated.notify_on_incomplete)
    .bind(updated.updated_at)
    .bind(task_id.to_string())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(TaskError::Archived);
    }

    if let Some(participant_ids) = &participant_ids {
        replace_participants(&mut *tx, &updated, participant_ids, actor, clock).await?;
    }

    tx.commit().await?;

    log::info!("Task {} updated by {}", task_id, actor.user_id);

    load_details(pool, updated).await
}

pub async fn update_participants(
    pool: &SqlitePool,
    actor: &Actor,
    task_id: &Uuid,
    requested: &[Uuid],
    clock: &HouseholdClock,
) -> Result<TaskDetails, TaskError> {
    let task = load_for_edit(pool, actor, task_id).await?;
    let members = profiles::household_member_ids(pool, &actor.household_id).await?;
    let participant_ids = normalize_participants(requested, &members)?;

    let mut tx = pool.begin().await?;
    let seeded = replace_participants(&mut *tx, &task, &participant_ids, actor, clock).await?;
    tx.commit().await?;

    log::info!(
        "Task {} rotation replaced by {} ({} participants{})",
        task.id,
        actor.user_id,
        participant_ids.len(),
        if seeded.is_some() { ", reseeded" } else { "" }
    );

    load_details(pool, task).await
}

/// Soft-delete a task. Its pending assignments are closed as archive
/// bookkeeping: stamped with the actor, no points, no next turn.
pub async fn archive_task(
    pool: &SqlitePool,
    actor: &Actor,
    task_id: &Uuid,
    clock: &HouseholdClock,
) -> Result<ArchiveSummary, TaskError> {
    let task = load_for_edit(pool, actor, task_id).await?;
    let now = clock.now;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE tasks SET is_deleted = 1, deleted_at = ?, deleted_by = ?, updated_at = ?
        WHERE id = ? AND is_deleted = 0
        "#,
    )
    .bind(now)
    .bind(actor.user_id.to_string())
    .bind(now)
    .bind(task_id.to_string())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(TaskError::Archived);
    }

    let archived = sqlx::query(
        r#"
        UPDATE task_assignments SET status = 'archived', completed_at = ?, completed_by = ?
        WHERE task_id = ? AND status = 'pending'
        "#,
    )
    .bind(now)
    .bind(actor.user_id.to_string())
    .bind(task_id.to_string())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    log::info!(
        "Task {} archived by {}, {} pending assignments closed",
        task_id,
        actor.user_id,
        archived
    );

    Ok(ArchiveSummary {
        task: Task {
            status: TaskStatus::Deleted {
                deleted_by: actor.user_id,
                deleted_at: now,
            },
            updated_at: now,
            ..task
        },
        archived_assignments: archived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use chrono::{DateTime, TimeZone, Utc};
    use shared::{FrequencyType, Role, TimeOfDay};

    // 2024-01-15 is a Monday
    fn monday_at(hour: u32) -> HouseholdClock {
        clock_at(Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap())
    }

    fn clock_at(now: DateTime<Utc>) -> HouseholdClock {
        HouseholdClock::new(now, chrono_tz::UTC)
    }

    fn request(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: None,
            category: None,
            is_recurring: false,
            frequency_type: None,
            frequency_value: None,
            scheduled_days: None,
            scheduled_time: None,
            earliest_completion_time: None,
            points_value: None,
            notify_on_incomplete: None,
            participants: vec![],
        }
    }

    struct Household {
        pool: SqlitePool,
        admin: Actor,
        alice: Actor,
        bob: Actor,
    }

    async fn household() -> Household {
        let pool = test_pool().await;
        let household_id = insert_household(&pool, "UTC").await;
        let admin = insert_profile(&pool, Some(household_id), "Admin", Role::Admin).await;
        let alice = insert_profile(&pool, Some(household_id), "Alice", Role::Member).await;
        let bob = insert_profile(&pool, Some(household_id), "Bob", Role::Member).await;

        let actor = |user_id, role| Actor {
            user_id,
            household_id,
            role,
        };

        Household {
            admin: actor(admin, Role::Admin),
            alice: actor(alice, Role::Member),
            bob: actor(bob, Role::Member),
            pool,
        }
    }

    #[test]
    fn test_normalize_participants() {
        let (a, b, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let members: HashSet<Uuid> = [a, b].into_iter().collect();

        assert_eq!(normalize_participants(&[b, a, b], &members).unwrap(), vec![b, a]);
        assert_eq!(
            normalize_participants(&[a, outsider], &members),
            Err(ValidationError::NotInHousehold(outsider))
        );
        assert!(normalize_participants(&[], &members).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_one_off_task_defaults() {
        let h = household().await;
        let details = create_task(&h.pool, &h.alice, &request("  Buy milk "), &monday_at(8))
            .await
            .unwrap();

        assert_eq!(details.task.title, "Buy milk");
        assert_eq!(details.task.category, "general");
        assert_eq!(details.task.points_value, 10);
        assert!(details.participants.is_empty());

        let assignment = &details.pending_assignments[0];
        assert_eq!(assignment.assigned_to, h.alice.user_id);
        assert_eq!(assignment.due_date, chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(
            assignment.due_datetime,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap())
        );
    }

    #[tokio::test]
    async fn test_create_recurring_task_with_rotation() {
        let h = household().await;
        let mut req = request("Take out trash");
        req.is_recurring = true;
        req.frequency_type = Some(FrequencyType::Weekly);
        req.scheduled_days = Some(vec![1]);
        req.participants = vec![h.alice.user_id, h.bob.user_id];

        let details = create_task(&h.pool, &h.admin, &req, &monday_at(8)).await.unwrap();

        assert_eq!(details.participants.len(), 2);
        assert_eq!(details.participants[0].user_id, h.alice.user_id);
        assert_eq!(details.participants[0].rotation_order, 1);
        assert_eq!(details.participants[1].rotation_order, 2);
        assert_eq!(details.pending_assignments[0].assigned_to, h.alice.user_id);

        let stored = get_task_details(&h.pool, &h.bob, &details.task.id).await.unwrap();
        assert_eq!(stored.pending_assignments.len(), 1);
        assert_eq!(stored.task.frequency_type(), Some(FrequencyType::Weekly));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_requests() {
        let h = household().await;

        let result = create_task(&h.pool, &h.alice, &request(""), &monday_at(8)).await;
        assert!(matches!(result, Err(TaskError::Validation(ValidationError::MissingTitle))));

        let mut req = request("Dust");
        req.participants = vec![Uuid::new_v4()];
        let result = create_task(&h.pool, &h.alice, &req, &monday_at(8)).await;
        assert!(matches!(result, Err(TaskError::Validation(ValidationError::NotInHousehold(_)))));

        assert!(list_tasks(&h.pool, &h.alice.household_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_points_value_is_bounded() {
        let h = household().await;

        let mut req = request("Clean gutters");
        req.points_value = Some(i64::MAX);
        let result = create_task(&h.pool, &h.admin, &req, &monday_at(8)).await;
        assert!(matches!(result, Err(TaskError::Validation(ValidationError::InvalidPointsValue))));

        let created = create_task(&h.pool, &h.admin, &request("Clean gutters"), &monday_at(8)).await.unwrap();
        let update = UpdateTaskRequest {
            points_value: Some(shared::MAX_POINTS_VALUE + 1),
            ..Default::default()
        };
        assert_eq!(apply_update(&created.task, &update), Err(ValidationError::InvalidPointsValue));
        let result = update_task(&h.pool, &h.admin, &created.task.id, &update, &monday_at(9)).await;
        assert!(matches!(result, Err(TaskError::Validation(ValidationError::InvalidPointsValue))));
    }

    #[tokio::test]
    async fn test_update_requires_creator_or_admin() {
        let h = household().await;
        let created = create_task(&h.pool, &h.alice, &request("Dishes"), &monday_at(8)).await.unwrap();

        let update = UpdateTaskRequest {
            title: Some("Dishes and pans".to_string()),
            ..Default::default()
        };

        let result = update_task(&h.pool, &h.bob, &created.task.id, &update, &monday_at(9)).await;
        assert!(matches!(result, Err(TaskError::Forbidden(_))));

        let details = update_task(&h.pool, &h.admin, &created.task.id, &update, &monday_at(9))
            .await
            .unwrap();
        assert_eq!(details.task.title, "Dishes and pans");
    }

    #[tokio::test]
    async fn test_update_merges_recurrence_fields() {
        let h = household().await;
        let mut req = request("Laundry");
        req.is_recurring = true;
        req.frequency_type = Some(FrequencyType::Weekly);
        req.scheduled_days = Some(vec![6]);
        req.scheduled_time = Some(TimeOfDay::new(10, 0).unwrap());
        let created = create_task(&h.pool, &h.alice, &req, &monday_at(8)).await.unwrap();

        let update = UpdateTaskRequest {
            frequency_value: Some(2),
            earliest_completion_time: Some(Some(TimeOfDay::new(8, 0).unwrap())),
            ..Default::default()
        };
        let details = update_task(&h.pool, &h.alice, &created.task.id, &update, &monday_at(9))
            .await
            .unwrap();

        let recurrence = details.task.recurrence.unwrap();
        assert_eq!(recurrence.frequency_value, 2);
        assert_eq!(recurrence.scheduled_days, vec![6]);
        assert_eq!(recurrence.scheduled_time, Some(TimeOfDay::new(10, 0).unwrap()));
        assert_eq!(details.task.earliest_completion_time, Some(TimeOfDay::new(8, 0).unwrap()));

        let update = UpdateTaskRequest {
            is_recurring: Some(false),
            ..Default::default()
        };
        let details = update_task(&h.pool, &h.alice, &created.task.id, &update, &monday_at(9))
            .await
            .unwrap();
        assert!(details.task.recurrence.is_none());

        let stored = get_task(&h.pool, &created.task.id).await.unwrap().unwrap();
        assert!(stored.recurrence.is_none());
    }

    #[tokio::test]
    async fn test_update_participants_reseeds_idle_recurring_task() {
        let h = household().await;
        let mut req = request("Water plants");
        req.is_recurring = true;
        req.frequency_type = Some(FrequencyType::Daily);
        req.participants = vec![h.alice.user_id];
        let created = create_task(&h.pool, &h.admin, &req, &monday_at(8)).await.unwrap();

        // Clear pending work so the task is idle
        sqlx::query("DELETE FROM task_assignments WHERE task_id = ?")
            .bind(created.task.id.to_string())
            .execute(&h.pool)
            .await
            .unwrap();

        let details = update_participants(
            &h.pool,
            &h.admin,
            &created.task.id,
            &[h.bob.user_id, h.alice.user_id, h.bob.user_id],
            &monday_at(12),
        )
        .await
        .unwrap();

        let order: Vec<Uuid> = details.participants.iter().map(|p| p.user_id).collect();
        assert_eq!(order, vec![h.bob.user_id, h.alice.user_id]);
        assert_eq!(details.pending_assignments.len(), 1);
        assert_eq!(details.pending_assignments[0].assigned_to, h.bob.user_id);

        // Not idle any more: replacing again does not add a second assignment
        let details = update_participants(&h.pool, &h.admin, &created.task.id, &[h.alice.user_id], &monday_at(13))
            .await
            .unwrap();
        assert_eq!(details.pending_assignments.len(), 1);
        assert_eq!(details.participants.len(), 1);
        assert_eq!(details.participants[0].user_id, h.alice.user_id);
        assert_eq!(details.participants[0].rotation_order, 1);
    }

    #[tokio::test]
    async fn test_archive_closes_pending_assignments() {
        let h = household().await;
        let mut req = request("Clean fridge");
        req.is_recurring = true;
        req.frequency_type = Some(FrequencyType::Monthly);
        req.participants = vec![h.alice.user_id, h.bob.user_id];
        let created = create_task(&h.pool, &h.alice, &req, &monday_at(8)).await.unwrap();

        // A second pending assignment
        let mut conn = h.pool.acquire().await.unwrap();
        assignment_service::insert_assignment(
            &mut conn,
            &created.task.id,
            &h.bob.user_id,
            Utc.with_ymd_and_hms(2024, 2, 15, 9, 0, 0).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            2,
        )
        .await
        .unwrap();
        drop(conn);

        let summary = archive_task(&h.pool, &h.admin, &created.task.id, &monday_at(10))
            .await
            .unwrap();
        assert_eq!(summary.archived_assignments, 2);
        assert!(summary.task.is_deleted());

        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT status, completed_by FROM task_assignments WHERE task_id = ?")
                .bind(created.task.id.to_string())
                .fetch_all(&h.pool)
                .await
                .unwrap();
        assert_eq!(rows.len(), 2);
        for (status, completed_by) in rows {
            assert_eq!(status, "archived");
            assert_eq!(completed_by, Some(h.admin.user_id.to_string()));
        }

        // No gamification changes
        for user in [h.admin.user_id, h.alice.user_id, h.bob.user_id] {
            let profile = profiles::get_profile(&h.pool, &user).await.unwrap().unwrap();
            assert_eq!(profile.total_points, 0);
            assert_eq!(profile.current_streak, 0);
        }

        // Gone from the active list, still retrievable by id
        assert!(list_tasks(&h.pool, &h.admin.household_id).await.unwrap().is_empty());
        let details = get_task_details(&h.pool, &h.bob, &created.task.id).await.unwrap();
        assert!(details.task.is_deleted());
        assert!(details.pending_assignments.is_empty());

        // Archived tasks are frozen
        let result = archive_task(&h.pool, &h.admin, &created.task.id, &monday_at(11)).await;
        assert!(matches!(result, Err(TaskError::Archived)));
        let result = update_participants(&h.pool, &h.admin, &created.task.id, &[], &monday_at(11)).await;
        assert!(matches!(result, Err(TaskError::Archived)));
    }

    #[tokio::test]
    async fn test_archive_requires_creator_or_admin() {
        let h = household().await;
        let created = create_task(&h.pool, &h.alice, &request("Sweep"), &monday_at(8)).await.unwrap();

        let result = archive_task(&h.pool, &h.bob, &created.task.id, &monday_at(9)).await;
        assert!(matches!(result, Err(TaskError::Forbidden(_))));

        archive_task(&h.pool, &h.alice, &created.task.id, &monday_at(9)).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_tasks_newest_first() {
        let h = household().await;
        let first = create_task(&h.pool, &h.alice, &request("First"), &monday_at(8)).await.unwrap();
        let second = create_task(&h.pool, &h.alice, &request("Second"), &monday_at(9)).await.unwrap();

        let tasks = list_tasks(&h.pool, &h.alice.household_id).await.unwrap();
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.task.id, first.task.id]);
    }
}
