use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AssignmentRow, RowError};
use crate::services::profiles::{self, Actor, ProfileError};
use crate::services::schedule::{self, HouseholdClock};
use crate::services::settlement::{self, SettlementError};
use crate::services::tasks::{self as task_service, TaskError};
use crate::services::{completion_gate, rotation};
use shared::{
    AssignmentStateFilter, AssignmentStatus, AssignmentView, AssignmentWithTask, CompletionCheck,
    CompletionSummary, Task, TaskAssignment, UncompleteSummary, ValidationError,
};

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("Assignment not found")]
    NotFound,
    #[error("Assignment is already completed")]
    AlreadyCompleted,
    #[error("Assignment is not completed")]
    NotCompleted,
    #[error("Assignment is no longer pending")]
    NotPending,
    #[error("Assignment belongs to an archived task")]
    Archived,
    #[error("{0}")]
    CompletionLocked(String),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("{0}")]
    InvalidRow(#[from] RowError),
}

impl From<SettlementError> for AssignmentError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::AlreadyCompleted => AssignmentError::AlreadyCompleted,
            SettlementError::CompletionLocked(reason) => AssignmentError::CompletionLocked(reason),
        }
    }
}

// ============================================================================
// Storage helpers (also used inside task transactions)
// ============================================================================

pub async fn insert_assignment(
    conn: &mut SqliteConnection,
    task_id: &Uuid,
    assigned_to: &Uuid,
    due_datetime: DateTime<Utc>,
    due_date: NaiveDate,
    rotation_order: i64,
) -> Result<TaskAssignment, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO task_assignments (id, task_id, assigned_to, due_date, due_datetime, rotation_order, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(id.to_string())
    .bind(task_id.to_string())
    .bind(assigned_to.to_string())
    .bind(due_date)
    .bind(due_datetime)
    .bind(rotation_order)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(TaskAssignment {
        id,
        task_id: *task_id,
        assigned_to: *assigned_to,
        due_date,
        due_datetime: Some(due_datetime),
        rotation_order,
        status: AssignmentStatus::Pending,
        awarded_points: None,
        awarded_streak_bonus: None,
        created_at: now,
    })
}

/// Create the first pending assignment of a task: first participant in the
/// cycle, or `fallback` when the cycle is empty.
pub async fn seed_initial_assignment(
    conn: &mut SqliteConnection,
    task: &Task,
    cycle: &[Uuid],
    fallback: Uuid,
    clock: &HouseholdClock,
) -> Result<TaskAssignment, sqlx::Error> {
    let due_local = schedule::initial_due(task.recurrence.as_ref(), clock.local_now());
    let assignee = cycle.first().copied().unwrap_or(fallback);

    let assignment = insert_assignment(
        conn,
        &task.id,
        &assignee,
        clock.to_utc(due_local),
        due_local.date(),
        1,
    )
    .await?;

    log::info!(
        "Seeded assignment {} of task {} for {} due {}",
        assignment.id,
        task.id,
        assignee,
        due_local
    );

    Ok(assignment)
}

pub async fn count_pending(conn: &mut SqliteConnection, task_id: &Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM task_assignments WHERE task_id = ? AND status = 'pending'")
        .bind(task_id.to_string())
        .fetch_one(&mut *conn)
        .await
}

pub async fn fetch_pending_rows(pool: &SqlitePool, task_id: &Uuid) -> Result<Vec<AssignmentRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT * FROM task_assignments
        WHERE task_id = ? AND status = 'pending'
        ORDER BY due_date ASC, rotation_order ASC
        "#,
    )
    .bind(task_id.to_string())
    .fetch_all(pool)
    .await
}

pub async fn get_assignment(pool: &SqlitePool, assignment_id: &Uuid) -> Result<Option<TaskAssignment>, AssignmentError> {
    let row: Option<AssignmentRow> = sqlx::query_as("SELECT * FROM task_assignments WHERE id = ?")
        .bind(assignment_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.to_shared()).transpose()?)
}

/// Whether `user_id` settled any assignment on the given household-local day.
/// Archive bookkeeping does not count.
pub async fn completed_on_day(
    pool: &SqlitePool,
    user_id: &Uuid,
    clock: &HouseholdClock,
    day: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let (start, end) = schedule::local_day_bounds(clock.tz, day);

    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM task_assignments
        WHERE completed_by = ? AND status = 'completed'
          AND completed_at >= ? AND completed_at < ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Assignment plus its task, checked against the actor's household.
async fn load_for_actor(
    pool: &SqlitePool,
    actor: &Actor,
    assignment_id: &Uuid,
) -> Result<(TaskAssignment, Task), AssignmentError> {
    let assignment = get_assignment(pool, assignment_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    let task = task_service::get_task(pool, &assignment.task_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    if task.household_id != actor.household_id {
        return Err(AssignmentError::Forbidden("Assignment belongs to another household"));
    }

    Ok((assignment, task))
}

// ============================================================================
// Lifecycle operations
// ============================================================================

pub async fn check_completion(
    pool: &SqlitePool,
    actor: &Actor,
    assignment_id: &Uuid,
    clock: &HouseholdClock,
) -> Result<CompletionCheck, AssignmentError> {
    let (assignment, task) = load_for_actor(pool, actor, assignment_id).await?;

    if task.is_deleted() {
        return Ok(CompletionCheck::blocked("This task has been archived."));
    }
    if assignment.is_completed() {
        return Ok(CompletionCheck::blocked("This assignment is already completed."));
    }

    Ok(completion_gate::can_complete(&task, assignment.due_date, clock.local_now()))
}

/// Complete a pending assignment, award the completer and, for recurring
/// tasks, hand the next turn to whoever follows the original assignee.
///
/// The status change and the next assignment are written in one transaction.
/// Points and streak are applied afterwards; if that fails the completion
/// stands and `profile_updated` is false.
pub async fn complete_assignment(
    pool: &SqlitePool,
    actor: &Actor,
    assignment_id: &Uuid,
    clock: &HouseholdClock,
) -> Result<CompletionSummary, AssignmentError> {
    let (assignment, task) = load_for_actor(pool, actor, assignment_id).await?;

    if task.is_deleted() {
        return Err(AssignmentError::Archived);
    }

    match assignment.status {
        AssignmentStatus::Pending => {}
        AssignmentStatus::Completed { .. } => return Err(AssignmentError::AlreadyCompleted),
        AssignmentStatus::Archived { .. } => return Err(AssignmentError::Archived),
    }

    let profile = profiles::get_profile(pool, &actor.user_id)
        .await?
        .ok_or(ProfileError::NotFound)?;

    let yesterday = clock.today().pred_opt().unwrap_or(NaiveDate::MIN);
    let completed_yesterday = completed_on_day(pool, &actor.user_id, clock, yesterday).await?;

    let local_now = clock.local_now();
    let settled = settlement::settle_completion(
        &task,
        &assignment,
        local_now,
        profile.current_streak,
        completed_yesterday,
    )?;

    // Rotation continues from the original assignee, anchored at the old due instant
    let next = match task.recurrence.as_ref() {
        Some(recurrence) => {
            let participants = task_service::fetch_active_participants(pool, &task.id).await?;
            let cycle = rotation::rotation_cycle(&participants);
            if cycle.is_empty() {
                log::warn!("Task {} has no active participants, keeping assignee", task.id);
            }
            let assignee = rotation::next_assignee(&cycle, assignment.assigned_to);
            let anchor = schedule::assignment_anchor(assignment.due_date, assignment.due_datetime, clock.tz);
            let due_local = schedule::next_due_date(
                recurrence.frequency_type,
                recurrence.frequency_value,
                anchor,
                &recurrence.scheduled_days,
                recurrence.scheduled_time,
            );
            Some((assignee, due_local))
        }
        None => None,
    };

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE task_assignments
        SET status = 'completed', completed_at = ?, completed_by = ?,
            awarded_points = ?, awarded_streak_bonus = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(clock.now)
    .bind(actor.user_id.to_string())
    .bind(settled.total_points)
    .bind(settled.streak_bonus)
    .bind(assignment.id.to_string())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        // Someone else settled it first
        return Err(AssignmentError::AlreadyCompleted);
    }

    let next_assignment = match next {
        Some((assignee, due_local)) => Some(
            insert_assignment(
                &mut *tx,
                &task.id,
                &assignee,
                clock.to_utc(due_local),
                due_local.date(),
                assignment.rotation_order + 1,
            )
            .await?,
        ),
        None => None,
    };

    tx.commit().await?;

    let profile_updated =
        match profiles::apply_completion(pool, &actor.user_id, settled.total_points, settled.new_streak).await {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "Assignment {} completed but profile {} was not updated: {}",
                    assignment.id,
                    actor.user_id,
                    e
                );
                false
            }
        };

    log::info!(
        "Assignment {} of task {} completed by {} for {} points",
        assignment.id,
        task.id,
        actor.user_id,
        settled.total_points
    );

    let helped_out = actor.user_id != assignment.assigned_to;
    let completed = TaskAssignment {
        status: AssignmentStatus::Completed {
            completed_by: actor.user_id,
            completed_at: clock.now,
        },
        awarded_points: Some(settled.total_points),
        awarded_streak_bonus: Some(settled.streak_bonus),
        ..assignment
    };

    Ok(CompletionSummary {
        assignment: completed,
        task_title: task.title,
        base_points: settled.base_points,
        streak_bonus: settled.streak_bonus,
        points_awarded: settled.total_points,
        new_streak: settled.new_streak,
        was_early: settled.was_early,
        helped_out,
        next_assignment,
        profile_updated,
    })
}

/// Undo a completion. Only the completer or a household admin may do this.
/// The assignment created for the next turn stays in place.
pub async fn uncomplete_assignment(
    pool: &SqlitePool,
    actor: &Actor,
    assignment_id: &Uuid,
    clock: &HouseholdClock,
) -> Result<UncompleteSummary, AssignmentError> {
    let (assignment, task) = load_for_actor(pool, actor, assignment_id).await?;

    // Completions on an archived task are final
    if task.is_deleted() {
        return Err(AssignmentError::Archived);
    }

    let (completed_by, completed_at) = match assignment.status {
        AssignmentStatus::Completed {
            completed_by,
            completed_at,
        } => (completed_by, completed_at),
        AssignmentStatus::Pending => return Err(AssignmentError::NotCompleted),
        AssignmentStatus::Archived { .. } => return Err(AssignmentError::Archived),
    };

    if completed_by != actor.user_id && !actor.is_admin() {
        return Err(AssignmentError::Forbidden(
            "Only the person who completed this task or an admin can undo it",
        ));
    }

    let current_streak = profiles::get_profile(pool, &completed_by)
        .await?
        .map(|p| p.current_streak)
        .unwrap_or(0);

    let reversal = settlement::reverse_completion(
        &task,
        &assignment,
        clock.local_date_of(completed_at),
        current_streak,
    );

    let result = sqlx::query(
        r#"
        UPDATE task_assignments
        SET status = 'pending', completed_at = NULL, completed_by = NULL,
            awarded_points = NULL, awarded_streak_bonus = NULL
        WHERE id = ? AND status = 'completed'
        "#,
    )
    .bind(assignment.id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AssignmentError::NotCompleted);
    }

    let (new_streak, profile_updated) =
        match profiles::apply_reversal(pool, &completed_by, reversal.total_points).await {
            Ok(profile) => (profile.current_streak, true),
            Err(e) => {
                log::error!(
                    "Assignment {} un-completed but profile {} was not updated: {}",
                    assignment.id,
                    completed_by,
                    e
                );
                (reversal.new_streak, false)
            }
        };

    if !reversal.exact {
        log::warn!(
            "Assignment {} had no stored award, reversed an estimated {} points",
            assignment.id,
            reversal.total_points
        );
    }

    log::info!("Assignment {} un-completed by {}", assignment.id, actor.user_id);

    Ok(UncompleteSummary {
        assignment: TaskAssignment {
            status: AssignmentStatus::Pending,
            awarded_points: None,
            awarded_streak_bonus: None,
            ..assignment
        },
        points_removed: reversal.total_points,
        new_streak,
        was_early: reversal.was_early,
        exact_reversal: reversal.exact,
        profile_updated,
    })
}

/// Admin override: hand a pending assignment to another member. Rotation
/// order and participants are left alone.
pub async fn reassign_assignment(
    pool: &SqlitePool,
    actor: &Actor,
    assignment_id: &Uuid,
    assigned_to: &Uuid,
) -> Result<TaskAssignment, AssignmentError> {
    if !actor.is_admin() {
        return Err(AssignmentError::Forbidden("Only admins can reassign tasks"));
    }

    let (assignment, _task) = load_for_actor(pool, actor, assignment_id).await?;

    if !assignment.is_pending() {
        return Err(AssignmentError::NotPending);
    }

    if !profiles::is_household_member(pool, &actor.household_id, assigned_to).await? {
        return Err(ValidationError::NotInHousehold(*assigned_to).into());
    }

    let result = sqlx::query("UPDATE task_assignments SET assigned_to = ? WHERE id = ? AND status = 'pending'")
        .bind(assigned_to.to_string())
        .bind(assignment.id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AssignmentError::NotPending);
    }

    log::info!(
        "Assignment {} reassigned from {} to {} by {}",
        assignment.id,
        assignment.assigned_to,
        assigned_to,
        actor.user_id
    );

    Ok(TaskAssignment {
        assigned_to: *assigned_to,
        ..assignment
    })
}

// ============================================================================
// Listings
// ============================================================================

fn state_clause(filter: AssignmentStateFilter) -> &'static str {
    match filter {
        AssignmentStateFilter::Pending => "AND a.status = 'pending'",
        AssignmentStateFilter::Completed => "AND a.status = 'completed'",
        AssignmentStateFilter::All => "",
    }
}

/// Pair assignments with their (active) tasks of one household.
async fn attach_tasks(
    pool: &SqlitePool,
    household_id: &Uuid,
    rows: Vec<AssignmentRow>,
) -> Result<Vec<AssignmentWithTask>, AssignmentError> {
    let tasks: HashMap<Uuid, Task> = task_service::list_tasks(pool, household_id)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let assignment = row.to_shared()?;
        if let Some(task) = tasks.get(&assignment.task_id) {
            result.push(AssignmentWithTask {
                assignment,
                task: task.clone(),
            });
        }
    }

    Ok(result)
}

/// Assignments of active tasks in a household, soonest first.
pub async fn list_household_assignments(
    pool: &SqlitePool,
    household_id: &Uuid,
    filter: AssignmentStateFilter,
) -> Result<Vec<AssignmentWithTask>, AssignmentError> {
    let query = format!(
        r#"
        SELECT a.* FROM task_assignments a
        JOIN tasks t ON a.task_id = t.id
        WHERE t.household_id = ? AND t.is_deleted = 0 {}
        ORDER BY a.due_date ASC, a.due_datetime ASC
        "#,
        state_clause(filter)
    );

    let rows: Vec<AssignmentRow> = sqlx::query_as(&query)
        .bind(household_id.to_string())
        .fetch_all(pool)
        .await?;

    attach_tasks(pool, household_id, rows).await
}

pub async fn list_user_assignments(
    pool: &SqlitePool,
    household_id: &Uuid,
    user_id: &Uuid,
    filter: AssignmentStateFilter,
) -> Result<Vec<AssignmentWithTask>, AssignmentError> {
    let query = format!(
        r#"
        SELECT a.* FROM task_assignments a
        JOIN tasks t ON a.task_id = t.id
        WHERE t.household_id = ? AND t.is_deleted = 0 AND a.assigned_to = ? {}
        ORDER BY a.due_date ASC, a.due_datetime ASC
        "#,
        state_clause(filter)
    );

    let rows: Vec<AssignmentRow> = sqlx::query_as(&query)
        .bind(household_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(pool)
        .await?;

    attach_tasks(pool, household_id, rows).await
}

/// Pending assignments of one task, including tasks that have been archived.
pub async fn list_pending_for_task(
    pool: &SqlitePool,
    actor: &Actor,
    task_id: &Uuid,
) -> Result<Vec<TaskAssignment>, AssignmentError> {
    let task = task_service::get_task(pool, task_id)
        .await?
        .ok_or(AssignmentError::NotFound)?;

    if task.household_id != actor.household_id {
        return Err(AssignmentError::Forbidden("Task belongs to another household"));
    }

    let rows = fetch_pending_rows(pool, task_id).await?;
    Ok(rows.iter().map(|r| r.to_shared()).collect::<Result<_, _>>()?)
}

/// The actor's own assignments for one view, computed against the household's
/// current day.
pub async fn assignment_view(
    pool: &SqlitePool,
    actor: &Actor,
    view: AssignmentView,
    clock: &HouseholdClock,
) -> Result<Vec<AssignmentWithTask>, AssignmentError> {
    let condition = match view {
        AssignmentView::DueToday => "a.assigned_to = ? AND a.status = 'pending' AND a.due_date = ?",
        AssignmentView::Upcoming => "a.assigned_to = ? AND a.status = 'pending' AND a.due_date > ?",
        AssignmentView::Overdue => "a.assigned_to = ? AND a.status = 'pending' AND a.due_date < ?",
        AssignmentView::Completed => "a.completed_by = ? AND a.status = 'completed'",
    };
    let order = match view {
        AssignmentView::Completed => "a.completed_at DESC",
        _ => "a.due_date ASC, a.due_datetime ASC",
    };

    let query = format!(
        r#"
        SELECT a.* FROM task_assignments a
        JOIN tasks t ON a.task_id = t.id
        WHERE t.household_id = ? AND t.is_deleted = 0 AND {}
        ORDER BY {}
        "#,
        condition, order
    );

    let mut query = sqlx::query_as::<_, AssignmentRow>(&query)
        .bind(actor.household_id.to_string())
        .bind(actor.user_id.to_string());
    if view != AssignmentView::Completed {
        query = query.bind(clock.today());
    }

    let rows = query.fetch_all(pool).await?;

    attach_tasks(pool, &actor.household_id, rows).await
}
