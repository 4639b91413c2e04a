//! Points and streak arithmetic for completing and un-completing assignments.
//!
//! Everything here is pure; the assignment service feeds it the streak
//! history it looked up and persists the result.

use chrono::{NaiveDate, NaiveDateTime};
use shared::{FrequencyType, Task, TaskAssignment};
use thiserror::Error;

use crate::services::completion_gate;

pub const EARLY_BONUS: i64 = 2;
pub const MONTHLY_BONUS: i64 = 5;
pub const WEEKLY_BONUS: i64 = 2;
pub const STREAK_BONUS_PER_DAY: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("Assignment is already completed")]
    AlreadyCompleted,
    #[error("{0}")]
    CompletionLocked(String),
}

/// Outcome of a completion, before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub was_early: bool,
    pub base_points: i64,
    pub streak_bonus: i64,
    pub total_points: i64,
    pub new_streak: i64,
}

/// What an un-completion takes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversal {
    pub was_early: bool,
    pub base_points: i64,
    pub streak_bonus: i64,
    pub total_points: i64,
    pub new_streak: i64,
    /// False when the streak bonus had to be estimated from the current streak.
    pub exact: bool,
}

pub fn was_completed_early(completed_on: NaiveDate, due_date: NaiveDate) -> bool {
    completed_on < due_date
}

/// Rarer cadences are worth more.
pub fn cadence_bonus(frequency_type: Option<FrequencyType>) -> i64 {
    match frequency_type {
        Some(FrequencyType::Monthly) => MONTHLY_BONUS,
        Some(FrequencyType::Weekly) => WEEKLY_BONUS,
        Some(FrequencyType::Daily) | None => 0,
    }
}

pub fn base_points(task: &Task, was_early: bool) -> i64 {
    let early = if was_early { EARLY_BONUS } else { 0 };
    task.points_value
        .saturating_add(early)
        .saturating_add(cadence_bonus(task.frequency_type()))
}

pub fn next_streak(current_streak: i64, completed_yesterday: bool) -> i64 {
    if completed_yesterday {
        current_streak.saturating_add(1)
    } else {
        1
    }
}

pub fn streak_bonus(streak: i64) -> i64 {
    streak.saturating_mul(STREAK_BONUS_PER_DAY)
}

/// Settle a completion of `assignment` at `now` (household-local).
///
/// `completed_yesterday` tells whether the completer finished any assignment
/// on the previous local day.
pub fn settle_completion(
    task: &Task,
    assignment: &TaskAssignment,
    now: NaiveDateTime,
    current_streak: i64,
    completed_yesterday: bool,
) -> Result<Settlement, SettlementError> {
    if !assignment.is_pending() {
        return Err(SettlementError::AlreadyCompleted);
    }

    let check = completion_gate::can_complete(task, assignment.due_date, now);
    if !check.allowed {
        return Err(SettlementError::CompletionLocked(check.reason.unwrap_or_default()));
    }

    let was_early = was_completed_early(now.date(), assignment.due_date);
    let base_points = base_points(task, was_early);
    let new_streak = next_streak(current_streak, completed_yesterday);
    let streak_bonus = streak_bonus(new_streak);

    Ok(Settlement {
        was_early,
        base_points,
        streak_bonus,
        total_points: base_points.saturating_add(streak_bonus),
        new_streak,
    })
}

/// Work out what to take back when a completion made on `completed_on` is undone.
///
/// Uses the amounts stored at completion time when present. Older rows fall
/// back to the estimate `base + max(1, current_streak) * 5`.
pub fn reverse_completion(
    task: &Task,
    assignment: &TaskAssignment,
    completed_on: NaiveDate,
    current_streak: i64,
) -> Reversal {
    let was_early = was_completed_early(completed_on, assignment.due_date);
    let new_streak = current_streak.saturating_sub(1).max(0);

    match (assignment.awarded_points, assignment.awarded_streak_bonus) {
        (Some(total_points), Some(streak_bonus)) => Reversal {
            was_early,
            base_points: total_points.saturating_sub(streak_bonus),
            streak_bonus,
            total_points,
            new_streak,
            exact: true,
        },
        _ => {
            let base_points = base_points(task, was_early);
            let streak_bonus = streak_bonus(current_streak.max(1));
            Reversal {
                was_early,
                base_points,
                streak_bonus,
                total_points: base_points.saturating_add(streak_bonus),
                new_streak,
                exact: false,
            }
        }
    }
}
