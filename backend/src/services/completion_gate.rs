use chrono::{NaiveDate, NaiveDateTime};
use shared::{CompletionCheck, Task};

/// Decide whether an assignment due on `due_date` may be completed at `now`
/// (household-local wall clock).
///
/// The earliest completion time only applies on the due date itself; overdue
/// and future assignments are never held back by it.
pub fn can_complete(task: &Task, due_date: NaiveDate, now: NaiveDateTime) -> CompletionCheck {
    let Some(earliest) = task.earliest_completion_time else {
        return CompletionCheck::allowed();
    };

    if due_date != now.date() {
        return CompletionCheck::allowed();
    }

    if now.time() >= earliest.as_naive_time() {
        CompletionCheck::allowed()
    } else {
        CompletionCheck::blocked(format!(
            "This task can only be completed after {} today.",
            earliest
        ))
    }
}
