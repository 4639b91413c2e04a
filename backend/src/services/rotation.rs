use shared::TaskParticipant;
use uuid::Uuid;

/// Active participants of a task in cycle order.
pub fn rotation_cycle(participants: &[TaskParticipant]) -> Vec<Uuid> {
    let mut active: Vec<&TaskParticipant> = participants.iter().filter(|p| p.is_active).collect();
    active.sort_by_key(|p| p.rotation_order);
    active.into_iter().map(|p| p.user_id).collect()
}

/// Whose turn follows `current`.
///
/// Wraps after the last participant. An empty cycle keeps `current`; a
/// `current` that left the rotation hands the turn to the first participant.
pub fn next_assignee(cycle: &[Uuid], current: Uuid) -> Uuid {
    match cycle {
        [] => current,
        [only] => *only,
        _ => match cycle.iter().position(|id| *id == current) {
            Some(index) => cycle[(index + 1) % cycle.len()],
            None => cycle[0],
        },
    }
}
