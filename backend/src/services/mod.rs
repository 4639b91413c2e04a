pub mod assignments;
pub mod auth;
pub mod completion_gate;
pub mod households;
pub mod profiles;
pub mod rotation;
pub mod schedule;
pub mod settlement;
pub mod tasks;
