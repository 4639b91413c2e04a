use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

pub mod assignment;
pub mod household;
pub mod participant;
pub mod profile;
pub mod task;

pub use assignment::*;
pub use household::*;
pub use participant::*;
pub use profile::*;
pub use task::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// A stored value that does not decode into its domain type.
#[derive(Debug, Error)]
#[error("Invalid value '{value}' in column {column}")]
pub struct RowError {
    pub column: &'static str,
    pub value: String,
}

impl RowError {
    pub fn new(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

pub(crate) fn parse_uuid(column: &'static str, value: &str) -> Result<Uuid, RowError> {
    Uuid::parse_str(value).map_err(|_| RowError::new(column, value))
}

pub(crate) fn parse_optional_uuid(column: &'static str, value: Option<&str>) -> Result<Option<Uuid>, RowError> {
    value.map(|v| parse_uuid(column, v)).transpose()
}
