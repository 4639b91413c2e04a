use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Points a task is worth when the creator does not say otherwise.
pub const DEFAULT_POINTS_VALUE: i64 = 10;
pub const DEFAULT_CATEGORY: &str = "general";
/// Longest interval a recurrence may skip, in days, weeks or months.
pub const MAX_FREQUENCY_VALUE: u32 = 365;
pub const MAX_POINTS_VALUE: i64 = 1000;

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task title is required")]
    MissingTitle,
    #[error("Invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("Frequency type is required for recurring tasks")]
    MissingFrequencyType,
    #[error("Frequency value must be between 1 and {}", MAX_FREQUENCY_VALUE)]
    InvalidFrequencyValue,
    #[error("Scheduled day {0} is out of range (0 = Sunday .. 6 = Saturday)")]
    InvalidScheduledDay(u8),
    #[error("Points value must be between 1 and {}", MAX_POINTS_VALUE)]
    InvalidPointsValue,
    #[error("User {0} is not a member of this household")]
    NotInHousehold(Uuid),
}

// ============================================================================
// Time of day
// ============================================================================

/// Wall-clock time of day with minute precision, serialized as "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTime(format!("{:02}:{:02}", hour, minute)))
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    /// Accepts "HH:MM" and, for values coming from SQL time columns, "HH:MM:SS"
    /// (seconds are dropped).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| ValidationError::InvalidTime(s.to_string()))
            .and_then(|t| TimeOfDay::new(t.hour(), t.minute()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial updates.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Household & Profile Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(()),
        }
    }
}

/// Household membership plus gamification state of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub household_id: Option<Uuid>,
    pub display_name: String,
    pub role: Role,
    pub current_streak: i64,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i32,
    pub profile: Profile,
    pub tasks_completed: i64,
}

// ============================================================================
// Task Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyType {
    Daily,
    Weekly,
    Monthly,
}

impl FrequencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyType::Daily => "daily",
            FrequencyType::Weekly => "weekly",
            FrequencyType::Monthly => "monthly",
        }
    }
}

impl FromStr for FrequencyType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(FrequencyType::Daily),
            "weekly" => Ok(FrequencyType::Weekly),
            "monthly" => Ok(FrequencyType::Monthly),
            _ => Err(()),
        }
    }
}

/// Repeat rule of a recurring task. Build it with [`Recurrence::new`] so the
/// frequency and weekday invariants hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency_type: FrequencyType,
    pub frequency_value: u32,
    /// Weekday ordinals, 0 = Sunday .. 6 = Saturday, sorted and unique.
    #[serde(default)]
    pub scheduled_days: Vec<u8>,
    pub scheduled_time: Option<TimeOfDay>,
}

impl Recurrence {
    pub fn new(
        frequency_type: FrequencyType,
        frequency_value: u32,
        mut scheduled_days: Vec<u8>,
        scheduled_time: Option<TimeOfDay>,
    ) -> Result<Self, ValidationError> {
        if !(1..=MAX_FREQUENCY_VALUE).contains(&frequency_value) {
            return Err(ValidationError::InvalidFrequencyValue);
        }
        if let Some(day) = scheduled_days.iter().find(|d| **d > 6) {
            return Err(ValidationError::InvalidScheduledDay(*day));
        }
        scheduled_days.sort_unstable();
        scheduled_days.dedup();

        Ok(Self {
            frequency_type,
            frequency_value,
            scheduled_days,
            scheduled_time,
        })
    }
}

pub fn validate_points_value(points_value: i64) -> Result<i64, ValidationError> {
    if (1..=MAX_POINTS_VALUE).contains(&points_value) {
        Ok(points_value)
    } else {
        Err(ValidationError::InvalidPointsValue)
    }
}

/// Assemble the recurrence of a task from loose request fields. Non-recurring
/// tasks ignore every frequency field.
pub fn build_recurrence(
    is_recurring: bool,
    frequency_type: Option<FrequencyType>,
    frequency_value: Option<u32>,
    scheduled_days: Option<Vec<u8>>,
    scheduled_time: Option<TimeOfDay>,
) -> Result<Option<Recurrence>, ValidationError> {
    if !is_recurring {
        return Ok(None);
    }

    let frequency_type = frequency_type.ok_or(ValidationError::MissingFrequencyType)?;
    Recurrence::new(
        frequency_type,
        frequency_value.unwrap_or(1),
        scheduled_days.unwrap_or_default(),
        scheduled_time,
    )
    .map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Deleted {
        deleted_by: Uuid,
        deleted_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub household_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub recurrence: Option<Recurrence>,
    pub earliest_completion_time: Option<TimeOfDay>,
    pub points_value: i64,
    pub notify_on_incomplete: bool,
    pub created_by: Option<Uuid>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn frequency_type(&self) -> Option<FrequencyType> {
        self.recurrence.as_ref().map(|r| r.frequency_type)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.status, TaskStatus::Deleted { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskParticipant {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub rotation_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    pub frequency_type: Option<FrequencyType>,
    pub frequency_value: Option<u32>,
    pub scheduled_days: Option<Vec<u8>>,
    pub scheduled_time: Option<TimeOfDay>,
    pub earliest_completion_time: Option<TimeOfDay>,
    pub points_value: Option<i64>,
    pub notify_on_incomplete: Option<bool>,
    /// Rotation members in turn order; empty means the creator does it.
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

impl CreateTaskRequest {
    /// Check the request and return the recurrence it describes.
    pub fn validate(&self) -> Result<Option<Recurrence>, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if let Some(points_value) = self.points_value {
            validate_points_value(points_value)?;
        }

        build_recurrence(
            self.is_recurring,
            self.frequency_type,
            self.frequency_value,
            self.scheduled_days.clone(),
            self.scheduled_time,
        )
    }
}

/// Partial task update. Nullable fields use `Some(None)` for an explicit clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
    pub frequency_type: Option<FrequencyType>,
    pub frequency_value: Option<u32>,
    pub scheduled_days: Option<Vec<u8>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_time: Option<Option<TimeOfDay>>,
    #[serde(default, deserialize_with = "double_option")]
    pub earliest_completion_time: Option<Option<TimeOfDay>>,
    pub points_value: Option<i64>,
    pub notify_on_incomplete: Option<bool>,
    pub participants: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateParticipantsRequest {
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetails {
    pub task: Task,
    pub participants: Vec<TaskParticipant>,
    pub pending_assignments: Vec<TaskAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub task: Task,
    pub archived_assignments: u64,
}

// ============================================================================
// Assignment Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Completed {
        completed_by: Uuid,
        completed_at: DateTime<Utc>,
    },
    /// Closed because the owning task was archived; never settled for points.
    Archived {
        archived_by: Uuid,
        archived_at: DateTime<Utc>,
    },
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Completed { .. } => "completed",
            AssignmentStatus::Archived { .. } => "archived",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub assigned_to: Uuid,
    pub due_date: NaiveDate,
    pub due_datetime: Option<DateTime<Utc>>,
    pub rotation_order: i64,
    pub status: AssignmentStatus,
    pub awarded_points: Option<i64>,
    pub awarded_streak_bonus: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TaskAssignment {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, AssignmentStatus::Pending)
    }

    /// True for real completions and for archive bookkeeping completions alike.
    pub fn is_completed(&self) -> bool {
        !self.is_pending()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentWithTask {
    pub assignment: TaskAssignment,
    pub task: Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStateFilter {
    Pending,
    Completed,
    #[default]
    All,
}

/// Derived assignment lists, recomputed on every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentView {
    DueToday,
    Upcoming,
    Overdue,
    Completed,
}

impl FromStr for AssignmentView {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "due-today" => Ok(AssignmentView::DueToday),
            "upcoming" => Ok(AssignmentView::Upcoming),
            "overdue" => Ok(AssignmentView::Overdue),
            "completed" => Ok(AssignmentView::Completed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignRequest {
    pub assigned_to: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCheck {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl CompletionCheck {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub assignment: TaskAssignment,
    pub task_title: String,
    pub base_points: i64,
    pub streak_bonus: i64,
    pub points_awarded: i64,
    pub new_streak: i64,
    pub was_early: bool,
    /// The completer was not the assignee.
    pub helped_out: bool,
    pub next_assignment: Option<TaskAssignment>,
    pub profile_updated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UncompleteSummary {
    pub assignment: TaskAssignment,
    pub points_removed: i64,
    pub new_streak: i64,
    pub was_early: bool,
    /// False when the removed bonus had to be estimated.
    pub exact_reversal: bool,
    pub profile_updated: bool,
}

// ============================================================================
// Preview Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextDueRequest {
    pub frequency_type: FrequencyType,
    pub frequency_value: u32,
    pub from: NaiveDateTime,
    #[serde(default)]
    pub scheduled_days: Vec<u8>,
    pub scheduled_time: Option<TimeOfDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextDueResponse {
    pub due_date: NaiveDate,
    pub due_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextAssigneeRequest {
    pub participants: Vec<Uuid>,
    pub current_assignee: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAssigneeResponse {
    pub next_assignee: Uuid,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(title: &str) -> CreateTaskRequest {
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

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse(), Ok(Role::Admin));
        assert_eq!("MEMBER".parse(), Ok(Role::Member));
        assert!("owner".parse::<Role>().is_err());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Member.is_admin());
    }

    #[test]
    fn test_frequency_type_from_str() {
        assert_eq!("daily".parse(), Ok(FrequencyType::Daily));
        assert_eq!("Weekly".parse(), Ok(FrequencyType::Weekly));
        assert_eq!("monthly".parse(), Ok(FrequencyType::Monthly));
        assert!("yearly".parse::<FrequencyType>().is_err());
    }

    #[test]
    fn test_time_of_day_parse_and_display() {
        let time: TimeOfDay = "17:05".parse().unwrap();
        assert_eq!(time.to_string(), "17:05");

        let with_seconds: TimeOfDay = "07:30:59".parse().unwrap();
        assert_eq!(with_seconds, TimeOfDay::new(7, 30).unwrap());

        assert!("25:00".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_time_of_day_serde() {
        let time = TimeOfDay::new(9, 0).unwrap();
        assert_eq!(serde_json::to_string(&time).unwrap(), "\"09:00\"");

        let parsed: TimeOfDay = serde_json::from_str("\"18:45\"").unwrap();
        assert_eq!(parsed, TimeOfDay::new(18, 45).unwrap());
        assert!(serde_json::from_str::<TimeOfDay>("\"9am\"").is_err());
    }

    #[test]
    fn test_recurrence_sorts_and_dedups_days() {
        let recurrence = Recurrence::new(FrequencyType::Weekly, 1, vec![5, 1, 5, 3], None).unwrap();
        assert_eq!(recurrence.scheduled_days, vec![1, 3, 5]);
    }

    #[test]
    fn test_recurrence_rejects_invalid_values() {
        assert_eq!(
            Recurrence::new(FrequencyType::Daily, 0, vec![], None),
            Err(ValidationError::InvalidFrequencyValue)
        );
        assert_eq!(
            Recurrence::new(FrequencyType::Daily, u32::MAX, vec![], None),
            Err(ValidationError::InvalidFrequencyValue)
        );
        assert!(Recurrence::new(FrequencyType::Monthly, MAX_FREQUENCY_VALUE, vec![], None).is_ok());
        assert_eq!(
            Recurrence::new(FrequencyType::Weekly, 1, vec![1, 7], None),
            Err(ValidationError::InvalidScheduledDay(7))
        );
    }

    #[test]
    fn test_build_recurrence_ignores_fields_for_one_off_tasks() {
        let recurrence = build_recurrence(false, Some(FrequencyType::Weekly), Some(0), Some(vec![9]), None);
        assert_eq!(recurrence, Ok(None));
    }

    #[test]
    fn test_build_recurrence_requires_frequency_type() {
        assert_eq!(
            build_recurrence(true, None, Some(1), None, None),
            Err(ValidationError::MissingFrequencyType)
        );
    }

    #[test]
    fn test_create_request_validation() {
        assert_eq!(create_request("   ").validate(), Err(ValidationError::MissingTitle));

        let mut request = create_request("Dishes");
        request.points_value = Some(0);
        assert_eq!(request.validate(), Err(ValidationError::InvalidPointsValue));
        request.points_value = Some(i64::MAX);
        assert_eq!(request.validate(), Err(ValidationError::InvalidPointsValue));
        request.points_value = Some(MAX_POINTS_VALUE);
        assert!(request.validate().is_ok());

        let mut request = create_request("Dishes");
        request.is_recurring = true;
        request.frequency_type = Some(FrequencyType::Daily);
        let recurrence = request.validate().unwrap().unwrap();
        assert_eq!(recurrence.frequency_value, 1);
        assert!(recurrence.scheduled_days.is_empty());
    }

    #[test]
    fn test_update_request_distinguishes_null_from_missing() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"earliest_completion_time": null, "title": "New"}"#).unwrap();
        assert_eq!(request.earliest_completion_time, Some(None));
        assert_eq!(request.scheduled_time, None);
        assert_eq!(request.title.as_deref(), Some("New"));

        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"scheduled_time": "08:15"}"#).unwrap();
        assert_eq!(request.scheduled_time, Some(Some(TimeOfDay::new(8, 15).unwrap())));
    }

    #[test]
    fn test_assignment_status_helpers() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let mut assignment = TaskAssignment {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            assigned_to: user,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            due_datetime: None,
            rotation_order: 1,
            status: AssignmentStatus::Pending,
            awarded_points: None,
            awarded_streak_bonus: None,
            created_at: now,
        };
        assert!(assignment.is_pending());
        assert!(!assignment.is_completed());

        assignment.status = AssignmentStatus::Archived {
            archived_by: user,
            archived_at: now,
        };
        assert!(assignment.is_completed());
        assert_eq!(assignment.status.as_str(), "archived");
    }

    #[test]
    fn test_assignment_status_serializes_tagged() {
        let by = Uuid::nil();
        let status = AssignmentStatus::Completed {
            completed_by: by,
            completed_at: DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "completed");
        assert_eq!(json["completed_by"], by.to_string());
    }

    #[test]
    fn test_assignment_view_from_str() {
        assert_eq!("due-today".parse(), Ok(AssignmentView::DueToday));
        assert_eq!("upcoming".parse(), Ok(AssignmentView::Upcoming));
        assert_eq!("overdue".parse(), Ok(AssignmentView::Overdue));
        assert_eq!("completed".parse(), Ok(AssignmentView::Completed));
        assert!("tomorrow".parse::<AssignmentView>().is_err());
    }

    #[test]
    fn test_completion_check_constructors() {
        assert!(CompletionCheck::allowed().allowed);
        let blocked = CompletionCheck::blocked("later");
        assert!(!blocked.allowed);
        assert_eq!(blocked.reason.as_deref(), Some("later"));
    }

    #[test]
    fn test_api_success() {
        let success = ApiSuccess::new("test data");
        assert_eq!(success.data, "test data");
    }
}
