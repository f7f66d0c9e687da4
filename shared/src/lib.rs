//! Entity model and request/response DTOs for Parent Concierge.
//!
//! Every type here is shared between the storage layer, the domain services
//! and the REST interface. Field names serialize in camelCase and enum
//! values in lowercase, which is also the on-disk format of the local
//! JSON store.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deserializes a present field as `Some`, so that `Option<Option<T>>`
/// can tell "absent" (`None`) from an explicit `null` (`Some(None)`).
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Error returned when a stored enum value is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} value: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

string_enum!(
    /// Kind of calendar event
    EventType, "event type" {
        School => "school",
        Medical => "medical",
        Activity => "activity",
        Birthday => "birthday",
        Other => "other",
    }
);

string_enum!(
    /// How a recurring event repeats
    RecurrencePattern, "recurrence pattern" {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
);

string_enum!(
    /// Priority shared by events and tasks
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

string_enum!(
    EventStatus, "event status" {
        Upcoming => "upcoming",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

string_enum!(
    TaskCategory, "task category" {
        Homework => "homework",
        Chores => "chores",
        Medical => "medical",
        Other => "other",
    }
);

string_enum!(
    DocumentCategory, "document category" {
        Medical => "medical",
        School => "school",
        Legal => "legal",
        Other => "other",
    }
);

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Upcoming
    }
}

impl Default for EventType {
    fn default() -> Self {
        EventType::Other
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A child profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    /// Format: "child::<epoch_millis><random suffix>"
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub school: Option<String>,
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A calendar event, optionally linked to a child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub child_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub is_recurring: bool,
    /// Only set when `is_recurring` is true
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub priority: Priority,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task or reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub child_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub is_completed: bool,
    pub category: Option<TaskCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata for a stored document. The binary itself lives at `file_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub child_id: Option<String>,
    pub title: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub category: Option<DocumentCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub child_id: Option<String>,
    pub title: Option<String>,
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Child requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChildRequest {
    /// Filled in from the current user by the REST layer
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Partial update. `null` clears a nullable field, an absent field is left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChildRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub school: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
}

/// A child together with the values the profile card derives from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    #[serde(flatten)]
    pub child: Child,
    pub age: Option<u32>,
    pub initials: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildListResponse {
    pub children: Vec<ChildProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Event requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub child_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type: EventType,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub child_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event: Event,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Task requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub child_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub category: Option<TaskCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub child_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<TaskCategory>>,
}

/// Status tab of the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatusFilter {
    #[default]
    All,
    Pending,
    Completed,
    Overdue,
}

/// Query for the filtered task list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    /// Case-insensitive match against title and description
    pub search: Option<String>,
    pub priority: Option<Priority>,
    /// "all", "family" or a child id
    pub child: Option<String>,
    #[serde(default)]
    pub status: TaskStatusFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub all: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskViewResponse {
    pub tasks: Vec<Task>,
    pub counts: TaskCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub task: Task,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Document requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub child_id: Option<String>,
    pub title: String,
    pub file_url: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub category: Option<DocumentCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub child_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<DocumentCategory>>,
}

/// Tab of the document list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentTab {
    #[default]
    All,
    /// Created within the last seven days
    Recent,
    Medical,
    School,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    /// Case-insensitive match against the title
    pub search: Option<String>,
    pub category: Option<DocumentCategory>,
    /// "all", "family" (no child) or a child id
    pub child: Option<String>,
    #[serde(default)]
    pub tab: DocumentTab,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCounts {
    pub all: usize,
    pub recent: usize,
    pub medical: usize,
    pub school: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentViewResponse {
    pub documents: Vec<Document>,
    pub counts: DocumentCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub document: Document,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Note requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub child_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub child_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Option<Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListResponse {
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub note: Note,
    pub success_message: String,
}

/// Returned by every delete endpoint. `deleted` is false when the id was already gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted: bool,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Type of calendar day for explicit rendering logic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CalendarDayType {
    /// Empty padding day before the start of the month
    PaddingBefore,
    /// Actual day within the month
    MonthDay,
}

/// Represents a single cell in the month grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    /// Day of month, 0 for padding cells
    pub day: u32,
    pub date: Option<NaiveDate>,
    pub events: Vec<Event>,
    pub day_type: CalendarDayType,
}

/// A calendar month with the events that occur on each day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub month: u32,
    pub year: u32,
    pub month_name: String,
    pub days: Vec<CalendarDay>,
    pub first_day_of_week: u32, // 0 = Sunday, 1 = Monday, etc.
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonthRequest {
    pub month: u32,
    pub year: u32,
}

/// Month currently shown by the calendar screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarFocusDate {
    pub month: u32,
    pub year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCalendarFocusRequest {
    pub month: u32,
    pub year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCalendarFocusResponse {
    pub focus_date: CalendarFocusDate,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Dashboard and storage status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub children_count: usize,
    pub pending_tasks: usize,
    pub overdue_tasks: usize,
    pub documents_count: usize,
    /// Upcoming events in the next seven days, today included
    pub events_this_week: usize,
    pub upcoming_events: Vec<Event>,
    pub tasks_due_soon: Vec<Task>,
}

/// Which store the session is currently writing to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageModeKind {
    Remote,
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatusResponse {
    pub mode: StorageModeKind,
    pub policy: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_text_round_trip() {
        for pattern in RecurrencePattern::ALL {
            assert_eq!(pattern.as_str().parse::<RecurrencePattern>().unwrap(), *pattern);
        }
        assert_eq!("birthday".parse::<EventType>().unwrap(), EventType::Birthday);
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "invalid priority value: 'urgent'");
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let patch: UpdateChildRequest =
            serde_json::from_str(r#"{"school": null, "grade": "3rd"}"#).unwrap();
        assert_eq!(patch.school, Some(None));
        assert_eq!(patch.grade, Some(Some("3rd".to_string())));
        assert_eq!(patch.notes, None);
        assert_eq!(patch.name, None);
    }

    #[test]
    fn test_child_serializes_camel_case_with_explicit_nulls() {
        let now = Utc::now();
        let child = Child {
            id: "child::1".to_string(),
            user_id: "u1".to_string(),
            name: "Emma".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2015, 3, 15),
            school: None,
            grade: None,
            notes: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&child).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["birthDate"], "2015-03-15");
        assert!(value["school"].is_null());
        assert!(value.as_object().unwrap().contains_key("avatarUrl"));
    }

    #[test]
    fn test_task_filter_defaults() {
        let filter: TaskFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.status, TaskStatusFilter::All);
        assert!(filter.search.is_none());
    }

    #[test]
    fn test_wrapper_responses_use_camel_case() {
        let month = CalendarMonth {
            month: 2,
            year: 2024,
            month_name: "February".to_string(),
            days: vec![CalendarDay {
                day: 0,
                date: None,
                events: Vec::new(),
                day_type: CalendarDayType::PaddingBefore,
            }],
            first_day_of_week: 4,
        };
        let value = serde_json::to_value(&month).unwrap();
        assert_eq!(value["monthName"], "February");
        assert_eq!(value["firstDayOfWeek"], 4);
        assert_eq!(value["days"][0]["dayType"], "PaddingBefore");

        let deleted = serde_json::to_value(DeleteResponse {
            deleted: true,
            success_message: "Task deleted successfully".to_string(),
        })
        .unwrap();
        assert_eq!(deleted["successMessage"], "Task deleted successfully");
        assert!(deleted.get("success_message").is_none());
    }
}
