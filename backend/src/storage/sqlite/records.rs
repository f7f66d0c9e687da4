//! Row mapping between entity records and SQL columns.
//!
//! Booleans are stored as 0/1 INTEGER columns, dates as `YYYY-MM-DD`,
//! timestamps as RFC 3339 text with microsecond precision (so that text
//! ordering matches chronological ordering) and note tags as a JSON array
//! in a TEXT column.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use crate::storage::traits::Entity;
use shared::{Child, Document, Event, Note, Task};

/// A bindable column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Integer(i64),
}

impl SqlValue {
    fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(Some(value.into()))
    }

    fn opt_text<T: ToString>(value: Option<T>) -> Self {
        SqlValue::Text(value.map(|v| v.to_string()))
    }

    fn bool(value: bool) -> Self {
        SqlValue::Integer(if value { 1 } else { 0 })
    }
}

/// An entity that can be stored as one row of the table `E::COLLECTION`
pub trait SqlRecord: Entity {
    /// Column names, `id` first. `to_values` yields values in this order.
    const COLUMNS: &'static [&'static str];
    const ORDER_BY: &'static str;

    fn to_values(&self) -> Vec<SqlValue>;
    fn from_row(row: &SqliteRow) -> Result<Self>;
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    Ok(DateTime::parse_from_rfc3339(&raw)
        .with_context(|| format!("Invalid timestamp in column {}: {}", column, raw))?
        .with_timezone(&Utc))
}

fn required<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .with_context(|| format!("Invalid value in column {}: {}", column, raw))
}

fn optional<T>(row: &SqliteRow, column: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        value
            .parse::<T>()
            .with_context(|| format!("Invalid value in column {}: {}", column, value))
    })
    .transpose()
}

fn flag(row: &SqliteRow, column: &str) -> Result<bool> {
    let raw: i64 = row.try_get(column)?;
    Ok(raw != 0)
}

impl SqlRecord for Child {
    const COLUMNS: &'static [&'static str] = &[
        "id", "user_id", "name", "birth_date", "school", "grade", "notes", "avatar_url",
        "created_at", "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(&self.id),
            SqlValue::text(&self.user_id),
            SqlValue::text(&self.name),
            SqlValue::opt_text(self.birth_date),
            SqlValue::opt_text(self.school.as_ref()),
            SqlValue::opt_text(self.grade.as_ref()),
            SqlValue::opt_text(self.notes.as_ref()),
            SqlValue::opt_text(self.avatar_url.as_ref()),
            SqlValue::text(format_timestamp(&self.created_at)),
            SqlValue::text(format_timestamp(&self.updated_at)),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Child {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            birth_date: optional::<NaiveDate>(row, "birth_date")?,
            school: row.try_get("school")?,
            grade: row.try_get("grade")?,
            notes: row.try_get("notes")?,
            avatar_url: row.try_get("avatar_url")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

impl SqlRecord for Event {
    const COLUMNS: &'static [&'static str] = &[
        "id", "user_id", "child_id", "title", "description", "event_type", "start_date",
        "end_date", "start_time", "end_time", "location", "is_recurring", "recurrence_pattern",
        "priority", "status", "created_at", "updated_at",
    ];
    const ORDER_BY: &'static str = "start_date ASC, created_at ASC, id ASC";

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(&self.id),
            SqlValue::text(&self.user_id),
            SqlValue::opt_text(self.child_id.as_ref()),
            SqlValue::text(&self.title),
            SqlValue::opt_text(self.description.as_ref()),
            SqlValue::text(self.event_type.as_str()),
            SqlValue::text(self.start_date.to_string()),
            SqlValue::opt_text(self.end_date),
            SqlValue::opt_text(self.start_time),
            SqlValue::opt_text(self.end_time),
            SqlValue::opt_text(self.location.as_ref()),
            SqlValue::bool(self.is_recurring),
            SqlValue::opt_text(self.recurrence_pattern.map(|p| p.as_str())),
            SqlValue::text(self.priority.as_str()),
            SqlValue::text(self.status.as_str()),
            SqlValue::text(format_timestamp(&self.created_at)),
            SqlValue::text(format_timestamp(&self.updated_at)),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Event {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            child_id: row.try_get("child_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            event_type: required(row, "event_type")?,
            start_date: required::<NaiveDate>(row, "start_date")?,
            end_date: optional::<NaiveDate>(row, "end_date")?,
            start_time: optional::<NaiveTime>(row, "start_time")?,
            end_time: optional::<NaiveTime>(row, "end_time")?,
            location: row.try_get("location")?,
            is_recurring: flag(row, "is_recurring")?,
            recurrence_pattern: optional(row, "recurrence_pattern")?,
            priority: required(row, "priority")?,
            status: required(row, "status")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

impl SqlRecord for Task {
    const COLUMNS: &'static [&'static str] = &[
        "id", "user_id", "child_id", "title", "description", "due_date", "priority",
        "is_completed", "category", "created_at", "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(&self.id),
            SqlValue::text(&self.user_id),
            SqlValue::opt_text(self.child_id.as_ref()),
            SqlValue::text(&self.title),
            SqlValue::opt_text(self.description.as_ref()),
            SqlValue::opt_text(self.due_date),
            SqlValue::text(self.priority.as_str()),
            SqlValue::bool(self.is_completed),
            SqlValue::opt_text(self.category.map(|c| c.as_str())),
            SqlValue::text(format_timestamp(&self.created_at)),
            SqlValue::text(format_timestamp(&self.updated_at)),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Task {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            child_id: row.try_get("child_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            due_date: optional::<NaiveDate>(row, "due_date")?,
            priority: required(row, "priority")?,
            is_completed: flag(row, "is_completed")?,
            category: optional(row, "category")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

impl SqlRecord for Document {
    const COLUMNS: &'static [&'static str] = &[
        "id", "user_id", "child_id", "title", "file_url", "file_type", "category", "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::text(&self.id),
            SqlValue::text(&self.user_id),
            SqlValue::opt_text(self.child_id.as_ref()),
            SqlValue::text(&self.title),
            SqlValue::text(&self.file_url),
            SqlValue::opt_text(self.file_type.as_ref()),
            SqlValue::opt_text(self.category.map(|c| c.as_str())),
            SqlValue::text(format_timestamp(&self.created_at)),
            SqlValue::text(format_timestamp(&self.updated_at)),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Document {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            child_id: row.try_get("child_id")?,
            title: row.try_get("title")?,
            file_url: row.try_get("file_url")?,
            file_type: row.try_get("file_type")?,
            category: optional(row, "category")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

impl SqlRecord for Note {
    const COLUMNS: &'static [&'static str] = &[
        "id", "user_id", "child_id", "title", "content", "tags", "created_at", "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn to_values(&self) -> Vec<SqlValue> {
        let tags = self
            .tags
            .as_ref()
            .map(|tags| serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string()));
        vec![
            SqlValue::text(&self.id),
            SqlValue::text(&self.user_id),
            SqlValue::opt_text(self.child_id.as_ref()),
            SqlValue::opt_text(self.title.as_ref()),
            SqlValue::text(&self.content),
            SqlValue::Text(tags),
            SqlValue::text(format_timestamp(&self.created_at)),
            SqlValue::text(format_timestamp(&self.updated_at)),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let tags: Option<String> = row.try_get("tags")?;
        let tags = tags
            .map(|raw| serde_json::from_str::<Vec<String>>(&raw).context("Invalid tags column"))
            .transpose()?;

        Ok(Note {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            child_id: row.try_get("child_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            tags,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        let a = format_timestamp(&earlier);
        let b = format_timestamp(&later);
        assert_eq!(a, "2024-01-01T09:00:00.000000Z");
        assert!(a < b);
    }

    #[test]
    fn test_column_lists_match_values() {
        let now = Utc::now();
        let task = Task {
            id: "task::1".to_string(),
            user_id: "u1".to_string(),
            child_id: None,
            title: "Read".to_string(),
            description: None,
            due_date: None,
            priority: shared::Priority::High,
            is_completed: true,
            category: None,
            created_at: now,
            updated_at: now,
        };
        let values = task.to_values();
        assert_eq!(values.len(), Task::COLUMNS.len());
        let completed_index = Task::COLUMNS.iter().position(|c| *c == "is_completed").unwrap();
        assert_eq!(values[completed_index], SqlValue::Integer(1));
    }
}
