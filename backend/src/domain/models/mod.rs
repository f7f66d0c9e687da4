//! Entity bindings for the persistence layer plus the small pieces of
//! business logic that belong to a single record (age, overdue, occurrence).

pub mod child;
pub mod document;
pub mod event;
pub mod note;
pub mod task;

pub use child::{age_on, initials, ChildValidationError};
pub use document::DocumentValidationError;
pub use event::{next_occurrence, occurs_on, EventValidationError};
pub use note::{clean_tags, NoteValidationError};
pub use task::{is_overdue, TaskValidationError};

/// Trim an optional string, treating empty or whitespace-only text as unset
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Clean the inner value of a nullable patch field
pub(crate) fn clean_patch(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(clean)
}

/// Which records a child filter selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildScope {
    All,
    /// Records not linked to any child
    Family,
    Child(String),
}

impl ChildScope {
    /// "all" (or nothing), "family", or a child id
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("all") => ChildScope::All,
            Some("family") => ChildScope::Family,
            Some(id) => ChildScope::Child(id.to_string()),
        }
    }

    pub fn matches(&self, child_id: Option<&str>) -> bool {
        match self {
            ChildScope::All => true,
            ChildScope::Family => child_id.is_none(),
            ChildScope::Child(id) => child_id == Some(id.as_str()),
        }
    }
}
