use chrono::{DateTime, NaiveDate, SubsecRound, Utc};

use super::{clean, clean_patch};
use crate::storage::traits::{ChildLinked, Entity};
use shared::{CreateTaskRequest, Task, TaskCategory, UpdateTaskRequest};

impl Entity for Task {
    type Draft = CreateTaskRequest;
    type Patch = UpdateTaskRequest;

    const COLLECTION: &'static str = "tasks";
    const ID_PREFIX: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn from_draft(id: String, draft: CreateTaskRequest, now: DateTime<Utc>) -> Self {
        // Stores keep microseconds
        let now = now.trunc_subsecs(6);
        Task {
            id,
            user_id: draft.user_id,
            child_id: clean(draft.child_id),
            title: draft.title,
            description: clean(draft.description),
            due_date: draft.due_date,
            priority: draft.priority.unwrap_or_default(),
            is_completed: draft.is_completed,
            category: Some(draft.category.unwrap_or(TaskCategory::Other)),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: UpdateTaskRequest) {
        if let Some(child_id) = clean_patch(patch.child_id) {
            self.child_id = child_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = clean_patch(patch.description) {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(is_completed) = patch.is_completed {
            self.is_completed = is_completed;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }
}

impl ChildLinked for Task {
    fn child_id(&self) -> Option<&str> {
        self.child_id.as_deref()
    }

    fn unlink_child_patch() -> UpdateTaskRequest {
        UpdateTaskRequest {
            child_id: Some(None),
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskValidationError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
}

/// An open task whose due date has passed. Tasks due today are not overdue.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.is_completed && task.due_date.map_or(false, |due| due < today)
}
