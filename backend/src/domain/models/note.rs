use chrono::{DateTime, SubsecRound, Utc};

use super::{clean, clean_patch};
use crate::storage::traits::{ChildLinked, Entity};
use shared::{CreateNoteRequest, Note, UpdateNoteRequest};

impl Entity for Note {
    type Draft = CreateNoteRequest;
    type Patch = UpdateNoteRequest;

    const COLLECTION: &'static str = "notes";
    const ID_PREFIX: &'static str = "note";

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

    fn from_draft(id: String, draft: CreateNoteRequest, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(6);
        Note {
            id,
            user_id: draft.user_id,
            child_id: clean(draft.child_id),
            title: clean(draft.title),
            content: draft.content,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: UpdateNoteRequest) {
        if let Some(child_id) = clean_patch(patch.child_id) {
            self.child_id = child_id;
        }
        if let Some(title) = clean_patch(patch.title) {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }
}

impl ChildLinked for Note {
    fn child_id(&self) -> Option<&str> {
        self.child_id.as_deref()
    }

    fn unlink_child_patch() -> UpdateNoteRequest {
        UpdateNoteRequest {
            child_id: Some(None),
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NoteValidationError {
    #[error("Note content cannot be empty")]
    EmptyContent,
}

/// Trim tags and drop empty ones, keeping their order
pub fn clean_tags(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    tags.map(|tags| {
        tags.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    })
}
