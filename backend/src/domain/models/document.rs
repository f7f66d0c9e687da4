use chrono::{DateTime, SubsecRound, Utc};

use super::{clean, clean_patch};
use crate::storage::traits::{ChildLinked, Entity};
use shared::{CreateDocumentRequest, Document, DocumentCategory, UpdateDocumentRequest};

impl Entity for Document {
    type Draft = CreateDocumentRequest;
    type Patch = UpdateDocumentRequest;

    const COLLECTION: &'static str = "documents";
    const ID_PREFIX: &'static str = "document";

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

    fn from_draft(id: String, draft: CreateDocumentRequest, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(6);
        Document {
            id,
            user_id: draft.user_id,
            child_id: clean(draft.child_id),
            title: draft.title,
            file_url: draft.file_url,
            file_type: clean(draft.file_type),
            category: Some(draft.category.unwrap_or(DocumentCategory::Other)),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: UpdateDocumentRequest) {
        if let Some(child_id) = clean_patch(patch.child_id) {
            self.child_id = child_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(file_url) = patch.file_url {
            self.file_url = file_url;
        }
        if let Some(file_type) = clean_patch(patch.file_type) {
            self.file_type = file_type;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }
}

impl ChildLinked for Document {
    fn child_id(&self) -> Option<&str> {
        self.child_id.as_deref()
    }

    fn unlink_child_patch() -> UpdateDocumentRequest {
        UpdateDocumentRequest {
            child_id: Some(None),
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentValidationError {
    #[error("Document title cannot be empty")]
    EmptyTitle,
    #[error("Document file URL cannot be empty")]
    EmptyFileUrl,
}
