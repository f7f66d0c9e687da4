use anyhow::Result;
use log::{info, warn};

use crate::domain::models::{clean_tags, NoteValidationError};
use crate::storage::EntityRepository;
use shared::{
    CreateNoteRequest, DeleteResponse, Note, NoteListResponse, NoteResponse, UpdateNoteRequest,
};

/// Service for free-form notes
#[derive(Clone)]
pub struct NoteService {
    notes: EntityRepository<Note>,
}

impl NoteService {
    pub fn new(notes: EntityRepository<Note>) -> Self {
        Self { notes }
    }

    pub async fn create_note(&self, mut request: CreateNoteRequest) -> Result<NoteResponse> {
        info!("Creating note for user {}", request.user_id);

        request.content = request.content.trim().to_string();
        if request.content.is_empty() {
            return Err(NoteValidationError::EmptyContent.into());
        }
        request.tags = clean_tags(request.tags);

        let note = self.notes.create(request).await?;
        info!("Created note with ID: {}", note.id);

        Ok(NoteResponse {
            note,
            success_message: "Note created successfully".to_string(),
        })
    }

    pub async fn get_note(&self, note_id: &str) -> Result<Option<Note>> {
        info!("Getting note: {}", note_id);
        Ok(self.notes.get(note_id).await?)
    }

    pub async fn list_notes(&self, user_id: &str) -> Result<NoteListResponse> {
        info!("Listing notes for user {}", user_id);
        let notes = self.notes.get_all(user_id).await?;
        Ok(NoteListResponse { notes })
    }

    pub async fn update_note(&self, note_id: &str, mut request: UpdateNoteRequest) -> Result<NoteResponse> {
        info!("Updating note: {}", note_id);

        if let Some(content) = request.content.as_mut() {
            *content = content.trim().to_string();
            if content.is_empty() {
                return Err(NoteValidationError::EmptyContent.into());
            }
        }
        request.tags = request.tags.map(clean_tags);

        let note = self.notes.update(note_id, request).await?;
        Ok(NoteResponse {
            note,
            success_message: "Note updated successfully".to_string(),
        })
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<DeleteResponse> {
        info!("Deleting note: {}", note_id);

        let deleted = self.notes.delete(note_id).await?;
        if !deleted {
            warn!("Note {} was already gone", note_id);
        }
        Ok(DeleteResponse {
            deleted,
            success_message: if deleted {
                "Note deleted successfully".to_string()
            } else {
                "Note was already deleted".to_string()
            },
        })
    }
}
