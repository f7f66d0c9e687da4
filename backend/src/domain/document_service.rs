use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::domain::models::{ChildScope, DocumentValidationError};
use crate::storage::EntityRepository;
use shared::{
    CreateDocumentRequest, DeleteResponse, Document, DocumentCategory, DocumentCounts,
    DocumentFilter, DocumentListResponse, DocumentResponse, DocumentTab, DocumentViewResponse,
    UpdateDocumentRequest,
};

/// Documents created within this many days count as recent
const RECENT_DAYS: i64 = 7;

/// Service for document metadata. The files themselves live at `file_url`.
#[derive(Clone)]
pub struct DocumentService {
    documents: EntityRepository<Document>,
}

impl DocumentService {
    pub fn new(documents: EntityRepository<Document>) -> Self {
        Self { documents }
    }

    pub async fn create_document(&self, mut request: CreateDocumentRequest) -> Result<DocumentResponse> {
        info!("Creating document: title={}", request.title);

        request.title = request.title.trim().to_string();
        request.file_url = request.file_url.trim().to_string();
        if request.title.is_empty() {
            return Err(DocumentValidationError::EmptyTitle.into());
        }
        if request.file_url.is_empty() {
            return Err(DocumentValidationError::EmptyFileUrl.into());
        }

        let document = self.documents.create(request).await?;
        info!("Created document: {} with ID: {}", document.title, document.id);

        Ok(DocumentResponse {
            document,
            success_message: "Document created successfully".to_string(),
        })
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        info!("Getting document: {}", document_id);
        Ok(self.documents.get(document_id).await?)
    }

    pub async fn list_documents(&self, user_id: &str) -> Result<DocumentListResponse> {
        info!("Listing documents for user {}", user_id);
        let documents = self.documents.get_all(user_id).await?;
        Ok(DocumentListResponse { documents })
    }

    pub async fn update_document(
        &self,
        document_id: &str,
        mut request: UpdateDocumentRequest,
    ) -> Result<DocumentResponse> {
        info!("Updating document: {}", document_id);

        if let Some(title) = request.title.as_mut() {
            *title = title.trim().to_string();
            if title.is_empty() {
                return Err(DocumentValidationError::EmptyTitle.into());
            }
        }
        if let Some(file_url) = request.file_url.as_mut() {
            *file_url = file_url.trim().to_string();
            if file_url.is_empty() {
                return Err(DocumentValidationError::EmptyFileUrl.into());
            }
        }

        let document = self.documents.update(document_id, request).await?;
        Ok(DocumentResponse {
            document,
            success_message: "Document updated successfully".to_string(),
        })
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<DeleteResponse> {
        info!("Deleting document: {}", document_id);

        let deleted = self.documents.delete(document_id).await?;
        if !deleted {
            warn!("Document {} was already gone", document_id);
        }
        Ok(DeleteResponse {
            deleted,
            success_message: if deleted {
                "Document deleted successfully".to_string()
            } else {
                "Document was already deleted".to_string()
            },
        })
    }

    /// Filtered document list plus the tab counts of the documents screen
    pub async fn view_documents(&self, user_id: &str, filter: &DocumentFilter) -> Result<DocumentViewResponse> {
        self.view_documents_at(user_id, filter, Utc::now()).await
    }

    pub async fn view_documents_at(
        &self,
        user_id: &str,
        filter: &DocumentFilter,
        now: DateTime<Utc>,
    ) -> Result<DocumentViewResponse> {
        info!("Viewing documents for user {} with filter {:?}", user_id, filter);

        let all = self.documents.get_all(user_id).await?;
        let counts = count_documents(&all, now);
        let documents = filter_documents(all, filter, now);

        Ok(DocumentViewResponse { documents, counts })
    }
}

fn is_recent(document: &Document, now: DateTime<Utc>) -> bool {
    document.created_at > now - Duration::days(RECENT_DAYS)
}

pub fn filter_documents(documents: Vec<Document>, filter: &DocumentFilter, now: DateTime<Utc>) -> Vec<Document> {
    let search = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let scope = ChildScope::parse(filter.child.as_deref());

    documents
        .into_iter()
        .filter(|doc| {
            search
                .as_ref()
                .map_or(true, |needle| doc.title.to_lowercase().contains(needle))
        })
        .filter(|doc| filter.category.map_or(true, |c| doc.category == Some(c)))
        .filter(|doc| scope.matches(doc.child_id.as_deref()))
        .filter(|doc| match filter.tab {
            DocumentTab::All => true,
            DocumentTab::Recent => is_recent(doc, now),
            DocumentTab::Medical => doc.category == Some(DocumentCategory::Medical),
            DocumentTab::School => doc.category == Some(DocumentCategory::School),
        })
        .collect()
}

pub fn count_documents(documents: &[Document], now: DateTime<Utc>) -> DocumentCounts {
    let in_category = |category| documents.iter().filter(|d| d.category == Some(category)).count();
    DocumentCounts {
        all: documents.len(),
        recent: documents.iter().filter(|d| is_recent(d, now)).count(),
        medical: in_category(DocumentCategory::Medical),
        school: in_category(DocumentCategory::School),
    }
}
