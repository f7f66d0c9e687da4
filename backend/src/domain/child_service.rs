use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{info, warn};

use crate::domain::models::child::MAX_NAME_LENGTH;
use crate::domain::models::{age_on, initials, ChildValidationError};
use crate::storage::Storage;
use shared::{
    Child, ChildListResponse, ChildProfile, ChildResponse, CreateChildRequest, DeleteResponse,
    UpdateChildRequest,
};

/// Service for managing child profiles
#[derive(Clone)]
pub struct ChildService {
    storage: Storage,
}

impl ChildService {
    /// Create a new ChildService. Needs the whole storage because deleting
    /// a child unlinks the records that referenced it.
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a new child
    pub async fn create_child(&self, mut request: CreateChildRequest) -> Result<ChildResponse> {
        info!("Creating child: name={}, user={}", request.name, request.user_id);

        request.name = request.name.trim().to_string();
        self.validate_name(&request.name)?;
        if let Some(birth_date) = request.birth_date {
            self.validate_birth_date(birth_date, Local::now().date_naive())?;
        }

        let child = self.storage.children.create(request).await?;
        info!("Created child: {} with ID: {}", child.name, child.id);

        Ok(ChildResponse {
            child,
            success_message: "Child created successfully".to_string(),
        })
    }

    /// Get a child by ID
    pub async fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        info!("Getting child: {}", child_id);

        let child = self.storage.children.get(child_id).await?;
        if child.is_none() {
            warn!("Child not found: {}", child_id);
        }
        Ok(child)
    }

    /// List a user's children with their age and initials as of today
    pub async fn list_children(&self, user_id: &str) -> Result<ChildListResponse> {
        self.list_children_on(user_id, Local::now().date_naive()).await
    }

    pub async fn list_children_on(&self, user_id: &str, today: NaiveDate) -> Result<ChildListResponse> {
        info!("Listing children for user {}", user_id);

        let children: Vec<ChildProfile> = self
            .storage
            .children
            .get_all(user_id)
            .await?
            .into_iter()
            .map(|child| Self::profile(child, today))
            .collect();

        info!("Found {} children", children.len());
        Ok(ChildListResponse { children })
    }

    /// Update an existing child
    pub async fn update_child(
        &self,
        child_id: &str,
        mut request: UpdateChildRequest,
    ) -> Result<ChildResponse> {
        info!("Updating child: {}", child_id);

        if let Some(name) = request.name.as_mut() {
            *name = name.trim().to_string();
            self.validate_name(name)?;
        }
        if let Some(Some(birth_date)) = request.birth_date {
            self.validate_birth_date(birth_date, Local::now().date_naive())?;
        }

        let child = self.storage.children.update(child_id, request).await?;
        info!("Updated child: {} with ID: {}", child.name, child.id);

        Ok(ChildResponse {
            child,
            success_message: "Child updated successfully".to_string(),
        })
    }

    /// Delete a child and clear `child_id` on its owner's records that pointed at it
    pub async fn delete_child(&self, child_id: &str) -> Result<DeleteResponse> {
        info!("Deleting child: {}", child_id);

        let owner = match self.storage.children.get(child_id).await? {
            Some(child) => child.user_id,
            None => {
                warn!("Child {} was already gone", child_id);
                return Ok(DeleteResponse {
                    deleted: false,
                    success_message: "Child was already deleted".to_string(),
                });
            }
        };

        let deleted = self.storage.children.delete(child_id).await?;

        let unlinked = self.storage.events.unlink_child(&owner, child_id).await?
            + self.storage.tasks.unlink_child(&owner, child_id).await?
            + self.storage.documents.unlink_child(&owner, child_id).await?
            + self.storage.notes.unlink_child(&owner, child_id).await?;
        info!("Deleted child {}, unlinked {} records", child_id, unlinked);

        Ok(DeleteResponse {
            deleted,
            success_message: "Child deleted successfully".to_string(),
        })
    }

    /// Decorate a child with the values shown on its profile card
    pub fn profile(child: Child, today: NaiveDate) -> ChildProfile {
        let age = child.birth_date.and_then(|birth| age_on(birth, today));
        let initials = initials(&child.name);
        ChildProfile {
            child,
            age,
            initials,
        }
    }

    fn validate_name(&self, name: &str) -> Result<(), ChildValidationError> {
        if name.is_empty() {
            return Err(ChildValidationError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ChildValidationError::NameTooLong);
        }
        Ok(())
    }

    fn validate_birth_date(&self, birth_date: NaiveDate, today: NaiveDate) -> Result<(), ChildValidationError> {
        if birth_date > today {
            return Err(ChildValidationError::BirthDateInFuture);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::{memory_storage, sqlite_storage};
    use crate::storage::StoreError;
    use shared::{CreateDocumentRequest, CreateNoteRequest, CreateTaskRequest};

    fn emma() -> CreateChildRequest {
        CreateChildRequest {
            user_id: "u1".to_string(),
            name: "  Emma Johnson ".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2015, 3, 15),
            school: Some("Lincoln Elementary".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_child() {
        let service = ChildService::new(sqlite_storage().await);

        let response = service.create_child(emma()).await.expect("Failed to create child");

        assert_eq!(response.child.name, "Emma Johnson");
        assert_eq!(response.child.user_id, "u1");
        assert!(response.child.id.starts_with("child::"));
        assert_eq!(response.child.grade, None);
        assert_eq!(response.success_message, "Child created successfully");
    }

    #[tokio::test]
    async fn test_create_child_validation() {
        let service = ChildService::new(memory_storage());

        let mut request = emma();
        request.name = "   ".to_string();
        let err = service.create_child(request).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChildValidationError>(),
            Some(ChildValidationError::EmptyName)
        ));

        let mut request = emma();
        request.name = "x".repeat(101);
        assert!(service.create_child(request).await.is_err());

        let mut request = emma();
        request.birth_date = Some(Local::now().date_naive() + chrono::Duration::days(1));
        assert!(service.create_child(request).await.is_err());
    }

    #[tokio::test]
    async fn test_list_children_includes_age_and_initials() {
        let service = ChildService::new(memory_storage());
        service.create_child(emma()).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let response = service.list_children_on("u1", today).await.unwrap();
        assert_eq!(response.children.len(), 1);
        assert_eq!(response.children[0].age, Some(9));
        assert_eq!(response.children[0].initials, "EJ");

        assert!(service.list_children("u2").await.unwrap().children.is_empty());
    }

    #[tokio::test]
    async fn test_update_child() {
        let service = ChildService::new(memory_storage());
        let created = service.create_child(emma()).await.unwrap().child;

        let response = service
            .update_child(
                &created.id,
                UpdateChildRequest {
                    grade: Some(Some("4th".to_string())),
                    school: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(response.child.grade.as_deref(), Some("4th"));
        assert_eq!(response.child.school, None);

        let blank = UpdateChildRequest {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(service.update_child(&created.id, blank).await.is_err());
    }

    #[tokio::test]
    async fn test_update_nonexistent_child() {
        let service = ChildService::new(memory_storage());
        let err = service
            .update_child("child::missing", UpdateChildRequest::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::not_found("children", "child::missing"))
        );
    }

    #[tokio::test]
    async fn test_delete_child_unlinks_records() {
        let storage = sqlite_storage().await;
        let service = ChildService::new(storage.clone());
        let child = service.create_child(emma()).await.unwrap().child;

        let task = storage
            .tasks
            .create(CreateTaskRequest {
                user_id: "u1".to_string(),
                child_id: Some(child.id.clone()),
                title: "Book report".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let document = storage
            .documents
            .create(CreateDocumentRequest {
                user_id: "u1".to_string(),
                child_id: Some(child.id.clone()),
                title: "Vaccination record".to_string(),
                file_url: "file:///docs/vaccines.pdf".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let response = service.delete_child(&child.id).await.unwrap();
        assert!(response.deleted);
        assert!(service.get_child(&child.id).await.unwrap().is_none());

        let task = storage.tasks.get(&task.id).await.unwrap().unwrap();
        assert_eq!(task.child_id, None);
        let document = storage.documents.get(&document.id).await.unwrap().unwrap();
        assert_eq!(document.child_id, None);

        // Deleting again succeeds without removing anything
        let response = service.delete_child(&child.id).await.unwrap();
        assert!(!response.deleted);
    }

    #[tokio::test]
    async fn test_delete_child_unlinks_the_owners_records() {
        let storage = memory_storage();
        let service = ChildService::new(storage.clone());
        let mut request = emma();
        request.user_id = "parent-1".to_string();
        let child = service.create_child(request).await.unwrap().child;

        let task = storage
            .tasks
            .create(CreateTaskRequest {
                user_id: "parent-1".to_string(),
                child_id: Some(child.id.clone()),
                title: "Permission slip".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let note = storage
            .notes
            .create(CreateNoteRequest {
                user_id: "parent-1".to_string(),
                child_id: Some(child.id.clone()),
                content: "Peanut allergy".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(service.delete_child(&child.id).await.unwrap().deleted);

        assert_eq!(storage.tasks.get(&task.id).await.unwrap().unwrap().child_id, None);
        assert_eq!(storage.notes.get(&note.id).await.unwrap().unwrap().child_id, None);
    }
}
