use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{info, warn};

use crate::domain::models::{is_overdue, ChildScope, TaskValidationError};
use crate::storage::{EntityRepository, StoreError};
use shared::{
    CreateTaskRequest, DeleteResponse, Task, TaskCounts, TaskFilter, TaskListResponse,
    TaskResponse, TaskStatusFilter, TaskViewResponse, UpdateTaskRequest,
};

/// Service for tasks and reminders
#[derive(Clone)]
pub struct TaskService {
    tasks: EntityRepository<Task>,
}

impl TaskService {
    pub fn new(tasks: EntityRepository<Task>) -> Self {
        Self { tasks }
    }

    pub async fn create_task(&self, mut request: CreateTaskRequest) -> Result<TaskResponse> {
        info!("Creating task: title={}", request.title);

        request.title = request.title.trim().to_string();
        if request.title.is_empty() {
            return Err(TaskValidationError::EmptyTitle.into());
        }

        let task = self.tasks.create(request).await?;
        info!("Created task: {} with ID: {}", task.title, task.id);

        Ok(TaskResponse {
            task,
            success_message: "Task created successfully".to_string(),
        })
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        info!("Getting task: {}", task_id);
        Ok(self.tasks.get(task_id).await?)
    }

    pub async fn list_tasks(&self, user_id: &str) -> Result<TaskListResponse> {
        info!("Listing tasks for user {}", user_id);
        let tasks = self.tasks.get_all(user_id).await?;
        Ok(TaskListResponse { tasks })
    }

    pub async fn update_task(&self, task_id: &str, mut request: UpdateTaskRequest) -> Result<TaskResponse> {
        info!("Updating task: {}", task_id);

        if let Some(title) = request.title.as_mut() {
            *title = title.trim().to_string();
            if title.is_empty() {
                return Err(TaskValidationError::EmptyTitle.into());
            }
        }

        let task = self.tasks.update(task_id, request).await?;
        Ok(TaskResponse {
            task,
            success_message: "Task updated successfully".to_string(),
        })
    }

    /// Flip a task between pending and completed
    pub async fn toggle_task(&self, task_id: &str) -> Result<TaskResponse> {
        let current = self
            .tasks
            .get(task_id)
            .await?
            .ok_or_else(|| StoreError::not_found("tasks", task_id))?;

        let completed = !current.is_completed;
        info!("Marking task {} as {}", task_id, if completed { "completed" } else { "pending" });

        let task = self
            .tasks
            .update(
                task_id,
                UpdateTaskRequest {
                    is_completed: Some(completed),
                    ..Default::default()
                },
            )
            .await?;

        Ok(TaskResponse {
            task,
            success_message: if completed {
                "Task completed".to_string()
            } else {
                "Task reopened".to_string()
            },
        })
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<DeleteResponse> {
        info!("Deleting task: {}", task_id);

        let deleted = self.tasks.delete(task_id).await?;
        if !deleted {
            warn!("Task {} was already gone", task_id);
        }
        Ok(DeleteResponse {
            deleted,
            success_message: if deleted {
                "Task deleted successfully".to_string()
            } else {
                "Task was already deleted".to_string()
            },
        })
    }

    /// Filtered task list plus the tab counts of the task screen
    pub async fn view_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<TaskViewResponse> {
        self.view_tasks_on(user_id, filter, Local::now().date_naive()).await
    }

    pub async fn view_tasks_on(
        &self,
        user_id: &str,
        filter: &TaskFilter,
        today: NaiveDate,
    ) -> Result<TaskViewResponse> {
        info!("Viewing tasks for user {} with filter {:?}", user_id, filter);

        let all = self.tasks.get_all(user_id).await?;
        let counts = count_tasks(&all, today);
        let tasks = filter_tasks(all, filter, today);

        Ok(TaskViewResponse { tasks, counts })
    }
}

/// Apply search, priority, child and status filters, keeping list order
pub fn filter_tasks(tasks: Vec<Task>, filter: &TaskFilter, today: NaiveDate) -> Vec<Task> {
    let search = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let scope = ChildScope::parse(filter.child.as_deref());

    tasks
        .into_iter()
        .filter(|task| match &search {
            None => true,
            Some(needle) => {
                task.title.to_lowercase().contains(needle)
                    || task
                        .description
                        .as_deref()
                        .map_or(false, |d| d.to_lowercase().contains(needle))
            }
        })
        .filter(|task| filter.priority.map_or(true, |p| task.priority == p))
        .filter(|task| scope.matches(task.child_id.as_deref()))
        .filter(|task| match filter.status {
            TaskStatusFilter::All => true,
            TaskStatusFilter::Pending => !task.is_completed,
            TaskStatusFilter::Completed => task.is_completed,
            TaskStatusFilter::Overdue => is_overdue(task, today),
        })
        .collect()
}

pub fn count_tasks(tasks: &[Task], today: NaiveDate) -> TaskCounts {
    TaskCounts {
        all: tasks.len(),
        pending: tasks.iter().filter(|t| !t.is_completed).count(),
        completed: tasks.iter().filter(|t| t.is_completed).count(),
        overdue: tasks.iter().filter(|t| is_overdue(t, today)).count(),
    }
}
