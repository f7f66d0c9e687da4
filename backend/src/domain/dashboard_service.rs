use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::info;

use crate::domain::event_service::{count_this_week, upcoming};
use crate::domain::models::is_overdue;
use crate::storage::Storage;
use shared::{DashboardSummary, Task};

/// How many events and tasks the dashboard lists
const DASHBOARD_LIST_LIMIT: usize = 5;

/// Service that aggregates the home screen numbers across all collections
#[derive(Clone)]
pub struct DashboardService {
    storage: Storage,
}

impl DashboardService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn summary(&self, user_id: &str) -> Result<DashboardSummary> {
        self.summary_on(user_id, Local::now().date_naive()).await
    }

    pub async fn summary_on(&self, user_id: &str, today: NaiveDate) -> Result<DashboardSummary> {
        info!("Building dashboard for user {} on {}", user_id, today);

        let children = self.storage.children.get_all(user_id).await?;
        let tasks = self.storage.tasks.get_all(user_id).await?;
        let documents = self.storage.documents.get_all(user_id).await?;
        let events = self.storage.events.get_all(user_id).await?;

        let upcoming = upcoming(events, today);
        let events_this_week = count_this_week(&upcoming, today);

        let overdue_tasks = tasks.iter().filter(|t| is_overdue(t, today)).count();
        let mut pending: Vec<Task> = tasks.into_iter().filter(|t| !t.is_completed).collect();
        let pending_tasks = pending.len();

        // Dated tasks first, soonest due; undated ones keep list order after them
        pending.sort_by_key(|task| (task.due_date.is_none(), task.due_date));
        pending.truncate(DASHBOARD_LIST_LIMIT);

        Ok(DashboardSummary {
            children_count: children.len(),
            pending_tasks,
            overdue_tasks,
            documents_count: documents.len(),
            events_this_week,
            upcoming_events: upcoming
                .into_iter()
                .take(DASHBOARD_LIST_LIMIT)
                .map(|(_, event)| event)
                .collect(),
            tasks_due_soon: pending,
        })
    }
}
