use anyhow::Result;
use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};

use crate::domain::models::{next_occurrence, EventValidationError};
use crate::storage::{EntityRepository, StoreError};
use shared::{
    CreateEventRequest, DeleteResponse, Event, EventListResponse, EventResponse, EventStatus,
    UpdateEventRequest,
};

/// Service for calendar events
#[derive(Clone)]
pub struct EventService {
    events: EntityRepository<Event>,
}

impl EventService {
    pub fn new(events: EntityRepository<Event>) -> Self {
        Self { events }
    }

    pub async fn create_event(&self, mut request: CreateEventRequest) -> Result<EventResponse> {
        info!("Creating event: title={}, start={}", request.title, request.start_date);

        request.title = request.title.trim().to_string();
        if request.title.is_empty() {
            return Err(EventValidationError::EmptyTitle.into());
        }
        validate_dates(request.start_date, request.end_date)?;

        let event = self.events.create(request).await?;
        info!("Created event: {} with ID: {}", event.title, event.id);

        Ok(EventResponse {
            event,
            success_message: "Event created successfully".to_string(),
        })
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Option<Event>> {
        info!("Getting event: {}", event_id);
        Ok(self.events.get(event_id).await?)
    }

    /// All of a user's events, earliest start date first
    pub async fn list_events(&self, user_id: &str) -> Result<EventListResponse> {
        info!("Listing events for user {}", user_id);
        let events = self.events.get_all(user_id).await?;
        Ok(EventListResponse { events })
    }

    pub async fn update_event(
        &self,
        event_id: &str,
        mut request: UpdateEventRequest,
    ) -> Result<EventResponse> {
        info!("Updating event: {}", event_id);

        if let Some(title) = request.title.as_mut() {
            *title = title.trim().to_string();
            if title.is_empty() {
                return Err(EventValidationError::EmptyTitle.into());
            }
        }

        // Dates are checked against the stored record when only one side changes
        if request.start_date.is_some() || matches!(request.end_date, Some(Some(_))) {
            let current = self
                .events
                .get(event_id)
                .await?
                .ok_or_else(|| StoreError::not_found("events", event_id))?;
            let start = request.start_date.unwrap_or(current.start_date);
            let end = match request.end_date {
                Some(end) => end,
                None => current.end_date,
            };
            validate_dates(start, end)?;
        }

        let event = self.events.update(event_id, request).await?;
        Ok(EventResponse {
            event,
            success_message: "Event updated successfully".to_string(),
        })
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<DeleteResponse> {
        info!("Deleting event: {}", event_id);

        let deleted = self.events.delete(event_id).await?;
        if !deleted {
            warn!("Event {} was already gone", event_id);
        }
        Ok(DeleteResponse {
            deleted,
            success_message: if deleted {
                "Event deleted successfully".to_string()
            } else {
                "Event was already deleted".to_string()
            },
        })
    }

    /// The next `limit` upcoming events from `from` on, soonest first
    pub async fn upcoming_events(
        &self,
        user_id: &str,
        from: NaiveDate,
        limit: usize,
    ) -> Result<EventListResponse> {
        let events = self.events.get_all(user_id).await?;
        let events = upcoming(events, from)
            .into_iter()
            .take(limit)
            .map(|(_, event)| event)
            .collect();
        Ok(EventListResponse { events })
    }
}

fn validate_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), EventValidationError> {
    match end {
        Some(end) if end < start => Err(EventValidationError::EndBeforeStart { start, end }),
        _ => Ok(()),
    }
}

/// Events with status `upcoming` paired with their next occurrence on or
/// after `from`, soonest first. Events with no further occurrence are dropped.
pub fn upcoming(events: Vec<Event>, from: NaiveDate) -> Vec<(NaiveDate, Event)> {
    let mut upcoming: Vec<(NaiveDate, Event)> = events
        .into_iter()
        .filter(|event| event.status == EventStatus::Upcoming)
        .filter_map(|event| next_occurrence(&event, from).map(|date| (date, event)))
        .collect();

    upcoming.sort_by(|(a_date, a), (b_date, b)| {
        a_date
            .cmp(b_date)
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    debug!("{} upcoming events from {}", upcoming.len(), from);
    upcoming
}

/// Number of upcoming events occurring within the seven days starting at `today`
pub fn count_this_week(upcoming: &[(NaiveDate, Event)], today: NaiveDate) -> usize {
    let last_day = today + Duration::days(6);
    upcoming.iter().filter(|(date, _)| *date <= last_day).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::memory_storage;
    use crate::storage::Entity;
    use chrono::{NaiveTime, Utc};
    use shared::{EventType, RecurrencePattern};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(title: &str, start: NaiveDate) -> CreateEventRequest {
        CreateEventRequest {
            user_id: "u1".to_string(),
            child_id: None,
            title: title.to_string(),
            description: None,
            event_type: EventType::Medical,
            start_date: start,
            end_date: None,
            start_time: None,
            end_time: None,
            location: None,
            is_recurring: false,
            recurrence_pattern: None,
            priority: None,
            status: None,
        }
    }

    fn setup_test() -> EventService {
        EventService::new(memory_storage().events)
    }

    #[tokio::test]
    async fn test_create_event_validation() {
        let service = setup_test();

        let err = service.create_event(request("  ", date(2025, 9, 1))).await.unwrap_err();
        assert!(err.downcast_ref::<EventValidationError>().is_some());

        let mut backwards = request("Camp", date(2025, 7, 10));
        backwards.end_date = Some(date(2025, 7, 9));
        let err = service.create_event(backwards).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EventValidationError>(),
            Some(EventValidationError::EndBeforeStart { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_checks_dates_against_stored_event() {
        let service = setup_test();
        let mut camp = request("Camp", date(2025, 7, 10));
        camp.end_date = Some(date(2025, 7, 12));
        let created = service.create_event(camp).await.unwrap().event;

        let moved = UpdateEventRequest {
            start_date: Some(date(2025, 7, 20)),
            ..Default::default()
        };
        assert!(service.update_event(&created.id, moved).await.is_err());

        let moved = UpdateEventRequest {
            start_date: Some(date(2025, 7, 20)),
            end_date: Some(None),
            ..Default::default()
        };
        let updated = service.update_event(&created.id, moved).await.unwrap().event;
        assert_eq!(updated.start_date, date(2025, 7, 20));
        assert_eq!(updated.end_date, None);

        let missing = UpdateEventRequest {
            start_date: Some(date(2025, 7, 20)),
            ..Default::default()
        };
        let err = service.update_event("event::missing", missing).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_upcoming_events() {
        let service = setup_test();
        let today = date(2025, 9, 3);

        service.create_event(request("Past checkup", date(2025, 9, 1))).await.unwrap();
        service.create_event(request("Dentist", date(2025, 9, 20))).await.unwrap();

        let mut piano = request("Piano lesson", date(2025, 9, 1));
        piano.is_recurring = true;
        piano.recurrence_pattern = Some(RecurrencePattern::Weekly);
        piano.start_time = NaiveTime::from_hms_opt(16, 0, 0);
        service.create_event(piano).await.unwrap();

        let mut cancelled = request("Cancelled recital", date(2025, 9, 4));
        cancelled.status = Some(EventStatus::Cancelled);
        service.create_event(cancelled).await.unwrap();

        let upcoming = service.upcoming_events("u1", today, 10).await.unwrap().events;
        let titles: Vec<&str> = upcoming.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Piano lesson", "Dentist"]);

        let limited = service.upcoming_events("u1", today, 1).await.unwrap().events;
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_count_this_week() {
        let today = date(2025, 9, 3);
        let event = Event::from_draft("event::1".to_string(), request("Any", today), Utc::now());
        let pairs = vec![
            (today, event.clone()),
            (date(2025, 9, 9), event.clone()),
            (date(2025, 9, 10), event),
        ];
        assert_eq!(count_this_week(&pairs, today), 2);
    }
}
