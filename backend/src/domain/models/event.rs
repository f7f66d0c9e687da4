use chrono::{DateTime, Datelike, Duration, NaiveDate, SubsecRound, Utc};
use std::cmp::Ordering;

use super::{clean, clean_patch};
use crate::storage::traits::{ChildLinked, Entity};
use shared::{CreateEventRequest, Event, RecurrencePattern, UpdateEventRequest};

/// How far ahead `next_occurrence` searches, a little over four years so
/// that yearly events on Feb 29 are found
const OCCURRENCE_SEARCH_DAYS: i64 = 366 * 4;

impl Entity for Event {
    type Draft = CreateEventRequest;
    type Patch = UpdateEventRequest;

    const COLLECTION: &'static str = "events";
    const ID_PREFIX: &'static str = "event";

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

    fn from_draft(id: String, draft: CreateEventRequest, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(6);
        let mut event = Event {
            id,
            user_id: draft.user_id,
            child_id: clean(draft.child_id),
            title: draft.title,
            description: clean(draft.description),
            event_type: draft.event_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            location: clean(draft.location),
            is_recurring: draft.is_recurring,
            recurrence_pattern: draft.recurrence_pattern,
            priority: draft.priority.unwrap_or_default(),
            status: draft.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        normalize_recurrence(&mut event);
        event
    }

    fn apply_patch(&mut self, patch: UpdateEventRequest) {
        if let Some(child_id) = clean_patch(patch.child_id) {
            self.child_id = child_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = clean_patch(patch.description) {
            self.description = description;
        }
        if let Some(event_type) = patch.event_type {
            self.event_type = event_type;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        if let Some(location) = clean_patch(patch.location) {
            self.location = location;
        }
        if let Some(is_recurring) = patch.is_recurring {
            self.is_recurring = is_recurring;
        }
        if let Some(pattern) = patch.recurrence_pattern {
            self.recurrence_pattern = pattern;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        normalize_recurrence(self);
    }

    /// Earliest start date first; same-day events in creation order
    fn listing_order(a: &Self, b: &Self) -> Ordering {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl ChildLinked for Event {
    fn child_id(&self) -> Option<&str> {
        self.child_id.as_deref()
    }

    fn unlink_child_patch() -> UpdateEventRequest {
        UpdateEventRequest {
            child_id: Some(None),
            ..Default::default()
        }
    }
}

/// A pattern is only kept for recurring events; recurring events without
/// one repeat weekly
fn normalize_recurrence(event: &mut Event) {
    if !event.is_recurring {
        event.recurrence_pattern = None;
    } else if event.recurrence_pattern.is_none() {
        event.recurrence_pattern = Some(RecurrencePattern::Weekly);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventValidationError {
    #[error("Event title cannot be empty")]
    EmptyTitle,
    #[error("Event end date {end} is before its start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Whether the event falls on `date`
///
/// A one-off event covers every day from its start date through its end
/// date (or just the start date). A recurring event repeats from its start
/// date on, with no end.
pub fn occurs_on(event: &Event, date: NaiveDate) -> bool {
    if date < event.start_date {
        return false;
    }

    let start = event.start_date;
    match (event.is_recurring, event.recurrence_pattern) {
        (true, Some(RecurrencePattern::Daily)) => true,
        (true, Some(RecurrencePattern::Weekly)) => date.weekday() == start.weekday(),
        (true, Some(RecurrencePattern::Monthly)) => date.day() == start.day(),
        (true, Some(RecurrencePattern::Yearly)) => {
            date.month() == start.month() && date.day() == start.day()
        }
        _ => date <= event.end_date.unwrap_or(start).max(start),
    }
}

/// First date on or after `from` on which the event occurs
pub fn next_occurrence(event: &Event, from: NaiveDate) -> Option<NaiveDate> {
    let first = from.max(event.start_date);
    (0..=OCCURRENCE_SEARCH_DAYS)
        .map(|offset| first + Duration::days(offset))
        .find(|date| occurs_on(event, *date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{EventStatus, EventType, Priority};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(start: NaiveDate) -> CreateEventRequest {
        CreateEventRequest {
            user_id: "u1".to_string(),
            child_id: None,
            title: "Soccer practice".to_string(),
            description: None,
            event_type: EventType::Activity,
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

    fn recurring(start: NaiveDate, pattern: RecurrencePattern) -> Event {
        let mut request = draft(start);
        request.is_recurring = true;
        request.recurrence_pattern = Some(pattern);
        Event::from_draft("event::1".to_string(), request, Utc::now())
    }

    #[test]
    fn test_from_draft_applies_defaults() {
        let mut request = draft(date(2025, 9, 1));
        request.recurrence_pattern = Some(RecurrencePattern::Daily);
        request.location = Some(" ".to_string());
        let event = Event::from_draft("event::1".to_string(), request, Utc::now());

        assert_eq!(event.priority, Priority::Medium);
        assert_eq!(event.status, EventStatus::Upcoming);
        assert_eq!(event.recurrence_pattern, None);
        assert_eq!(event.location, None);
    }

    #[test]
    fn test_recurring_without_pattern_repeats_weekly() {
        let mut request = draft(date(2025, 9, 1));
        request.is_recurring = true;
        let event = Event::from_draft("event::1".to_string(), request, Utc::now());
        assert_eq!(event.recurrence_pattern, Some(RecurrencePattern::Weekly));
    }

    #[test]
    fn test_patch_turning_off_recurrence_clears_pattern() {
        let mut event = recurring(date(2025, 9, 1), RecurrencePattern::Monthly);
        event.apply_patch(UpdateEventRequest {
            is_recurring: Some(false),
            ..Default::default()
        });
        assert!(!event.is_recurring);
        assert_eq!(event.recurrence_pattern, None);
    }

    #[test]
    fn test_one_off_event_spans_start_to_end() {
        let mut request = draft(date(2025, 7, 10));
        request.end_date = Some(date(2025, 7, 12));
        let camp = Event::from_draft("event::1".to_string(), request, Utc::now());

        assert!(!occurs_on(&camp, date(2025, 7, 9)));
        assert!(occurs_on(&camp, date(2025, 7, 10)));
        assert!(occurs_on(&camp, date(2025, 7, 12)));
        assert!(!occurs_on(&camp, date(2025, 7, 13)));

        let single = Event::from_draft("event::2".to_string(), draft(date(2025, 7, 10)), Utc::now());
        assert!(occurs_on(&single, date(2025, 7, 10)));
        assert!(!occurs_on(&single, date(2025, 7, 11)));
    }

    #[test]
    fn test_recurrence_patterns() {
        // 2025-09-01 is a Monday
        let weekly = recurring(date(2025, 9, 1), RecurrencePattern::Weekly);
        assert!(occurs_on(&weekly, date(2025, 9, 8)));
        assert!(!occurs_on(&weekly, date(2025, 9, 9)));
        assert!(!occurs_on(&weekly, date(2025, 8, 25)));

        let monthly = recurring(date(2025, 1, 31), RecurrencePattern::Monthly);
        assert!(occurs_on(&monthly, date(2025, 3, 31)));
        assert!(!occurs_on(&monthly, date(2025, 2, 28)));

        let yearly = recurring(date(2015, 3, 15), RecurrencePattern::Yearly);
        assert!(occurs_on(&yearly, date(2025, 3, 15)));
        assert!(!occurs_on(&yearly, date(2025, 4, 15)));

        let daily = recurring(date(2025, 9, 1), RecurrencePattern::Daily);
        assert!(occurs_on(&daily, date(2026, 1, 1)));
    }

    #[test]
    fn test_next_occurrence() {
        let weekly = recurring(date(2025, 9, 1), RecurrencePattern::Weekly);
        assert_eq!(next_occurrence(&weekly, date(2025, 9, 3)), Some(date(2025, 9, 8)));
        assert_eq!(next_occurrence(&weekly, date(2025, 1, 1)), Some(date(2025, 9, 1)));

        let leap = recurring(date(2024, 2, 29), RecurrencePattern::Yearly);
        assert_eq!(next_occurrence(&leap, date(2024, 3, 1)), Some(date(2028, 2, 29)));

        let past = Event::from_draft("event::2".to_string(), draft(date(2025, 1, 1)), Utc::now());
        assert_eq!(next_occurrence(&past, date(2025, 6, 1)), None);
    }

    #[test]
    fn test_listing_order_by_start_date() {
        let now = Utc::now();
        let early = Event::from_draft("event::b".to_string(), draft(date(2025, 1, 1)), now);
        let late = Event::from_draft("event::a".to_string(), draft(date(2025, 2, 1)), now);
        assert_eq!(Event::listing_order(&early, &late), Ordering::Less);
    }
}
