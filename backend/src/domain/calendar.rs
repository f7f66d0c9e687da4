//! Calendar domain logic for the household organizer.
//!
//! Builds the month grid shown by the calendar screen and keeps track of
//! which month the screen is focused on. Events are placed on every day
//! they occur, recurring events included.

use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info};
use std::sync::{Arc, Mutex};

use crate::domain::models::occurs_on;
use shared::{CalendarDay, CalendarDayType, CalendarFocusDate, CalendarMonth, Event};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    #[error("Invalid month: {0}. Must be between 1 and 12")]
    InvalidMonth(u32),
    #[error("Invalid year: {0}")]
    InvalidYear(u32),
}

/// Calendar service that handles all calendar-related business logic
#[derive(Clone)]
pub struct CalendarService {
    /// Month the calendar screen is showing. Session only, never persisted.
    current_focus_date: Arc<Mutex<CalendarFocusDate>>,
}

impl CalendarService {
    /// Create a service focused on the current month
    pub fn new() -> Self {
        let today = Local::now().date_naive();
        Self {
            current_focus_date: Arc::new(Mutex::new(CalendarFocusDate {
                month: today.month(),
                year: today.year() as u32,
            })),
        }
    }

    /// Generate the month grid with the events occurring on each day
    pub fn generate_calendar_month(
        &self,
        month: u32,
        year: u32,
        events: &[Event],
    ) -> Result<CalendarMonth, CalendarError> {
        let first_of_month = first_date(month, year)?;
        let days_in_month = self.days_in_month(month, year);
        let first_day = self.first_day_of_month(month, year);

        debug!(
            "Generating calendar for {}/{}: {} days, first weekday {}",
            month, year, days_in_month, first_day
        );

        let mut days = Vec::with_capacity((first_day + days_in_month) as usize);

        for _ in 0..first_day {
            days.push(CalendarDay {
                day: 0,
                date: None,
                events: Vec::new(),
                day_type: CalendarDayType::PaddingBefore,
            });
        }

        for (day, date) in (1..=days_in_month).zip(first_of_month.iter_days()) {
            let day_events: Vec<Event> = events
                .iter()
                .filter(|event| occurs_on(event, date))
                .cloned()
                .collect();
            days.push(CalendarDay {
                day,
                date: Some(date),
                events: day_events,
                day_type: CalendarDayType::MonthDay,
            });
        }

        Ok(CalendarMonth {
            month,
            year,
            month_name: self.month_name(month).to_string(),
            days,
            first_day_of_week: first_day,
        })
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: u32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    pub fn is_leap_year(&self, year: u32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Weekday of the 1st (0 = Sunday, 1 = Monday, etc.)
    pub fn first_day_of_month(&self, month: u32, year: u32) -> u32 {
        first_date(month, year)
            .map(|date| date.weekday().num_days_from_sunday())
            .unwrap_or(0)
    }

    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            12 => "December",
            _ => "Invalid Month",
        }
    }

    pub fn previous_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month <= 1 {
            (12, current_year.saturating_sub(1))
        } else {
            (current_month - 1, current_year)
        }
    }

    pub fn next_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month >= 12 {
            (1, current_year + 1)
        } else {
            (current_month + 1, current_year)
        }
    }

    pub fn get_focus_date(&self) -> CalendarFocusDate {
        *self
            .current_focus_date
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_focus_date(&self, month: u32, year: u32) -> Result<CalendarFocusDate, CalendarError> {
        first_date(month, year)?;

        let focus_date = CalendarFocusDate { month, year };
        *self
            .current_focus_date
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = focus_date;

        info!("Calendar focus set to {}/{}", month, year);
        Ok(focus_date)
    }

    pub fn navigate_previous_month(&self) -> CalendarFocusDate {
        self.shift_focus(|month, year| self.previous_month(month, year))
    }

    pub fn navigate_next_month(&self) -> CalendarFocusDate {
        self.shift_focus(|month, year| self.next_month(month, year))
    }

    fn shift_focus(&self, step: impl Fn(u32, u32) -> (u32, u32)) -> CalendarFocusDate {
        let mut focus = self
            .current_focus_date
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (month, year) = step(focus.month, focus.year);
        *focus = CalendarFocusDate { month, year };
        info!("Calendar focus moved to {}/{}", month, year);
        *focus
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}

fn first_date(month: u32, year: u32) -> Result<NaiveDate, CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth(month));
    }
    let signed_year = i32::try_from(year).map_err(|_| CalendarError::InvalidYear(year))?;
    NaiveDate::from_ymd_opt(signed_year, month, 1).ok_or(CalendarError::InvalidYear(year))
}
