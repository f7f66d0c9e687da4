use chrono::{DateTime, Datelike, NaiveDate, SubsecRound, Utc};

use super::{clean, clean_patch};
use crate::storage::traits::Entity;
use shared::{Child, CreateChildRequest, UpdateChildRequest};

pub const MAX_NAME_LENGTH: usize = 100;

impl Entity for Child {
    type Draft = CreateChildRequest;
    type Patch = UpdateChildRequest;

    const COLLECTION: &'static str = "children";
    const ID_PREFIX: &'static str = "child";

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

    fn from_draft(id: String, draft: CreateChildRequest, now: DateTime<Utc>) -> Self {
        // Stores keep microseconds
        let now = now.trunc_subsecs(6);
        Child {
            id,
            user_id: draft.user_id,
            name: draft.name,
            birth_date: draft.birth_date,
            school: clean(draft.school),
            grade: clean(draft.grade),
            notes: clean(draft.notes),
            avatar_url: clean(draft.avatar_url),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: UpdateChildRequest) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(birth_date) = patch.birth_date {
            self.birth_date = birth_date;
        }
        if let Some(school) = clean_patch(patch.school) {
            self.school = school;
        }
        if let Some(grade) = clean_patch(patch.grade) {
            self.grade = grade;
        }
        if let Some(notes) = clean_patch(patch.notes) {
            self.notes = notes;
        }
        if let Some(avatar_url) = clean_patch(patch.avatar_url) {
            self.avatar_url = avatar_url;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChildValidationError {
    #[error("Child name cannot be empty")]
    EmptyName,
    #[error("Child name cannot be longer than 100 characters")]
    NameTooLong,
    #[error("Birth date cannot be in the future")]
    BirthDateInFuture,
}

/// Age in whole years on `today`. `None` when born after `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth_date > today {
        return None;
    }

    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

/// First letter of every word of the name, upper-cased
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_counts_completed_years() {
        let birth = date(2015, 3, 15);
        assert_eq!(age_on(birth, date(2025, 3, 14)), Some(9));
        assert_eq!(age_on(birth, date(2025, 3, 15)), Some(10));
        assert_eq!(age_on(birth, date(2025, 12, 1)), Some(10));
        assert_eq!(age_on(birth, birth), Some(0));
        assert_eq!(age_on(birth, date(2014, 1, 1)), None);
    }

    #[test]
    fn test_age_for_leap_day_birthday() {
        let birth = date(2016, 2, 29);
        assert_eq!(age_on(birth, date(2025, 2, 28)), Some(8));
        assert_eq!(age_on(birth, date(2025, 3, 1)), Some(9));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Emma Johnson"), "EJ");
        assert_eq!(initials("liam"), "L");
        assert_eq!(initials("  mary   ann  lee "), "MAL");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_from_draft_normalizes_optionals() {
        let now = Utc::now();
        let child = Child::from_draft(
            "child::1".to_string(),
            CreateChildRequest {
                user_id: "u1".to_string(),
                name: "Emma".to_string(),
                birth_date: Some(date(2015, 3, 15)),
                school: Some("   ".to_string()),
                ..Default::default()
            },
            now,
        );

        assert_eq!(child.school, None);
        assert_eq!(child.grade, None);
        assert_eq!(child.created_at, now);
        assert_eq!(child.updated_at, now);
    }

    #[test]
    fn test_apply_patch_clears_and_keeps_fields() {
        let mut child = Child::from_draft(
            "child::1".to_string(),
            CreateChildRequest {
                user_id: "u1".to_string(),
                name: "Emma".to_string(),
                school: Some("Lincoln".to_string()),
                grade: Some("4th".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );

        child.apply_patch(UpdateChildRequest {
            school: Some(None),
            ..Default::default()
        });

        assert_eq!(child.school, None);
        assert_eq!(child.grade.as_deref(), Some("4th"));
        assert_eq!(child.name, "Emma");
    }
}
