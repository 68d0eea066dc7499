//! Enrollment domain entities
//!
//! Plain records with no persistence framework attached. Relationships are
//! expressed by foreign keys only; related rows are fetched explicitly through
//! the repositories' eager-load operations.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::query::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub enrollment_date: DateTime<Utc>,
}

impl Student {
    /// New student with a freshly generated identity.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        enrollment_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            enrollment_date,
        }
    }

    /// Rebuild a student that already has an identity (loaded from the store).
    pub(crate) fn restore(
        id: Uuid,
        first_name: String,
        last_name: String,
        enrollment_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            enrollment_date,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Filter applied to student listings
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Keep students whose enrollment date is strictly after this instant
    pub enrolled_after: Option<DateTime<Utc>>,
}

impl Record for Student {
    type Key = Uuid;
    type Filter = StudentFilter;

    fn key(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn matches(&self, filter: &StudentFilter) -> bool {
        filter
            .enrolled_after
            .is_none_or(|after| self.enrollment_date > after)
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        self.last_name
            .cmp(&other.last_name)
            .then_with(|| self.first_name.cmp(&other.first_name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Assigned by the store on commit
    pub id: Option<i32>,
    pub name: String,
}

impl Department {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Record for Department {
    type Key = i32;
    type Filter = ();

    fn key(&self) -> Option<i32> {
        self.id
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        unsaved_last(self.id, other.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Assigned by the store on commit
    pub id: Option<i32>,
    pub title: String,
    pub department_id: i32,
}

impl Course {
    pub fn new(title: impl Into<String>, department_id: i32) -> Self {
        Self {
            id: None,
            title: title.into(),
            department_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub department_id: Option<i32>,
}

impl Record for Course {
    type Key = i32;
    type Filter = CourseFilter;

    fn key(&self) -> Option<i32> {
        self.id
    }

    fn matches(&self, filter: &CourseFilter) -> bool {
        filter
            .department_id
            .is_none_or(|id| self.department_id == id)
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        unsaved_last(self.id, other.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: Uuid,
    pub course_id: i32,
    pub enrolled_on: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(student_id: Uuid, course_id: i32, enrolled_on: DateTime<Utc>) -> Self {
        Self {
            student_id,
            course_id,
            enrolled_on,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub student_id: Option<Uuid>,
    pub course_id: Option<i32>,
}

impl Record for Enrollment {
    type Key = (Uuid, i32);
    type Filter = EnrollmentFilter;

    fn key(&self) -> Option<(Uuid, i32)> {
        Some((self.student_id, self.course_id))
    }

    fn matches(&self, filter: &EnrollmentFilter) -> bool {
        filter.student_id.is_none_or(|id| self.student_id == id)
            && filter.course_id.is_none_or(|id| self.course_id == id)
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        (self.student_id, self.course_id).cmp(&(other.student_id, other.course_id))
    }
}

// Rows without a store-assigned id sort after every stored row.
fn unsaved_last(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
