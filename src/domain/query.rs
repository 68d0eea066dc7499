//! Lazy read queries
//!
//! `Query` is a handle over a repository: filters and paging compose on it,
//! and nothing reaches the store until it is materialized with `to_list`,
//! `count` or `first`.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entities::{Course, Enrollment, Student};
use super::{Cancellation, DomainError};

/// Whether read results register in the session's change set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tracking {
    /// Snapshots are kept so later updates write only changed columns
    Tracked,
    /// Plain read-only snapshots
    #[default]
    Detached,
}

/// One-based page of a stable listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u64,
    size: u64,
}

impl Page {
    pub fn new(number: u64, size: u64) -> Result<Self, DomainError> {
        if number < 1 {
            return Err(DomainError::validation("page number must be at least 1"));
        }
        if size == 0 {
            return Err(DomainError::validation("page size must be greater than 0"));
        }
        Ok(Self { number, size })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// OFFSET and LIMIT as the store can bind them (signed 64-bit), or `None`
    /// when the page starts past any row the store could hold.
    pub fn bounds(&self) -> Option<(u64, u64)> {
        const MAX_BIND: u64 = i64::MAX as u64;
        let offset = self.offset();
        if offset > MAX_BIND {
            return None;
        }
        Some((offset, self.size.min(MAX_BIND)))
    }

    /// Slice an already ordered listing.
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        rows.into_iter().skip(offset).take(size).collect()
    }
}

/// An entity that repositories can list, stage and track
pub trait Record: Debug + Clone + Send + Sync + 'static {
    type Key: Debug + Clone + Eq + Hash + Send + Sync + 'static;
    type Filter: Debug + Clone + Default + Send + Sync + 'static;

    /// Identity, or `None` while the store has not assigned one yet
    fn key(&self) -> Option<Self::Key>;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Stable listing order; the store-side ORDER BY must agree with it
    fn listing_order(&self, other: &Self) -> Ordering;
}

/// Everything needed to execute a listing
#[derive(Debug, Clone)]
pub struct Criteria<T: Record> {
    pub tracking: Tracking,
    pub filter: T::Filter,
    pub page: Option<Page>,
}

impl<T: Record> Criteria<T> {
    pub fn new(tracking: Tracking) -> Self {
        Self {
            tracking,
            filter: T::Filter::default(),
            page: None,
        }
    }
}

/// Executes listings for one entity type
#[async_trait]
pub trait QuerySource<T: Record>: Send + Sync {
    async fn fetch(
        &self,
        criteria: &Criteria<T>,
        cancel: &Cancellation,
    ) -> Result<Vec<T>, DomainError>;

    async fn count(&self, criteria: &Criteria<T>, cancel: &Cancellation)
    -> Result<u64, DomainError>;
}

pub struct Query<'a, T: Record> {
    source: &'a dyn QuerySource<T>,
    criteria: Criteria<T>,
}

impl<'a, T: Record> Query<'a, T> {
    pub fn new(source: &'a dyn QuerySource<T>, tracking: Tracking) -> Self {
        Self {
            source,
            criteria: Criteria::new(tracking),
        }
    }

    pub fn filter(mut self, filter: T::Filter) -> Self {
        self.criteria.filter = filter;
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.criteria.page = Some(page);
        self
    }

    pub async fn to_list(self, cancel: &Cancellation) -> Result<Vec<T>, DomainError> {
        self.source.fetch(&self.criteria, cancel).await
    }

    /// Number of matching rows, ignoring paging.
    pub async fn count(self, cancel: &Cancellation) -> Result<u64, DomainError> {
        let mut criteria = self.criteria;
        criteria.page = None;
        self.source.count(&criteria, cancel).await
    }

    pub async fn first(mut self, cancel: &Cancellation) -> Result<Option<T>, DomainError> {
        self.criteria.page = Some(Page { number: 1, size: 1 });
        Ok(self.source.fetch(&self.criteria, cancel).await?.into_iter().next())
    }
}

impl Query<'_, Student> {
    pub fn enrolled_after(mut self, date: DateTime<Utc>) -> Self {
        self.criteria.filter.enrolled_after = Some(date);
        self
    }
}

impl Query<'_, Course> {
    pub fn in_department(mut self, department_id: i32) -> Self {
        self.criteria.filter.department_id = Some(department_id);
        self
    }
}

impl Query<'_, Enrollment> {
    pub fn for_student(mut self, student_id: Uuid) -> Self {
        self.criteria.filter.student_id = Some(student_id);
        self
    }

    pub fn for_course(mut self, course_id: i32) -> Self {
        self.criteria.filter.course_id = Some(course_id);
        self
    }
}
