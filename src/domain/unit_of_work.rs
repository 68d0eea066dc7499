//! Unit of work contract

use async_trait::async_trait;

use super::repositories::{
    CourseRepository, DepartmentRepository, EnrollmentRepository, StudentRepository,
};
use super::{Cancellation, DomainError};

/// Atomic boundary over every repository of one session.
///
/// Use one instance per logical request: repositories handed out here share
/// its staged changes, and `save_changes` applies all of them in a single
/// transaction or none at all.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn students(&self) -> &dyn StudentRepository;
    fn departments(&self) -> &dyn DepartmentRepository;
    fn courses(&self) -> &dyn CourseRepository;
    fn enrollments(&self) -> &dyn EnrollmentRepository;

    /// Commit every staged change. Returns the number of affected records.
    ///
    /// On failure the transaction is rolled back, the original error is
    /// returned and the staged changes stay pending.
    async fn save_changes(&self, cancel: &Cancellation) -> Result<u64, DomainError>;

    /// Drop staged changes and tracked snapshots.
    fn discard_changes(&self);

    fn has_changes(&self) -> bool;
}
