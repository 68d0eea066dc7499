//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::dto::{
    CourseEnrollmentCount, DepartmentWithCoursesDto, EnrollmentYearGroup, StudentCourseDto,
    StudentWithEnrollmentsDto,
};
use super::entities::{Course, Department, Enrollment, Student};
use super::query::{Page, Query, QuerySource, Record, Tracking};
use super::{Cancellation, DomainError};

/// CRUD surface shared by every entity repository.
///
/// Mutations are staged in the owning unit of work and only reach the store
/// when it saves.
#[async_trait]
pub trait Repository<T: Record>: QuerySource<T> {
    /// Lazy listing of every entity of this type
    fn get_all(&self, tracking: Tracking) -> Query<'_, T>;

    /// Point lookup; `None` when nothing has that identity
    async fn get_by_id(
        &self,
        id: T::Key,
        tracking: Tracking,
        cancel: &Cancellation,
    ) -> Result<Option<T>, DomainError>;

    /// Stage an insert
    async fn add(&self, entity: T, cancel: &Cancellation) -> Result<(), DomainError>;

    /// Stage an update
    fn update(&self, entity: T) -> Result<(), DomainError>;

    /// Stage a delete
    fn remove(&self, entity: T) -> Result<(), DomainError>;

    /// Rows inserted by the most recent successful save, carrying the
    /// identities the store assigned.
    fn inserted(&self) -> Vec<T>;
}

#[async_trait]
pub trait StudentRepository: Repository<Student> {
    /// Student with all enrollments and their course titles
    async fn get_with_enrollments(
        &self,
        id: Uuid,
        cancel: &Cancellation,
    ) -> Result<Option<StudentWithEnrollmentsDto>, DomainError>;

    /// One row per enrollment: student joined to course
    async fn get_student_courses(
        &self,
        cancel: &Cancellation,
    ) -> Result<Vec<StudentCourseDto>, DomainError>;

    /// Enrolled student count for every course, zero included
    async fn get_course_enrollment_counts(
        &self,
        cancel: &Cancellation,
    ) -> Result<Vec<CourseEnrollmentCount>, DomainError>;

    /// Students grouped by the calendar year of their enrollment date
    async fn group_by_enrollment_year(
        &self,
        cancel: &Cancellation,
    ) -> Result<Vec<EnrollmentYearGroup>, DomainError>;

    async fn get_enrolled_after(
        &self,
        date: DateTime<Utc>,
        cancel: &Cancellation,
    ) -> Result<Vec<Student>, DomainError> {
        self.get_all(Tracking::Detached)
            .enrolled_after(date)
            .to_list(cancel)
            .await
    }

    async fn get_paged(&self, page: Page, cancel: &Cancellation) -> Result<Vec<Student>, DomainError> {
        self.get_all(Tracking::Detached).page(page).to_list(cancel).await
    }
}

#[async_trait]
pub trait DepartmentRepository: Repository<Department> {
    /// Department with its courses
    async fn get_with_courses(
        &self,
        id: i32,
        cancel: &Cancellation,
    ) -> Result<Option<DepartmentWithCoursesDto>, DomainError>;
}

pub trait CourseRepository: Repository<Course> {}

#[async_trait]
pub trait EnrollmentRepository: Repository<Enrollment> {
    async fn get_by_student(
        &self,
        student_id: Uuid,
        cancel: &Cancellation,
    ) -> Result<Vec<Enrollment>, DomainError> {
        self.get_all(Tracking::Detached)
            .for_student(student_id)
            .to_list(cancel)
            .await
    }

    async fn get_by_course(
        &self,
        course_id: i32,
        cancel: &Cancellation,
    ) -> Result<Vec<Enrollment>, DomainError> {
        self.get_all(Tracking::Detached)
            .for_course(course_id)
            .to_list(cancel)
            .await
    }
}
