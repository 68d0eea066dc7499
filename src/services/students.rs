//! Student Service - queries and commands over students

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::require_name;
use crate::domain::{
    Cancellation, CourseEnrollmentCount, DomainError, EnrollmentYearGroup, Page, Repository,
    Student, StudentCourseDto, StudentPage, StudentRepository, StudentWithEnrollmentsDto,
    Tracking, UnitOfWork,
};

/// Create a student and commit it. Returns the new id.
pub async fn create_student(
    uow: &dyn UnitOfWork,
    first_name: &str,
    last_name: &str,
    enrollment_date: DateTime<Utc>,
    cancel: &Cancellation,
) -> Result<Uuid, DomainError> {
    let first_name = require_name("first name", first_name)?;
    let last_name = require_name("last name", last_name)?;

    let student = Student::new(first_name, last_name, enrollment_date);
    let id = student.id();

    uow.students().add(student, cancel).await?;
    uow.save_changes(cancel).await.inspect_err(|e| {
        tracing::error!("Failed to create student: {}", e);
    })?;

    tracing::info!(%id, "Student created");
    Ok(id)
}

pub async fn get_student_by_id(
    uow: &dyn UnitOfWork,
    id: Uuid,
    cancel: &Cancellation,
) -> Result<Option<Student>, DomainError> {
    if id.is_nil() {
        return Err(DomainError::validation("student id must not be empty"));
    }
    tracing::debug!(%id, "Get student");

    uow.students()
        .get_by_id(id, Tracking::Detached, cancel)
        .await
        .map_err(|e| {
            tracing::error!("Failed to retrieve student {}: {}", id, e);
            e.with_context(format!("failed to retrieve student with id {id}"))
        })
}

pub async fn get_all_students(
    uow: &dyn UnitOfWork,
    cancel: &Cancellation,
) -> Result<Vec<Student>, DomainError> {
    let students = uow
        .students()
        .get_all(Tracking::Detached)
        .to_list(cancel)
        .await?;
    tracing::info!("List students - {} found", students.len());
    Ok(students)
}

/// Students whose enrollment date is strictly after `date`
pub async fn get_students_enrolled_after(
    uow: &dyn UnitOfWork,
    date: DateTime<Utc>,
    cancel: &Cancellation,
) -> Result<Vec<Student>, DomainError> {
    let students = uow.students().get_enrolled_after(date, cancel).await?;
    tracing::info!("Students enrolled after {} - {} found", date, students.len());
    Ok(students)
}

pub async fn get_paged_students(
    uow: &dyn UnitOfWork,
    page: u64,
    size: u64,
    cancel: &Cancellation,
) -> Result<StudentPage, DomainError> {
    let page = Page::new(page, size)?;

    let students = uow.students().get_paged(page, cancel).await?;
    let total = uow
        .students()
        .get_all(Tracking::Detached)
        .count(cancel)
        .await?;

    Ok(StudentPage {
        students,
        page: page.number(),
        size: page.size(),
        total,
    })
}

pub async fn get_student_with_enrollments(
    uow: &dyn UnitOfWork,
    id: Uuid,
    cancel: &Cancellation,
) -> Result<Option<StudentWithEnrollmentsDto>, DomainError> {
    if id.is_nil() {
        return Err(DomainError::validation("student id must not be empty"));
    }
    uow.students().get_with_enrollments(id, cancel).await
}

pub async fn get_students_by_enrollment_year(
    uow: &dyn UnitOfWork,
    cancel: &Cancellation,
) -> Result<Vec<EnrollmentYearGroup>, DomainError> {
    uow.students().group_by_enrollment_year(cancel).await
}

pub async fn get_student_courses(
    uow: &dyn UnitOfWork,
    cancel: &Cancellation,
) -> Result<Vec<StudentCourseDto>, DomainError> {
    uow.students().get_student_courses(cancel).await
}

/// Every course with its enrolled student count, zero included
pub async fn get_course_enrollment_counts(
    uow: &dyn UnitOfWork,
    cancel: &Cancellation,
) -> Result<Vec<CourseEnrollmentCount>, DomainError> {
    let counts = uow.students().get_course_enrollment_counts(cancel).await?;
    tracing::info!("Enrollment counts for {} courses", counts.len());
    Ok(counts)
}
