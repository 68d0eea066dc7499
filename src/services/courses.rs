//! Course and enrollment commands

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::require_name;
use crate::domain::{Cancellation, Course, DomainError, Enrollment, Repository, UnitOfWork};

pub async fn create_course(
    uow: &dyn UnitOfWork,
    title: &str,
    department_id: i32,
    cancel: &Cancellation,
) -> Result<Course, DomainError> {
    let title = require_name("course title", title)?;

    uow.courses()
        .add(Course::new(title, department_id), cancel)
        .await?;
    // An unknown department surfaces here as a constraint violation
    uow.save_changes(cancel).await.inspect_err(|e| {
        tracing::error!("Failed to create course: {}", e);
    })?;

    let course = uow
        .courses()
        .inserted()
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::not_inserted("course"))?;
    tracing::info!(id = ?course.id, department_id, "Course created");
    Ok(course)
}

/// Enroll a student in a course. Enrolling twice in the same course is a
/// constraint violation.
pub async fn enroll_student(
    uow: &dyn UnitOfWork,
    student_id: Uuid,
    course_id: i32,
    enrolled_on: DateTime<Utc>,
    cancel: &Cancellation,
) -> Result<Enrollment, DomainError> {
    if student_id.is_nil() {
        return Err(DomainError::validation("student id must not be empty"));
    }

    let enrollment = Enrollment::new(student_id, course_id, enrolled_on);
    uow.enrollments().add(enrollment.clone(), cancel).await?;
    uow.save_changes(cancel).await.inspect_err(|e| {
        tracing::error!(
            "Failed to enroll student {} in course {}: {}",
            student_id,
            course_id,
            e
        );
    })?;

    tracing::info!(%student_id, course_id, "Student enrolled");
    Ok(enrollment)
}
