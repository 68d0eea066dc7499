use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Cancellation, DomainError};
use crate::infrastructure::AppState;
use crate::services;

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    title: String,
    department_id: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct EnrollRequest {
    #[schema(value_type = String)]
    student_id: Uuid,
    course_id: i32,
    /// Defaults to now
    #[schema(value_type = Option<String>, format = DateTime)]
    enrolled_on: Option<DateTime<Utc>>,
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created"),
        (status = 409, description = "Unknown department")
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let course = services::create_course(
        &uow,
        &payload.title,
        payload.department_id,
        &Cancellation::new(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(course)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/courses/enrollment-counts",
    responses((status = 200, description = "Enrolled student count per course"))
)]
pub async fn enrollment_counts(State(state): State<AppState>) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let counts = services::get_course_enrollment_counts(&uow, &Cancellation::new()).await?;
    Ok(Json(counts).into_response())
}

#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Student enrolled"),
        (status = 409, description = "Already enrolled, or unknown student or course")
    )
)]
pub async fn enroll(
    State(state): State<AppState>,
    Json(payload): Json<EnrollRequest>,
) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let enrollment = services::enroll_student(
        &uow,
        payload.student_id,
        payload.course_id,
        payload.enrolled_on.unwrap_or_else(Utc::now),
        &Cancellation::new(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(enrollment)).into_response())
}
