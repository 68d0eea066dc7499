use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::error::not_found;
use crate::domain::{Cancellation, DomainError};
use crate::infrastructure::AppState;
use crate::services;

#[derive(Deserialize, ToSchema)]
pub struct CreateStudentRequest {
    first_name: String,
    last_name: String,
    /// Defaults to now
    #[schema(value_type = Option<String>, format = DateTime)]
    enrollment_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListParams {
    /// Only students enrolled strictly after this instant (RFC 3339)
    #[param(value_type = Option<String>)]
    enrolled_after: Option<DateTime<Utc>>,
    /// One-based page number; enables paging
    page: Option<u64>,
    /// Page size, default 10
    size: Option<u64>,
}

fn parse_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw)
        .map_err(|_| DomainError::validation(format!("'{raw}' is not a valid student id")))
}

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created"),
        (status = 400, description = "Blank name")
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let id = services::create_student(
        &uow,
        &payload.first_name,
        &payload.last_name,
        payload.enrollment_date.unwrap_or_else(Utc::now),
        &Cancellation::new(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/students/{id}"))],
        Json(json!({ "id": id })),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentListParams),
    responses(
        (status = 200, description = "Students ordered by last name, first name"),
        (status = 400, description = "Invalid paging or conflicting parameters")
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    Query(params): Query<StudentListParams>,
) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let cancel = Cancellation::new();
    let paged = params.page.is_some() || params.size.is_some();

    let response = match (params.enrolled_after, paged) {
        (Some(_), true) => {
            return Err(DomainError::validation(
                "enrolled_after cannot be combined with paging",
            ));
        }
        (Some(date), false) => {
            Json(services::get_students_enrolled_after(&uow, date, &cancel).await?).into_response()
        }
        (None, true) => {
            let page = services::get_paged_students(
                &uow,
                params.page.unwrap_or(1),
                params.size.unwrap_or(10),
                &cancel,
            )
            .await?;
            Json(page).into_response()
        }
        (None, false) => Json(services::get_all_students(&uow, &cancel).await?).into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = String, Path, description = "Student id (UUID)")),
    responses(
        (status = 200, description = "Student found"),
        (status = 400, description = "Malformed or empty id"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, DomainError> {
    let id = parse_id(&id)?;
    let uow = state.unit_of_work();

    match services::get_student_by_id(&uow, id, &Cancellation::new()).await? {
        Some(student) => Ok(Json(student).into_response()),
        None => Ok(not_found("Student")),
    }
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/enrollments",
    params(("id" = String, Path, description = "Student id (UUID)")),
    responses(
        (status = 200, description = "Student with enrollments"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student_enrollments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, DomainError> {
    let id = parse_id(&id)?;
    let uow = state.unit_of_work();

    match services::get_student_with_enrollments(&uow, id, &Cancellation::new()).await? {
        Some(dto) => Ok(Json(dto).into_response()),
        None => Ok(not_found("Student")),
    }
}

#[utoipa::path(
    get,
    path = "/api/students/by-year",
    responses((status = 200, description = "Students grouped by enrollment year"))
)]
pub async fn students_by_year(State(state): State<AppState>) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let groups = services::get_students_by_enrollment_year(&uow, &Cancellation::new()).await?;
    Ok(Json(groups).into_response())
}

#[utoipa::path(
    get,
    path = "/api/students/courses",
    responses((status = 200, description = "One row per student enrollment"))
)]
pub async fn student_courses(State(state): State<AppState>) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let rows = services::get_student_courses(&uow, &Cancellation::new()).await?;
    Ok(Json(rows).into_response())
}
