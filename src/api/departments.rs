use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::error::not_found;
use crate::domain::{Cancellation, DomainError};
use crate::infrastructure::AppState;
use crate::services;

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartmentRequest {
    name: String,
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "All departments"))
)]
pub async fn list_departments(State(state): State<AppState>) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let departments = services::get_departments(&uow, &Cancellation::new()).await?;
    Ok(Json(departments).into_response())
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created"),
        (status = 400, description = "Blank name")
    )
)]
pub async fn create_department(
    State(state): State<AppState>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    let department =
        services::create_department(&uow, &payload.name, &Cancellation::new()).await?;
    Ok((StatusCode::CREATED, Json(department)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department with its courses"),
        (status = 404, description = "Department not found")
    )
)]
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, DomainError> {
    let uow = state.unit_of_work();
    match services::get_department_with_courses(&uow, id, &Cancellation::new()).await? {
        Some(dto) => Ok(Json(dto).into_response()),
        None => Ok(not_found("Department")),
    }
}
