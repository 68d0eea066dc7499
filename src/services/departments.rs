//! Department Service

use super::require_name;
use crate::domain::{
    Cancellation, Department, DepartmentRepository, DepartmentWithCoursesDto, DomainError,
    Repository, Tracking, UnitOfWork,
};

pub async fn get_departments(
    uow: &dyn UnitOfWork,
    cancel: &Cancellation,
) -> Result<Vec<Department>, DomainError> {
    uow.departments()
        .get_all(Tracking::Detached)
        .to_list(cancel)
        .await
}

pub async fn get_department_with_courses(
    uow: &dyn UnitOfWork,
    id: i32,
    cancel: &Cancellation,
) -> Result<Option<DepartmentWithCoursesDto>, DomainError> {
    uow.departments().get_with_courses(id, cancel).await
}

/// Create a department and commit it. The returned department carries its
/// store-assigned id.
pub async fn create_department(
    uow: &dyn UnitOfWork,
    name: &str,
    cancel: &Cancellation,
) -> Result<Department, DomainError> {
    let name = require_name("department name", name)?;

    uow.departments().add(Department::new(name), cancel).await?;
    uow.save_changes(cancel).await?;

    let department = uow
        .departments()
        .inserted()
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::not_inserted("department"))?;
    tracing::info!(id = ?department.id, "Department created");
    Ok(department)
}
