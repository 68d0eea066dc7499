pub mod courses;
pub mod departments;
pub mod error;
pub mod health;
pub mod students;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;

use crate::infrastructure::AppState;

pub fn api_router(db: DatabaseConnection) -> Router {
    api_router_with_state(AppState::new(db))
}

pub fn api_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Students
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route("/students/by-year", get(students::students_by_year))
        .route("/students/courses", get(students::student_courses))
        .route("/students/:id", get(students::get_student))
        .route(
            "/students/:id/enrollments",
            get(students::get_student_enrollments),
        )
        // Departments
        .route(
            "/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route("/departments/:id", get(departments::get_department))
        // Courses & enrollments
        .route("/courses", post(courses::create_course))
        .route(
            "/courses/enrollment-counts",
            get(courses::enrollment_counts),
        )
        .route("/enrollments", post(courses::enroll))
        .with_state(state)
}
