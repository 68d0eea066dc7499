use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::students::create_student,
        api::students::list_students,
        api::students::get_student,
        api::students::get_student_enrollments,
        api::students::students_by_year,
        api::students::student_courses,
        api::departments::list_departments,
        api::departments::create_department,
        api::departments::get_department,
        api::courses::create_course,
        api::courses::enrollment_counts,
        api::courses::enroll,
    ),
    components(
        schemas(
            api::students::CreateStudentRequest,
            api::departments::CreateDepartmentRequest,
            api::courses::CreateCourseRequest,
            api::courses::EnrollRequest,
        )
    ),
    tags(
        (name = "registrar", description = "Student enrollment API")
    )
)]
pub struct ApiDoc;
