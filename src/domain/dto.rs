//! Shaped projections returned instead of raw entities

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::entities::{Course, Department, Student};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentDto {
    pub course_id: i32,
    pub course_title: String,
    pub enrolled_on: DateTime<Utc>,
}

/// A student with every enrollment eagerly loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentWithEnrollmentsDto {
    pub student_id: Uuid,
    pub student_name: String,
    pub enrollments: Vec<EnrollmentDto>,
}

/// Student joined through an enrollment to its course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentCourseDto {
    pub student_id: Uuid,
    pub student_name: String,
    pub course_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseEnrollmentCount {
    pub course_title: String,
    pub enrolled_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentYearGroup {
    pub year: i32,
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentWithCoursesDto {
    pub department: Department,
    pub courses: Vec<Course>,
}

/// One page of the student listing with the unpaged total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
}
