//! Repository implementations using SeaORM

pub mod course_repository;
pub mod department_repository;
pub mod enrollment_repository;
pub mod student_repository;

pub use course_repository::SeaOrmCourseRepository;
pub use department_repository::SeaOrmDepartmentRepository;
pub use enrollment_repository::SeaOrmEnrollmentRepository;
pub use student_repository::SeaOrmStudentRepository;
