pub mod course;
pub mod department;
pub mod enrollment;
pub mod student;
