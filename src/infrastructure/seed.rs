use chrono::{TimeZone, Utc};
use sea_orm::DatabaseConnection;

use crate::domain::{
    Cancellation, Course, Department, DomainError, Enrollment, Repository, Student, Tracking,
    UnitOfWork,
};
use crate::infrastructure::SeaOrmUnitOfWork;

/// Insert a small demo catalogue. Does nothing when departments already exist.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DomainError> {
    let cancel = Cancellation::new();
    let uow = SeaOrmUnitOfWork::new(db.clone());

    if uow
        .departments()
        .get_all(Tracking::Detached)
        .count(&cancel)
        .await?
        > 0
    {
        tracing::info!("Demo data already present, skipping");
        return Ok(());
    }

    // 1. Departments
    for name in ["Computer Science", "Mathematics", "History"] {
        uow.departments().add(Department::new(name), &cancel).await?;
    }
    uow.save_changes(&cancel).await?;
    let departments = uow.departments().inserted();

    // 2. Courses
    let catalogue = [
        ("Algorithms", 0),
        ("Operating Systems", 0),
        ("Linear Algebra", 1),
        ("Medieval Europe", 2),
    ];
    for (title, dept) in catalogue {
        if let Some(department_id) = departments.get(dept).and_then(|d| d.id) {
            uow.courses()
                .add(Course::new(title, department_id), &cancel)
                .await?;
        }
    }
    uow.save_changes(&cancel).await?;
    let courses = uow.courses().inserted();

    // 3. Students, each enrolled in a couple of courses
    let students = [
        ("Ada", "Lovelace", 2021),
        ("Alan", "Turing", 2022),
        ("Grace", "Hopper", 2022),
        ("Edsger", "Dijkstra", 2023),
    ];
    for (i, (first, last, year)) in students.into_iter().enumerate() {
        let enrolled = Utc
            .with_ymd_and_hms(year, 9, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let student = Student::new(first, last, enrolled);

        for course in courses.iter().skip(i % 2).step_by(2) {
            if let Some(course_id) = course.id {
                uow.enrollments()
                    .add(Enrollment::new(student.id(), course_id, enrolled), &cancel)
                    .await?;
            }
        }
        uow.students().add(student, &cancel).await?;
    }
    let saved = uow.save_changes(&cancel).await?;

    tracing::info!(records = saved, "Demo data seeded");
    Ok(())
}
