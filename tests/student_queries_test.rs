use chrono::{DateTime, Duration, TimeZone, Utc};
use registrar::db;
use registrar::domain::{
    Cancellation, DomainError, Page, Repository, Student, StudentRepository, Tracking, UnitOfWork,
};
use registrar::infrastructure::SeaOrmUnitOfWork;
use registrar::services;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 8, 30, 0).unwrap()
}

fn session(db: &DatabaseConnection) -> SeaOrmUnitOfWork {
    SeaOrmUnitOfWork::new(db.clone())
}

#[tokio::test]
async fn test_create_then_get_student() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let id = services::create_student(&session(&db), "Ada", "Lovelace", date(2021, 9, 1), &cancel)
        .await
        .unwrap();
    assert!(!id.is_nil());

    let student = services::get_student_by_id(&session(&db), id, &cancel)
        .await
        .unwrap()
        .expect("student should exist");
    assert_eq!(student.id(), id);
    assert_eq!(student.full_name(), "Ada Lovelace");
    assert_eq!(student.enrollment_date, date(2021, 9, 1));
}

#[tokio::test]
async fn test_unknown_id_returns_none_and_nil_id_is_rejected() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let missing = services::get_student_by_id(&session(&db), Uuid::new_v4(), &cancel)
        .await
        .unwrap();
    assert!(missing.is_none());

    let err = services::get_student_by_id(&session(&db), Uuid::nil(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_blank_names_are_rejected_before_the_store() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let uow = session(&db);

    let err = services::create_student(&uow, "  ", "Hopper", date(2022, 1, 1), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert!(!uow.has_changes());

    let err = services::create_department(&uow, "", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_every_created_student_gets_a_distinct_id() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let mut ids = Vec::new();
    for i in 0..20 {
        let id = services::create_student(
            &session(&db),
            "Student",
            &format!("Number {i}"),
            date(2022, 9, 1),
            &cancel,
        )
        .await
        .unwrap();
        ids.push(id);
    }

    let all = services::get_all_students(&session(&db), &cancel)
        .await
        .unwrap();
    assert_eq!(all.len(), 20);

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_paging_follows_listing_order() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    // Inserted out of order; listing order is by last name
    for i in (1..=25).rev() {
        services::create_student(
            &session(&db),
            "Student",
            &format!("S{i:02}"),
            date(2022, 9, 1),
            &cancel,
        )
        .await
        .unwrap();
    }

    let page = services::get_paged_students(&session(&db), 2, 10, &cancel)
        .await
        .unwrap();
    let names: Vec<String> = page.students.iter().map(|s| s.last_name.clone()).collect();
    let expected: Vec<String> = (11..=20).map(|i| format!("S{i:02}")).collect();
    assert_eq!(names, expected);
    assert_eq!(page.total, 25);

    let last = services::get_paged_students(&session(&db), 3, 10, &cancel)
        .await
        .unwrap();
    assert_eq!(last.students.len(), 5);

    let beyond = services::get_paged_students(&session(&db), 4, 10, &cancel)
        .await
        .unwrap();
    assert!(beyond.students.is_empty());

    let err = services::get_paged_students(&session(&db), 0, 10, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_paging_includes_staged_students() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    for last in ["Baker", "Clark"] {
        services::create_student(&session(&db), "Pat", last, date(2022, 9, 1), &cancel)
            .await
            .unwrap();
    }

    let uow = session(&db);
    uow.students()
        .add(
            Student::new("Pat", "Abbott", date(2022, 9, 1)),
            &cancel,
        )
        .await
        .unwrap();

    let first = uow
        .students()
        .get_paged(Page::new(1, 2).unwrap(), &cancel)
        .await
        .unwrap();
    let names: Vec<&str> = first.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(names, vec!["Abbott", "Baker"]);
}

#[tokio::test]
async fn test_enrolled_after_is_strict() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let cutoff = date(2022, 9, 1);

    for (last, when) in [
        ("Early", cutoff - Duration::days(30)),
        ("OnTheDay", cutoff),
        ("Late", cutoff + Duration::days(1)),
        ("Later", cutoff + Duration::days(400)),
    ] {
        services::create_student(&session(&db), "Sam", last, when, &cancel)
            .await
            .unwrap();
    }

    let after = services::get_students_enrolled_after(&session(&db), cutoff, &cancel)
        .await
        .unwrap();
    let names: Vec<&str> = after.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(names, vec!["Late", "Later"]);
}

#[tokio::test]
async fn test_course_enrollment_counts_include_empty_courses() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let department = services::create_department(&session(&db), "Computer Science", &cancel)
        .await
        .unwrap();
    let department_id = department.id.unwrap();
    let algorithms = services::create_course(&session(&db), "Algorithms", department_id, &cancel)
        .await
        .unwrap();
    services::create_course(&session(&db), "Zoology", department_id, &cancel)
        .await
        .unwrap();

    for last in ["One", "Two", "Three"] {
        let id = services::create_student(&session(&db), "Kid", last, date(2023, 2, 1), &cancel)
            .await
            .unwrap();
        services::enroll_student(
            &session(&db),
            id,
            algorithms.id.unwrap(),
            date(2023, 2, 2),
            &cancel,
        )
        .await
        .unwrap();
    }

    let counts = services::get_course_enrollment_counts(&session(&db), &cancel)
        .await
        .unwrap();
    let pairs: Vec<(&str, u64)> = counts
        .iter()
        .map(|c| (c.course_title.as_str(), c.enrolled_students))
        .collect();
    assert_eq!(pairs, vec![("Algorithms", 3), ("Zoology", 0)]);
}

#[tokio::test]
async fn test_student_with_enrollments_and_student_courses() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let department = services::create_department(&session(&db), "Mathematics", &cancel)
        .await
        .unwrap();
    let department_id = department.id.unwrap();
    let algebra = services::create_course(&session(&db), "Algebra", department_id, &cancel)
        .await
        .unwrap();
    let calculus = services::create_course(&session(&db), "Calculus", department_id, &cancel)
        .await
        .unwrap();

    let id = services::create_student(&session(&db), "Emmy", "Noether", date(2020, 9, 1), &cancel)
        .await
        .unwrap();
    services::enroll_student(&session(&db), id, calculus.id.unwrap(), date(2020, 9, 3), &cancel)
        .await
        .unwrap();
    services::enroll_student(&session(&db), id, algebra.id.unwrap(), date(2020, 9, 2), &cancel)
        .await
        .unwrap();

    let dto = services::get_student_with_enrollments(&session(&db), id, &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dto.student_id, id);
    assert_eq!(dto.student_name, "Emmy Noether");
    let titles: Vec<&str> = dto
        .enrollments
        .iter()
        .map(|e| e.course_title.as_str())
        .collect();
    assert_eq!(titles, vec!["Algebra", "Calculus"]);

    let missing = services::get_student_with_enrollments(&session(&db), Uuid::new_v4(), &cancel)
        .await
        .unwrap();
    assert!(missing.is_none());

    let rows = services::get_student_courses(&session(&db), &cancel)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.student_name == "Emmy Noether"));
    assert_eq!(rows[0].course_title, "Algebra");

    // Enrolling twice in the same course is rejected by the store
    let err = services::enroll_student(
        &session(&db),
        id,
        algebra.id.unwrap(),
        date(2021, 1, 1),
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DomainError::ConstraintViolation { .. }));
}

#[tokio::test]
async fn test_group_by_enrollment_year() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    for (last, year) in [("A", 2023), ("B", 2021), ("C", 2023), ("D", 2022)] {
        services::create_student(&session(&db), "Y", last, date(year, 3, 15), &cancel)
            .await
            .unwrap();
    }

    let groups = services::get_students_by_enrollment_year(&session(&db), &cancel)
        .await
        .unwrap();
    let shape: Vec<(i32, usize)> = groups.iter().map(|g| (g.year, g.students.len())).collect();
    assert_eq!(shape, vec![(2021, 1), (2022, 1), (2023, 2)]);
}

#[tokio::test]
async fn test_departments_list_in_id_order() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    for name in ["History", "Art"] {
        services::create_department(&session(&db), name, &cancel)
            .await
            .unwrap();
    }

    let departments = services::get_departments(&session(&db), &cancel)
        .await
        .unwrap();
    let names: Vec<&str> = departments.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["History", "Art"]);

    let count = session(&db)
        .departments()
        .get_all(Tracking::Detached)
        .count(&cancel)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_huge_page_number_or_size_never_raises() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    services::create_student(&session(&db), "Only", "One", date(2022, 9, 1), &cancel)
        .await
        .unwrap();

    let far = services::get_paged_students(&session(&db), u64::MAX / 2, 10, &cancel)
        .await
        .unwrap();
    assert!(far.students.is_empty());
    assert_eq!(far.total, 1);

    let wide = services::get_paged_students(&session(&db), 1, u64::MAX, &cancel)
        .await
        .unwrap();
    assert_eq!(wide.students.len(), 1);
    assert_eq!(wide.size, u64::MAX);
}
