use chrono::{DateTime, TimeZone, Utc};
use registrar::db;
use registrar::domain::{
    Cancellation, Course, Department, DepartmentRepository, DomainError, Enrollment,
    EnrollmentRepository, Repository, Student, Tracking, UnitOfWork,
};
use registrar::infrastructure::SeaOrmUnitOfWork;
use sea_orm::DatabaseConnection;

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
}

// Helper to commit a department and one course, returning the course id
async fn create_test_course(db: &DatabaseConnection, title: &str) -> i32 {
    let cancel = Cancellation::new();
    let uow = SeaOrmUnitOfWork::new(db.clone());

    uow.departments()
        .add(Department::new("Engineering"), &cancel)
        .await
        .unwrap();
    uow.save_changes(&cancel).await.unwrap();
    let department_id = uow.departments().inserted()[0].id.unwrap();

    uow.courses()
        .add(Course::new(title, department_id), &cancel)
        .await
        .unwrap();
    uow.save_changes(&cancel).await.unwrap();
    uow.courses().inserted()[0].id.unwrap()
}

async fn create_test_student(db: &DatabaseConnection, first: &str, last: &str) -> Student {
    let cancel = Cancellation::new();
    let uow = SeaOrmUnitOfWork::new(db.clone());
    let student = Student::new(first, last, date(2022, 9, 1));
    uow.students().add(student.clone(), &cancel).await.unwrap();
    uow.save_changes(&cancel).await.unwrap();
    student
}

async fn student_count(db: &DatabaseConnection) -> u64 {
    SeaOrmUnitOfWork::new(db.clone())
        .students()
        .get_all(Tracking::Detached)
        .count(&Cancellation::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_staged_add_is_visible_only_inside_its_session() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let session = SeaOrmUnitOfWork::new(db.clone());
    let other = SeaOrmUnitOfWork::new(db.clone());

    let student = Student::new("Ada", "Lovelace", date(2021, 9, 1));
    session
        .students()
        .add(student.clone(), &cancel)
        .await
        .unwrap();
    assert!(session.has_changes());

    // Both read modes see the staged insert
    let detached = session
        .students()
        .get_all(Tracking::Detached)
        .to_list(&cancel)
        .await
        .unwrap();
    assert_eq!(detached, vec![student.clone()]);
    let found = session
        .students()
        .get_by_id(student.id(), Tracking::Tracked, &cancel)
        .await
        .unwrap();
    assert_eq!(found, Some(student.clone()));

    // Another session does not
    let outside = other
        .students()
        .get_by_id(student.id(), Tracking::Detached, &cancel)
        .await
        .unwrap();
    assert!(outside.is_none());

    let affected = session.save_changes(&cancel).await.unwrap();
    assert_eq!(affected, 1);
    assert!(!session.has_changes());

    let outside = other
        .students()
        .get_by_id(student.id(), Tracking::Detached, &cancel)
        .await
        .unwrap();
    assert_eq!(outside, Some(student));
}

#[tokio::test]
async fn test_failed_save_rolls_back_everything_and_keeps_changes() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let course_id = create_test_course(&db, "Compilers").await;
    let student = create_test_student(&db, "Alan", "Turing").await;

    let uow = SeaOrmUnitOfWork::new(db.clone());
    uow.enrollments()
        .add(
            Enrollment::new(student.id(), course_id, date(2022, 9, 2)),
            &cancel,
        )
        .await
        .unwrap();
    uow.save_changes(&cancel).await.unwrap();

    // A new student plus a duplicate enrollment in the same save
    let newcomer = Student::new("Grace", "Hopper", date(2023, 1, 10));
    uow.students().add(newcomer.clone(), &cancel).await.unwrap();
    uow.enrollments()
        .add(
            Enrollment::new(student.id(), course_id, date(2023, 1, 10)),
            &cancel,
        )
        .await
        .unwrap();

    let err = uow.save_changes(&cancel).await.unwrap_err();
    assert!(
        matches!(err, DomainError::ConstraintViolation { .. }),
        "unexpected error: {err:?}"
    );

    // The newcomer insert was rolled back with it
    assert_eq!(student_count(&db).await, 1);
    assert!(uow.has_changes());

    uow.discard_changes();
    assert!(!uow.has_changes());
    assert_eq!(uow.save_changes(&cancel).await.unwrap(), 0);
}

#[tokio::test]
async fn test_tracked_update_writes_only_changed_columns() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let student = create_test_student(&db, "Barbara", "Liskov").await;

    let first_session = SeaOrmUnitOfWork::new(db.clone());
    let mut tracked = first_session
        .students()
        .get_by_id(student.id(), Tracking::Tracked, &cancel)
        .await
        .unwrap()
        .unwrap();

    // Someone else renames the student meanwhile
    let second_session = SeaOrmUnitOfWork::new(db.clone());
    let mut other = second_session
        .students()
        .get_by_id(student.id(), Tracking::Tracked, &cancel)
        .await
        .unwrap()
        .unwrap();
    other.last_name = "Huberman".into();
    second_session.students().update(other).unwrap();
    assert_eq!(second_session.save_changes(&cancel).await.unwrap(), 1);

    tracked.first_name = "Barb".into();
    first_session.students().update(tracked).unwrap();
    assert_eq!(first_session.save_changes(&cancel).await.unwrap(), 1);

    let stored = SeaOrmUnitOfWork::new(db.clone())
        .students()
        .get_by_id(student.id(), Tracking::Detached, &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.first_name, "Barb");
    assert_eq!(stored.last_name, "Huberman");
}

#[tokio::test]
async fn test_unchanged_tracked_update_is_a_no_op() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let student = create_test_student(&db, "Edsger", "Dijkstra").await;

    let uow = SeaOrmUnitOfWork::new(db.clone());
    let tracked = uow
        .students()
        .get_by_id(student.id(), Tracking::Tracked, &cancel)
        .await
        .unwrap()
        .unwrap();
    uow.students().update(tracked).unwrap();

    assert_eq!(uow.save_changes(&cancel).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_of_deleted_student_is_a_conflict() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let student = create_test_student(&db, "Donald", "Knuth").await;

    let stale = SeaOrmUnitOfWork::new(db.clone());
    let mut tracked = stale
        .students()
        .get_by_id(student.id(), Tracking::Tracked, &cancel)
        .await
        .unwrap()
        .unwrap();

    let remover = SeaOrmUnitOfWork::new(db.clone());
    remover.students().remove(student.clone()).unwrap();
    assert_eq!(remover.save_changes(&cancel).await.unwrap(), 1);

    tracked.first_name = "Don".into();
    stale.students().update(tracked).unwrap();
    let err = stale.save_changes(&cancel).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)), "unexpected error: {err:?}");

    // Removing it again also matches nothing
    let again = SeaOrmUnitOfWork::new(db.clone());
    again.students().remove(student).unwrap();
    let err = again.save_changes(&cancel).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn test_cancelled_save_persists_nothing() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let uow = SeaOrmUnitOfWork::new(db.clone());
    uow.students()
        .add(Student::new("Ken", "Thompson", date(2020, 9, 1)), &cancel)
        .await
        .unwrap();

    cancel.cancel();
    let err = uow.save_changes(&cancel).await.unwrap_err();
    assert!(matches!(err, DomainError::Cancelled));
    assert!(uow.has_changes());

    assert_eq!(student_count(&db).await, 0);

    // Reads and staging observe the signal too
    let err = uow
        .students()
        .get_all(Tracking::Detached)
        .to_list(&cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Cancelled));
    let err = uow
        .students()
        .add(Student::new("Dennis", "Ritchie", date(2020, 9, 1)), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Cancelled));
}

#[tokio::test]
async fn test_store_assigns_department_and_course_ids() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let uow = SeaOrmUnitOfWork::new(db.clone());
    uow.departments()
        .add(Department::new("Physics"), &cancel)
        .await
        .unwrap();
    uow.departments()
        .add(Department::new("Biology"), &cancel)
        .await
        .unwrap();

    // Unsaved rows sort after stored ones and have no id yet
    let staged = uow
        .departments()
        .get_all(Tracking::Detached)
        .to_list(&cancel)
        .await
        .unwrap();
    assert!(staged.iter().all(|d| d.id.is_none()));

    assert_eq!(uow.save_changes(&cancel).await.unwrap(), 2);
    let inserted = uow.departments().inserted();
    assert_eq!(inserted.len(), 2);
    assert!(inserted[0].id.unwrap() < inserted[1].id.unwrap());

    let physics = inserted[0].id.unwrap();
    let with_courses = uow
        .departments()
        .get_with_courses(physics, &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_courses.department.name, "Physics");
    assert!(with_courses.courses.is_empty());
}

#[tokio::test]
async fn test_removing_a_student_cascades_to_enrollments() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let course_id = create_test_course(&db, "Databases").await;
    let student = create_test_student(&db, "Edgar", "Codd").await;

    let uow = SeaOrmUnitOfWork::new(db.clone());
    uow.enrollments()
        .add(
            Enrollment::new(student.id(), course_id, date(2022, 9, 5)),
            &cancel,
        )
        .await
        .unwrap();
    uow.save_changes(&cancel).await.unwrap();
    assert_eq!(
        uow.enrollments()
            .get_by_course(course_id, &cancel)
            .await
            .unwrap()
            .len(),
        1
    );

    uow.students().remove(student.clone()).unwrap();
    uow.save_changes(&cancel).await.unwrap();

    let session = SeaOrmUnitOfWork::new(db.clone());
    assert!(
        session
            .enrollments()
            .get_by_student(student.id(), &cancel)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_course_for_unknown_department_violates_constraint() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();

    let uow = SeaOrmUnitOfWork::new(db.clone());
    uow.courses()
        .add(Course::new("Orphan Studies", 4242), &cancel)
        .await
        .unwrap();

    let err = uow.save_changes(&cancel).await.unwrap_err();
    assert!(
        matches!(err, DomainError::ConstraintViolation { .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_courses_filter_by_department() {
    let db = setup_test_db().await;
    let cancel = Cancellation::new();
    let first_course = create_test_course(&db, "Thermodynamics").await;

    let uow = SeaOrmUnitOfWork::new(db.clone());
    uow.departments()
        .add(Department::new("Music"), &cancel)
        .await
        .unwrap();
    uow.save_changes(&cancel).await.unwrap();
    let music = uow.departments().inserted()[0].id.unwrap();

    uow.courses()
        .add(Course::new("Harmony", music), &cancel)
        .await
        .unwrap();

    // Staged course shows up under its department only
    let in_music = uow
        .courses()
        .get_all(Tracking::Detached)
        .in_department(music)
        .to_list(&cancel)
        .await
        .unwrap();
    assert_eq!(in_music.len(), 1);
    assert_eq!(in_music[0].title, "Harmony");
    assert!(in_music[0].id.is_none());

    let first = uow
        .courses()
        .get_all(Tracking::Detached)
        .first(&cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, Some(first_course));
}
