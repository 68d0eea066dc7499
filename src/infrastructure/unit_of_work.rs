//! SeaORM unit of work
//!
//! Owns one repository per entity type, all sharing the same connection. Staged
//! work is applied in a single transaction: inserts parents first, then
//! updates, then deletes children first.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, IntoActiveModel,
    TransactionTrait,
};

use super::change_set::Persisted;
use super::repositories::{
    SeaOrmCourseRepository, SeaOrmDepartmentRepository, SeaOrmEnrollmentRepository,
    SeaOrmStudentRepository,
};
use crate::domain::{
    Cancellation, Course, CourseRepository, Department, DepartmentRepository, DomainError,
    Enrollment, EnrollmentRepository, Student, StudentRepository, UnitOfWork,
};

pub struct SeaOrmUnitOfWork {
    db: DatabaseConnection,
    students: SeaOrmStudentRepository,
    departments: SeaOrmDepartmentRepository,
    courses: SeaOrmCourseRepository,
    enrollments: SeaOrmEnrollmentRepository,
}

/// Rows returned by the store for each insert, in staging order
struct Inserted {
    departments: Vec<Department>,
    courses: Vec<Course>,
    students: Vec<Student>,
    enrollments: Vec<Enrollment>,
}

impl SeaOrmUnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            students: SeaOrmStudentRepository::new(db.clone()),
            departments: SeaOrmDepartmentRepository::new(db.clone()),
            courses: SeaOrmCourseRepository::new(db.clone()),
            enrollments: SeaOrmEnrollmentRepository::new(db.clone()),
            db,
        }
    }

    async fn apply(
        &self,
        txn: &DatabaseTransaction,
        cancel: &Cancellation,
    ) -> Result<(u64, Inserted), DomainError> {
        let departments = self.departments.store().pending();
        let courses = self.courses.store().pending();
        let students = self.students.store().pending();
        let enrollments = self.enrollments.store().pending();

        let inserted = Inserted {
            departments: apply_inserts(txn, &departments.added, cancel).await?,
            courses: apply_inserts(txn, &courses.added, cancel).await?,
            students: apply_inserts(txn, &students.added, cancel).await?,
            enrollments: apply_inserts(txn, &enrollments.added, cancel).await?,
        };
        let mut affected = (inserted.departments.len()
            + inserted.courses.len()
            + inserted.students.len()
            + inserted.enrollments.len()) as u64;

        affected += apply_updates(txn, &departments.modified, cancel).await?;
        affected += apply_updates(txn, &courses.modified, cancel).await?;
        affected += apply_updates(txn, &students.modified, cancel).await?;
        affected += apply_updates(txn, &enrollments.modified, cancel).await?;

        affected += apply_deletes(txn, &enrollments.removed, cancel).await?;
        affected += apply_deletes(txn, &students.removed, cancel).await?;
        affected += apply_deletes(txn, &courses.removed, cancel).await?;
        affected += apply_deletes(txn, &departments.removed, cancel).await?;

        Ok((affected, inserted))
    }

    fn accept(&self, inserted: Inserted) {
        self.departments.store().accept_changes(inserted.departments);
        self.courses.store().accept_changes(inserted.courses);
        self.students.store().accept_changes(inserted.students);
        self.enrollments.store().accept_changes(inserted.enrollments);
    }

    fn stores_have_changes(&self) -> bool {
        self.departments.store().has_changes()
            || self.courses.store().has_changes()
            || self.students.store().has_changes()
            || self.enrollments.store().has_changes()
    }
}

async fn apply_inserts<T>(
    txn: &DatabaseTransaction,
    rows: &[T],
    cancel: &Cancellation,
) -> Result<Vec<T>, DomainError>
where
    T: Persisted,
    <T::Entity as EntityTrait>::Model: IntoActiveModel<T::ActiveModel>,
{
    let mut inserted = Vec::with_capacity(rows.len());
    for row in rows {
        cancel.check()?;
        let model = row.insert_model().insert(txn).await?;
        inserted.push(T::from_model(model));
    }
    Ok(inserted)
}

async fn apply_updates<T>(
    txn: &DatabaseTransaction,
    rows: &[(T, Option<T>)],
    cancel: &Cancellation,
) -> Result<u64, DomainError>
where
    T: Persisted,
    <T::Entity as EntityTrait>::Model: IntoActiveModel<T::ActiveModel>,
{
    let mut affected = 0;
    for (row, original) in rows {
        cancel.check()?;
        let model = row.update_model(original.as_ref());
        // Tracked and untouched: nothing to write
        if !model.is_changed() {
            continue;
        }
        model.update(txn).await.map_err(|e| match DomainError::from(e) {
            DomainError::Conflict(_) => {
                DomainError::Conflict(format!("{:?} was not found in the store", row.key()))
            }
            other => other,
        })?;
        affected += 1;
    }
    Ok(affected)
}

async fn apply_deletes<T: Persisted>(
    txn: &DatabaseTransaction,
    rows: &[T],
    cancel: &Cancellation,
) -> Result<u64, DomainError> {
    for row in rows {
        cancel.check()?;
        let result = row.delete_model().delete(txn).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::Conflict(format!(
                "{:?} was not found in the store",
                row.key()
            )));
        }
    }
    Ok(rows.len() as u64)
}

#[async_trait]
impl UnitOfWork for SeaOrmUnitOfWork {
    fn students(&self) -> &dyn StudentRepository {
        &self.students
    }

    fn departments(&self) -> &dyn DepartmentRepository {
        &self.departments
    }

    fn courses(&self) -> &dyn CourseRepository {
        &self.courses
    }

    fn enrollments(&self) -> &dyn EnrollmentRepository {
        &self.enrollments
    }

    async fn save_changes(&self, cancel: &Cancellation) -> Result<u64, DomainError> {
        cancel.check()?;
        if !self.stores_have_changes() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;

        let outcome = match self.apply(&txn, cancel).await {
            Ok(applied) => cancel.check().map(|()| applied),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((affected, inserted)) => {
                txn.commit().await?;
                self.accept(inserted);
                tracing::info!(affected, "Saved changes");
                Ok(affected)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                tracing::warn!("Save rolled back, changes kept pending: {}", e);
                Err(e)
            }
        }
    }

    fn discard_changes(&self) {
        self.departments.store().discard();
        self.courses.store().discard();
        self.students.store().discard();
        self.enrollments.store().discard();
        tracing::debug!("Discarded staged changes");
    }

    fn has_changes(&self) -> bool {
        self.stores_have_changes()
    }
}
