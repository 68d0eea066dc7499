//! SeaORM implementation of StudentRepository

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Datelike;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select,
};
use uuid::Uuid;

use crate::domain::{
    Cancellation, CourseEnrollmentCount, Criteria, DomainError, EnrollmentDto, EnrollmentYearGroup,
    Query, QuerySource, Repository, Student, StudentCourseDto, StudentFilter, StudentRepository,
    StudentWithEnrollmentsDto, Tracking,
};
use crate::infrastructure::change_set::{Persisted, diff};
use crate::infrastructure::entity_store::EntityStore;
use crate::models::student::{ActiveModel, Column, Entity as StudentEntity, Model, Relation};
use crate::models::{course, enrollment};

impl Persisted for Student {
    type Entity = StudentEntity;
    type ActiveModel = ActiveModel;

    fn from_model(model: Model) -> Self {
        model.into()
    }

    fn insert_model(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id()),
            first_name: Set(self.first_name.clone()),
            last_name: Set(self.last_name.clone()),
            enrollment_date: Set(self.enrollment_date),
        }
    }

    fn update_model(&self, original: Option<&Self>) -> ActiveModel {
        ActiveModel {
            id: Unchanged(self.id()),
            first_name: diff(
                self.first_name.clone(),
                original.map(|o| o.first_name.clone()),
            ),
            last_name: diff(self.last_name.clone(), original.map(|o| o.last_name.clone())),
            enrollment_date: diff(self.enrollment_date, original.map(|o| o.enrollment_date)),
        }
    }

    fn delete_model(&self) -> ActiveModel {
        ActiveModel {
            id: Unchanged(self.id()),
            ..Default::default()
        }
    }
}

/// SeaORM-based implementation of StudentRepository
pub struct SeaOrmStudentRepository {
    store: EntityStore<Student>,
}

impl SeaOrmStudentRepository {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self {
            store: EntityStore::new(db),
        }
    }

    pub(crate) fn store(&self) -> &EntityStore<Student> {
        &self.store
    }
}

// Ordered by last name, first name, id
fn listing(filter: &StudentFilter) -> Select<StudentEntity> {
    let mut query = StudentEntity::find();

    if let Some(after) = filter.enrolled_after {
        query = query.filter(Column::EnrollmentDate.gt(after));
    }

    query
        .order_by_asc(Column::LastName)
        .order_by_asc(Column::FirstName)
        .order_by_asc(Column::Id)
}

#[async_trait]
impl QuerySource<Student> for SeaOrmStudentRepository {
    async fn fetch(
        &self,
        criteria: &Criteria<Student>,
        cancel: &Cancellation,
    ) -> Result<Vec<Student>, DomainError> {
        self.store
            .fetch(listing(&criteria.filter), criteria, cancel)
            .await
    }

    async fn count(
        &self,
        criteria: &Criteria<Student>,
        cancel: &Cancellation,
    ) -> Result<u64, DomainError> {
        self.store
            .count(listing(&criteria.filter), criteria, cancel)
            .await
    }
}

#[async_trait]
impl Repository<Student> for SeaOrmStudentRepository {
    fn get_all(&self, tracking: Tracking) -> Query<'_, Student> {
        Query::new(self, tracking)
    }

    async fn get_by_id(
        &self,
        id: Uuid,
        tracking: Tracking,
        cancel: &Cancellation,
    ) -> Result<Option<Student>, DomainError> {
        self.store
            .find(id, StudentEntity::find_by_id(id), tracking, cancel)
            .await
    }

    async fn add(&self, student: Student, cancel: &Cancellation) -> Result<(), DomainError> {
        self.store.stage_add(student, cancel)
    }

    fn update(&self, student: Student) -> Result<(), DomainError> {
        self.store.stage_update(student)
    }

    fn remove(&self, student: Student) -> Result<(), DomainError> {
        self.store.stage_remove(student)
    }

    fn inserted(&self) -> Vec<Student> {
        self.store.inserted()
    }
}

#[async_trait]
impl StudentRepository for SeaOrmStudentRepository {
    async fn get_with_enrollments(
        &self,
        id: Uuid,
        cancel: &Cancellation,
    ) -> Result<Option<StudentWithEnrollmentsDto>, DomainError> {
        let db = self.store.db();

        let Some(student) = cancel.run(StudentEntity::find_by_id(id).one(db)).await?? else {
            return Ok(None);
        };

        let rows = cancel
            .run(
                enrollment::Entity::find()
                    .filter(enrollment::Column::StudentId.eq(id))
                    .order_by_asc(enrollment::Column::EnrolledOn)
                    .order_by_asc(enrollment::Column::CourseId)
                    .find_also_related(course::Entity)
                    .all(db),
            )
            .await??;

        let enrollments = rows
            .into_iter()
            .filter_map(|(enrollment, course)| {
                course.map(|course| EnrollmentDto {
                    course_id: enrollment.course_id,
                    course_title: course.title,
                    enrolled_on: enrollment.enrolled_on,
                })
            })
            .collect();

        Ok(Some(StudentWithEnrollmentsDto {
            student_id: student.id,
            student_name: format!("{} {}", student.first_name, student.last_name),
            enrollments,
        }))
    }

    async fn get_student_courses(
        &self,
        cancel: &Cancellation,
    ) -> Result<Vec<StudentCourseDto>, DomainError> {
        let rows: Vec<(Uuid, String, String, String)> = cancel
            .run(
                StudentEntity::find()
                    .select_only()
                    .column(Column::Id)
                    .column(Column::FirstName)
                    .column(Column::LastName)
                    .column(course::Column::Title)
                    .join(JoinType::InnerJoin, Relation::Enrollment.def())
                    .join(JoinType::InnerJoin, enrollment::Relation::Course.def())
                    .order_by_asc(Column::LastName)
                    .order_by_asc(Column::FirstName)
                    .order_by_asc(course::Column::Title)
                    .into_tuple()
                    .all(self.store.db()),
            )
            .await??;

        Ok(rows
            .into_iter()
            .map(
                |(student_id, first_name, last_name, course_title)| StudentCourseDto {
                    student_id,
                    student_name: format!("{} {}", first_name, last_name),
                    course_title,
                },
            )
            .collect())
    }

    async fn get_course_enrollment_counts(
        &self,
        cancel: &Cancellation,
    ) -> Result<Vec<CourseEnrollmentCount>, DomainError> {
        // LEFT JOIN keeps courses nobody is enrolled in, with a zero count
        let rows: Vec<(String, i64)> = cancel
            .run(
                course::Entity::find()
                    .select_only()
                    .column(course::Column::Title)
                    .column_as(
                        Expr::col((enrollment::Entity, enrollment::Column::StudentId)).count(),
                        "enrolled_students",
                    )
                    .join(JoinType::LeftJoin, course::Relation::Enrollment.def())
                    .group_by(course::Column::Id)
                    .group_by(course::Column::Title)
                    .order_by_asc(course::Column::Title)
                    .order_by_asc(course::Column::Id)
                    .into_tuple()
                    .all(self.store.db()),
            )
            .await??;

        Ok(rows
            .into_iter()
            .map(|(course_title, count)| CourseEnrollmentCount {
                course_title,
                enrolled_students: u64::try_from(count).unwrap_or(0),
            })
            .collect())
    }

    async fn group_by_enrollment_year(
        &self,
        cancel: &Cancellation,
    ) -> Result<Vec<EnrollmentYearGroup>, DomainError> {
        let students = self.get_all(Tracking::Detached).to_list(cancel).await?;

        let mut groups: BTreeMap<i32, Vec<Student>> = BTreeMap::new();
        for student in students {
            groups
                .entry(student.enrollment_date.year())
                .or_default()
                .push(student);
        }

        Ok(groups
            .into_iter()
            .map(|(year, students)| EnrollmentYearGroup { year, students })
            .collect())
    }
}
