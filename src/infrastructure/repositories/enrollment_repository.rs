//! SeaORM implementation of EnrollmentRepository

use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select};
use uuid::Uuid;

use crate::domain::{
    Cancellation, Criteria, DomainError, Enrollment, EnrollmentFilter, EnrollmentRepository,
    Query, QuerySource, Repository, Tracking,
};
use crate::infrastructure::change_set::{Persisted, diff};
use crate::infrastructure::entity_store::EntityStore;
use crate::models::enrollment::{ActiveModel, Column, Entity as EnrollmentEntity, Model};

impl Persisted for Enrollment {
    type Entity = EnrollmentEntity;
    type ActiveModel = ActiveModel;

    fn from_model(model: Model) -> Self {
        model.into()
    }

    fn insert_model(&self) -> ActiveModel {
        ActiveModel {
            student_id: Set(self.student_id),
            course_id: Set(self.course_id),
            enrolled_on: Set(self.enrolled_on),
        }
    }

    fn update_model(&self, original: Option<&Self>) -> ActiveModel {
        ActiveModel {
            student_id: Unchanged(self.student_id),
            course_id: Unchanged(self.course_id),
            enrolled_on: diff(self.enrolled_on, original.map(|o| o.enrolled_on)),
        }
    }

    fn delete_model(&self) -> ActiveModel {
        ActiveModel {
            student_id: Unchanged(self.student_id),
            course_id: Unchanged(self.course_id),
            enrolled_on: NotSet,
        }
    }
}

pub struct SeaOrmEnrollmentRepository {
    store: EntityStore<Enrollment>,
}

impl SeaOrmEnrollmentRepository {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self {
            store: EntityStore::new(db),
        }
    }

    pub(crate) fn store(&self) -> &EntityStore<Enrollment> {
        &self.store
    }
}

fn listing(filter: &EnrollmentFilter) -> Select<EnrollmentEntity> {
    let mut query = EnrollmentEntity::find();

    if let Some(student_id) = filter.student_id {
        query = query.filter(Column::StudentId.eq(student_id));
    }
    if let Some(course_id) = filter.course_id {
        query = query.filter(Column::CourseId.eq(course_id));
    }

    query
        .order_by_asc(Column::StudentId)
        .order_by_asc(Column::CourseId)
}

#[async_trait]
impl QuerySource<Enrollment> for SeaOrmEnrollmentRepository {
    async fn fetch(
        &self,
        criteria: &Criteria<Enrollment>,
        cancel: &Cancellation,
    ) -> Result<Vec<Enrollment>, DomainError> {
        self.store
            .fetch(listing(&criteria.filter), criteria, cancel)
            .await
    }

    async fn count(
        &self,
        criteria: &Criteria<Enrollment>,
        cancel: &Cancellation,
    ) -> Result<u64, DomainError> {
        self.store
            .count(listing(&criteria.filter), criteria, cancel)
            .await
    }
}

#[async_trait]
impl Repository<Enrollment> for SeaOrmEnrollmentRepository {
    fn get_all(&self, tracking: Tracking) -> Query<'_, Enrollment> {
        Query::new(self, tracking)
    }

    async fn get_by_id(
        &self,
        id: (Uuid, i32),
        tracking: Tracking,
        cancel: &Cancellation,
    ) -> Result<Option<Enrollment>, DomainError> {
        self.store
            .find(id, EnrollmentEntity::find_by_id(id), tracking, cancel)
            .await
    }

    async fn add(&self, enrollment: Enrollment, cancel: &Cancellation) -> Result<(), DomainError> {
        self.store.stage_add(enrollment, cancel)
    }

    fn update(&self, enrollment: Enrollment) -> Result<(), DomainError> {
        self.store.stage_update(enrollment)
    }

    fn remove(&self, enrollment: Enrollment) -> Result<(), DomainError> {
        self.store.stage_remove(enrollment)
    }

    fn inserted(&self) -> Vec<Enrollment> {
        self.store.inserted()
    }
}

impl EnrollmentRepository for SeaOrmEnrollmentRepository {}
