//! SeaORM implementation of CourseRepository

use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select};

use crate::domain::{
    Cancellation, Course, CourseFilter, CourseRepository, Criteria, DomainError, Query,
    QuerySource, Repository, Tracking,
};
use crate::infrastructure::change_set::{Persisted, diff};
use crate::infrastructure::entity_store::EntityStore;
use crate::models::course::{ActiveModel, Column, Entity as CourseEntity, Model};

impl Persisted for Course {
    type Entity = CourseEntity;
    type ActiveModel = ActiveModel;

    fn from_model(model: Model) -> Self {
        model.into()
    }

    fn insert_model(&self) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Set),
            title: Set(self.title.clone()),
            department_id: Set(self.department_id),
        }
    }

    fn update_model(&self, original: Option<&Self>) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Unchanged),
            title: diff(self.title.clone(), original.map(|o| o.title.clone())),
            department_id: diff(self.department_id, original.map(|o| o.department_id)),
        }
    }

    fn delete_model(&self) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Unchanged),
            ..Default::default()
        }
    }
}

pub struct SeaOrmCourseRepository {
    store: EntityStore<Course>,
}

impl SeaOrmCourseRepository {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self {
            store: EntityStore::new(db),
        }
    }

    pub(crate) fn store(&self) -> &EntityStore<Course> {
        &self.store
    }
}

fn listing(filter: &CourseFilter) -> Select<CourseEntity> {
    let mut query = CourseEntity::find();

    if let Some(department_id) = filter.department_id {
        query = query.filter(Column::DepartmentId.eq(department_id));
    }

    query.order_by_asc(Column::Id)
}

#[async_trait]
impl QuerySource<Course> for SeaOrmCourseRepository {
    async fn fetch(
        &self,
        criteria: &Criteria<Course>,
        cancel: &Cancellation,
    ) -> Result<Vec<Course>, DomainError> {
        self.store
            .fetch(listing(&criteria.filter), criteria, cancel)
            .await
    }

    async fn count(
        &self,
        criteria: &Criteria<Course>,
        cancel: &Cancellation,
    ) -> Result<u64, DomainError> {
        self.store
            .count(listing(&criteria.filter), criteria, cancel)
            .await
    }
}

#[async_trait]
impl Repository<Course> for SeaOrmCourseRepository {
    fn get_all(&self, tracking: Tracking) -> Query<'_, Course> {
        Query::new(self, tracking)
    }

    async fn get_by_id(
        &self,
        id: i32,
        tracking: Tracking,
        cancel: &Cancellation,
    ) -> Result<Option<Course>, DomainError> {
        self.store
            .find(id, CourseEntity::find_by_id(id), tracking, cancel)
            .await
    }

    async fn add(&self, course: Course, cancel: &Cancellation) -> Result<(), DomainError> {
        self.store.stage_add(course, cancel)
    }

    fn update(&self, course: Course) -> Result<(), DomainError> {
        self.store.stage_update(course)
    }

    fn remove(&self, course: Course) -> Result<(), DomainError> {
        self.store.stage_remove(course)
    }

    fn inserted(&self) -> Vec<Course> {
        self.store.inserted()
    }
}

impl CourseRepository for SeaOrmCourseRepository {}
