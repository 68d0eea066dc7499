//! SeaORM implementation of DepartmentRepository

use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Select};

use crate::domain::{
    Cancellation, Course, Criteria, Department, DepartmentRepository, DepartmentWithCoursesDto,
    DomainError, Query, QuerySource, Repository, Tracking,
};
use crate::infrastructure::change_set::{Persisted, diff};
use crate::infrastructure::entity_store::EntityStore;
use crate::models::course;
use crate::models::department::{ActiveModel, Column, Entity as DepartmentEntity, Model};

impl Persisted for Department {
    type Entity = DepartmentEntity;
    type ActiveModel = ActiveModel;

    fn from_model(model: Model) -> Self {
        model.into()
    }

    fn insert_model(&self) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Set),
            name: Set(self.name.clone()),
        }
    }

    fn update_model(&self, original: Option<&Self>) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Unchanged),
            name: diff(self.name.clone(), original.map(|o| o.name.clone())),
        }
    }

    fn delete_model(&self) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Unchanged),
            ..Default::default()
        }
    }
}

pub struct SeaOrmDepartmentRepository {
    store: EntityStore<Department>,
}

impl SeaOrmDepartmentRepository {
    pub(crate) fn new(db: DatabaseConnection) -> Self {
        Self {
            store: EntityStore::new(db),
        }
    }

    pub(crate) fn store(&self) -> &EntityStore<Department> {
        &self.store
    }
}

fn listing() -> Select<DepartmentEntity> {
    DepartmentEntity::find().order_by_asc(Column::Id)
}

#[async_trait]
impl QuerySource<Department> for SeaOrmDepartmentRepository {
    async fn fetch(
        &self,
        criteria: &Criteria<Department>,
        cancel: &Cancellation,
    ) -> Result<Vec<Department>, DomainError> {
        self.store.fetch(listing(), criteria, cancel).await
    }

    async fn count(
        &self,
        criteria: &Criteria<Department>,
        cancel: &Cancellation,
    ) -> Result<u64, DomainError> {
        self.store.count(listing(), criteria, cancel).await
    }
}

#[async_trait]
impl Repository<Department> for SeaOrmDepartmentRepository {
    fn get_all(&self, tracking: Tracking) -> Query<'_, Department> {
        Query::new(self, tracking)
    }

    async fn get_by_id(
        &self,
        id: i32,
        tracking: Tracking,
        cancel: &Cancellation,
    ) -> Result<Option<Department>, DomainError> {
        self.store
            .find(id, DepartmentEntity::find_by_id(id), tracking, cancel)
            .await
    }

    async fn add(&self, department: Department, cancel: &Cancellation) -> Result<(), DomainError> {
        self.store.stage_add(department, cancel)
    }

    fn update(&self, department: Department) -> Result<(), DomainError> {
        self.store.stage_update(department)
    }

    fn remove(&self, department: Department) -> Result<(), DomainError> {
        self.store.stage_remove(department)
    }

    fn inserted(&self) -> Vec<Department> {
        self.store.inserted()
    }
}

#[async_trait]
impl DepartmentRepository for SeaOrmDepartmentRepository {
    async fn get_with_courses(
        &self,
        id: i32,
        cancel: &Cancellation,
    ) -> Result<Option<DepartmentWithCoursesDto>, DomainError> {
        let db = self.store.db();

        let Some(department) = cancel.run(DepartmentEntity::find_by_id(id).one(db)).await?? else {
            return Ok(None);
        };

        let courses = cancel
            .run(
                department
                    .find_related(course::Entity)
                    .order_by_asc(course::Column::Id)
                    .all(db),
            )
            .await??;

        Ok(Some(DepartmentWithCoursesDto {
            department: department.into(),
            courses: courses.into_iter().map(Course::from).collect(),
        }))
    }
}
