//! Store access for one entity type inside a session
//!
//! Every repository owns one `EntityStore`. Reads go to the database and are
//! merged with the session's staged work; writes only touch the change set.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QuerySelect, Select};

use super::change_set::{ChangeSet, PendingChanges, Persisted, Staged};
use crate::domain::{Cancellation, Criteria, DomainError, Tracking};

pub(crate) struct EntityStore<T: Persisted> {
    db: DatabaseConnection,
    changes: Arc<Mutex<ChangeSet<T>>>,
}

impl<T: Persisted> EntityStore<T> {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            changes: Arc::new(Mutex::new(ChangeSet::default())),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    // Never held across an await
    fn changes(&self) -> MutexGuard<'_, ChangeSet<T>> {
        self.changes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a listing. `select` must already carry the filter and an ORDER BY
    /// that agrees with `Record::listing_order`.
    pub async fn fetch(
        &self,
        select: Select<T::Entity>,
        criteria: &Criteria<T>,
        cancel: &Cancellation,
    ) -> Result<Vec<T>, DomainError> {
        let staged = self.changes().has_changes();

        // Without staged work the store can page on its own
        let select = match criteria.page {
            Some(page) if !staged => match page.bounds() {
                Some((offset, limit)) => select.offset(offset).limit(limit),
                None => {
                    cancel.check()?;
                    return Ok(Vec::new());
                }
            },
            _ => select,
        };

        let models = cancel.run(select.all(&self.db)).await??;
        let rows: Vec<T> = models.into_iter().map(T::from_model).collect();

        let mut changes = self.changes();
        if criteria.tracking == Tracking::Tracked {
            changes.track(&rows);
        }
        if !staged {
            return Ok(rows);
        }

        let rows = changes.overlay(rows, &criteria.filter);
        Ok(match criteria.page {
            Some(page) => page.apply(rows),
            None => rows,
        })
    }

    pub async fn count(
        &self,
        select: Select<T::Entity>,
        criteria: &Criteria<T>,
        cancel: &Cancellation,
    ) -> Result<u64, DomainError>
    where
        <T::Entity as EntityTrait>::Model: Sync,
    {
        if self.changes().has_changes() {
            let rows = self.fetch(select, criteria, cancel).await?;
            return Ok(rows.len() as u64);
        }
        Ok(cancel.run(select.count(&self.db)).await??)
    }

    /// Point lookup honouring staged work
    pub async fn find(
        &self,
        key: T::Key,
        select: Select<T::Entity>,
        tracking: Tracking,
        cancel: &Cancellation,
    ) -> Result<Option<T>, DomainError> {
        let staged = self.changes().staged(&key);
        match staged {
            Staged::Present(entity) => return Ok(Some(entity)),
            Staged::Removed => return Ok(None),
            Staged::Untouched => {}
        }

        let model = cancel.run(select.one(&self.db)).await??;
        let row = model.map(T::from_model);

        if tracking == Tracking::Tracked
            && let Some(row) = &row
        {
            self.changes().track(std::slice::from_ref(row));
        }
        Ok(row)
    }

    pub fn stage_add(&self, entity: T, cancel: &Cancellation) -> Result<(), DomainError> {
        cancel.check()?;
        tracing::debug!(key = ?entity.key(), "Staging insert");
        self.changes().stage_add(entity);
        Ok(())
    }

    pub fn stage_update(&self, entity: T) -> Result<(), DomainError> {
        let mut changes = self.changes();
        let tracked = entity.key().is_some_and(|key| changes.is_tracked(&key));
        tracing::debug!(key = ?entity.key(), tracked, "Staging update");
        changes.stage_update(entity)
    }

    pub fn stage_remove(&self, entity: T) -> Result<(), DomainError> {
        tracing::debug!(key = ?entity.key(), "Staging delete");
        self.changes().stage_remove(entity)
    }

    pub fn has_changes(&self) -> bool {
        self.changes().has_changes()
    }

    pub fn pending(&self) -> PendingChanges<T> {
        self.changes().pending()
    }

    pub fn accept_changes(&self, inserted: Vec<T>) {
        self.changes().accept_changes(inserted);
    }

    pub fn inserted(&self) -> Vec<T> {
        self.changes().inserted()
    }

    pub fn discard(&self) {
        self.changes().discard();
    }
}
