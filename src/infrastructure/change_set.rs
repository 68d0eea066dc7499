//! Per-session staged changes and tracked snapshots

use std::collections::HashMap;

use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ActiveValue, EntityTrait, Value};

use crate::domain::{DomainError, Record};

/// Mapping between a domain entity and its SeaORM entity
pub(crate) trait Persisted: Record {
    type Entity: EntityTrait;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + Send
        + Sync
        + 'static;

    fn from_model(model: <Self::Entity as EntityTrait>::Model) -> Self;

    fn insert_model(&self) -> Self::ActiveModel;

    /// Columns differing from `original` are set; every column when there is
    /// no snapshot. The primary key is never set.
    fn update_model(&self, original: Option<&Self>) -> Self::ActiveModel;

    /// Primary key only
    fn delete_model(&self) -> Self::ActiveModel;
}

/// `Set` when the value differs from the snapshot (or there is none)
pub(crate) fn diff<V>(current: V, original: Option<V>) -> ActiveValue<V>
where
    V: Into<Value> + PartialEq,
{
    match original {
        Some(original) if original == current => ActiveValue::Unchanged(current),
        _ => ActiveValue::Set(current),
    }
}

/// What the session knows about one identity
#[derive(Debug)]
pub(crate) enum Staged<T> {
    /// Staged add or update; the store is not consulted
    Present(T),
    Removed,
    Untouched,
}

/// Work handed to the unit of work at save time
#[derive(Debug)]
pub(crate) struct PendingChanges<T> {
    pub added: Vec<T>,
    /// Modified entity paired with its tracked snapshot, if any
    pub modified: Vec<(T, Option<T>)>,
    pub removed: Vec<T>,
}

#[derive(Debug)]
pub(crate) struct ChangeSet<T: Record> {
    added: Vec<T>,
    modified: Vec<T>,
    removed: Vec<T>,
    tracked: HashMap<T::Key, T>,
    /// Rows inserted by the last successful save, with store-assigned keys
    inserted: Vec<T>,
}

impl<T: Record> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            modified: Vec::new(),
            removed: Vec::new(),
            tracked: HashMap::new(),
            inserted: Vec::new(),
        }
    }
}

fn required_key<T: Record>(entity: &T, action: &str) -> Result<T::Key, DomainError> {
    entity.key().ok_or_else(|| {
        DomainError::validation(format!(
            "cannot {action} an entity the store has not assigned an id to"
        ))
    })
}

fn has_key<T: Record>(entity: &T, key: &T::Key) -> bool {
    entity.key().as_ref() == Some(key)
}

impl<T: Record> ChangeSet<T> {
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty())
    }

    pub fn stage_add(&mut self, entity: T) {
        self.added.push(entity);
    }

    pub fn stage_update(&mut self, entity: T) -> Result<(), DomainError> {
        let key = required_key(&entity, "update")?;

        if let Some(slot) = self.added.iter_mut().find(|e| has_key(&**e, &key)) {
            *slot = entity;
            return Ok(());
        }
        if self.removed.iter().any(|e| has_key(e, &key)) {
            return Err(DomainError::validation(format!(
                "entity {key:?} is staged for removal"
            )));
        }

        match self.modified.iter_mut().find(|e| has_key(&**e, &key)) {
            Some(slot) => *slot = entity,
            None => self.modified.push(entity),
        }
        Ok(())
    }

    pub fn stage_remove(&mut self, entity: T) -> Result<(), DomainError> {
        let key = required_key(&entity, "remove")?;

        // Never reached the store: just forget the insert
        if let Some(pos) = self.added.iter().position(|e| has_key(e, &key)) {
            self.added.remove(pos);
            return Ok(());
        }

        self.modified.retain(|e| !has_key(e, &key));
        if !self.removed.iter().any(|e| has_key(e, &key)) {
            self.removed.push(entity);
        }
        Ok(())
    }

    /// Register snapshots for rows read from the store. An identity that is
    /// already tracked keeps its first snapshot.
    pub fn track(&mut self, rows: &[T]) {
        for row in rows {
            if let Some(key) = row.key() {
                self.tracked.entry(key).or_insert_with(|| row.clone());
            }
        }
    }

    pub fn is_tracked(&self, key: &T::Key) -> bool {
        self.tracked.contains_key(key)
    }

    pub fn staged(&self, key: &T::Key) -> Staged<T> {
        if let Some(e) = self
            .added
            .iter()
            .chain(self.modified.iter())
            .find(|e| has_key(*e, key))
        {
            return Staged::Present(e.clone());
        }
        if self.removed.iter().any(|e| has_key(e, key)) {
            return Staged::Removed;
        }
        Staged::Untouched
    }

    /// Merge staged work into rows read from the store, keeping only rows that
    /// match `filter`, in listing order.
    pub fn overlay(&self, rows: Vec<T>, filter: &T::Filter) -> Vec<T> {
        let touched = |row: &T| {
            row.key().is_some_and(|key| {
                self.removed
                    .iter()
                    .chain(self.modified.iter())
                    .any(|e| has_key(e, &key))
            })
        };

        let mut merged: Vec<T> = rows.into_iter().filter(|row| !touched(row)).collect();
        merged.extend(
            self.modified
                .iter()
                .chain(self.added.iter())
                .filter(|e| e.matches(filter))
                .cloned(),
        );
        merged.sort_by(|a, b| a.listing_order(b));
        merged
    }

    pub fn pending(&self) -> PendingChanges<T> {
        PendingChanges {
            added: self.added.clone(),
            modified: self
                .modified
                .iter()
                .map(|e| {
                    let original = e.key().and_then(|key| self.tracked.get(&key).cloned());
                    (e.clone(), original)
                })
                .collect(),
            removed: self.removed.clone(),
        }
    }

    pub fn inserted(&self) -> Vec<T> {
        self.inserted.clone()
    }

    /// Committed: snapshots take the saved values, staged work is cleared.
    /// `inserted` are the added rows as the store returned them.
    pub fn accept_changes(&mut self, inserted: Vec<T>) {
        for entity in self.modified.drain(..) {
            if let Some(key) = entity.key()
                && let Some(snapshot) = self.tracked.get_mut(&key)
            {
                *snapshot = entity;
            }
        }
        for entity in self.removed.drain(..) {
            if let Some(key) = entity.key() {
                self.tracked.remove(&key);
            }
        }
        self.added.clear();
        self.track(&inserted);
        self.inserted = inserted;
    }

    pub fn discard(&mut self) {
        self.added.clear();
        self.modified.clear();
        self.removed.clear();
        self.tracked.clear();
        self.inserted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Department, Student, StudentFilter};
    use chrono::{TimeZone, Utc};

    fn student(first: &str, last: &str) -> Student {
        Student::new(first, last, Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn removing_a_staged_add_forgets_it() {
        let mut set = ChangeSet::default();
        let s = student("Grace", "Hopper");
        set.stage_add(s.clone());
        set.stage_remove(s).unwrap();
        assert!(!set.has_changes());
    }

    #[test]
    fn updating_a_staged_add_rewrites_the_insert() {
        let mut set = ChangeSet::default();
        let mut s = student("Grace", "Hopper");
        set.stage_add(s.clone());
        s.first_name = "Rear Admiral Grace".into();
        set.stage_update(s.clone()).unwrap();

        let pending = set.pending();
        assert_eq!(pending.added, vec![s]);
        assert!(pending.modified.is_empty());
    }

    #[test]
    fn unsaved_department_cannot_be_updated() {
        let mut set = ChangeSet::default();
        let err = set.stage_update(Department::new("Physics")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn overlay_hides_removed_and_appends_added() {
        let mut set = ChangeSet::default();
        let stored_a = student("Ada", "Lovelace");
        let stored_b = student("Alan", "Turing");
        let added = student("Edsger", "Dijkstra");

        set.stage_remove(stored_b.clone()).unwrap();
        set.stage_add(added.clone());

        let rows = set.overlay(vec![stored_a.clone(), stored_b], &StudentFilter::default());
        assert_eq!(rows, vec![added, stored_a]);
    }

    #[test]
    fn pending_updates_carry_the_tracked_snapshot() {
        let mut set = ChangeSet::default();
        let original = student("Barbara", "Liskov");
        set.track(std::slice::from_ref(&original));

        let mut changed = original.clone();
        changed.last_name = "Huberman".into();
        set.stage_update(changed.clone()).unwrap();

        let pending = set.pending();
        assert_eq!(pending.modified, vec![(changed.clone(), Some(original))]);

        set.accept_changes(Vec::new());
        assert!(!set.has_changes());
        assert!(set.is_tracked(&changed.id()));
        assert!(set.pending().modified.is_empty());
    }

    #[test]
    fn accepted_inserts_are_tracked_with_their_keys() {
        let mut set = ChangeSet::default();
        set.stage_add(Department::new("Chemistry"));

        let stored = Department {
            id: Some(7),
            name: "Chemistry".into(),
        };
        set.accept_changes(vec![stored.clone()]);

        assert!(!set.has_changes());
        assert!(set.is_tracked(&7));
        assert_eq!(set.inserted(), vec![stored]);
    }
}
