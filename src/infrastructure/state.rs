//! Application state shared across all handlers

use sea_orm::DatabaseConnection;

use crate::infrastructure::SeaOrmUnitOfWork;

/// Holds the connection pool only. Sessions are per request: every handler
/// asks for its own unit of work.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fresh session with its own repositories and change sets
    pub fn unit_of_work(&self) -> SeaOrmUnitOfWork {
        SeaOrmUnitOfWork::new(self.db.clone())
    }
}
