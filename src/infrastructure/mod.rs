//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and schema (db)
//! - Configuration loading (config)
//! - Staged changes and per-entity store access (change_set, entity_store)
//! - Repository implementations (repositories)
//! - Unit of work (unit_of_work)
//! - HTTP server setup (server)
//! - Application state (state)

pub(crate) mod change_set;
pub mod config;
pub mod db;
pub(crate) mod entity_store;
pub mod repositories;
pub mod seed;
pub mod server;
pub mod state;
pub mod unit_of_work;

pub use repositories::*;
pub use state::AppState;
pub use unit_of_work::SeaOrmUnitOfWork;
