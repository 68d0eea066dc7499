//! Domain layer - Pure business abstractions
//!
//! Entities, repository and unit-of-work contracts, query handles and
//! domain error types. No SeaORM entities or Axum types live here.

pub mod cancellation;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod query;
pub mod repositories;
pub mod unit_of_work;

pub use cancellation::Cancellation;
pub use dto::*;
pub use entities::*;
pub use errors::DomainError;
pub use query::{Criteria, Page, Query, QuerySource, Record, Tracking};
pub use repositories::*;
pub use unit_of_work::UnitOfWork;
