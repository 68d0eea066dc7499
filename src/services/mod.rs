//! Services Layer
//!
//! One async function per use case. Each takes the request's unit of work and
//! cancellation signal, validates argument shape only, and leaves every other
//! rule to the data model and the store.

pub mod courses;
pub mod departments;
pub mod students;

pub use courses::*;
pub use departments::*;
pub use students::*;

use crate::domain::DomainError;

fn require_name(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be blank")));
    }
    Ok(value.to_string())
}
