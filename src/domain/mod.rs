//! Domain layer - catalog rules and data-access contracts
//!
//! Repository traits and the pure catalog rules live here; the SeaORM
//! implementations live in the infrastructure layer.

pub mod catalog;
pub mod errors;
pub mod repositories;
pub mod validation;

pub use catalog::{CatalogCounts, PAGE_SIZE, Page};
pub use errors::DomainError;
pub use repositories::*;
pub use validation::ValidationErrors;
