//! Services Layer
//!
//! Business logic that spans several repositories, callable from handlers or tests.

pub mod catalog_service;

pub use catalog_service::*;
