//! Persistence contracts consumed by the auth service and their backends.

pub mod refresh_store;
pub mod user_repository;
