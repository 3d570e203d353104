//! Infrastructure layer: in-process caches and Postgres persistence.

pub mod cache;
pub mod persistence;
