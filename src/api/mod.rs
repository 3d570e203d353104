//! HTTP layer: DTOs, handlers, middleware and router assembly.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
