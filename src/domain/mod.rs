//! Domain layer: entities, repository traits and background workers.

pub mod cleanup_worker;
pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
