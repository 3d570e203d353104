//! Application layer: services orchestrating repositories, caches and tokens.

pub mod services;
