//! Library crate for reelmatch, the coordination core of a group
//! movie-picking session: short-code rooms replicated through a
//! hierarchical key/value store with per-path change notifications.

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod rooms;
pub mod session;
pub mod store;
