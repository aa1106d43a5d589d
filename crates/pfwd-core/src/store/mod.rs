//! Persistent store (SQLite via sqlx).
//!
//! Holds the entities the forwarder resolves, per-entity setting values, and
//! session maps keyed by session id.

mod db;
mod entities;
mod sessions;
mod settings;

pub use db::Store;

#[cfg(test)]
pub(crate) use db::open_memory;
