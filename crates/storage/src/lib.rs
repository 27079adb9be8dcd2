//! Storage abstraction and implementations for Questline.
//!
//! This crate provides a trait-based storage interface over the game's
//! three keyspaces (`config`, `user_progress/{id}`, `admins/{key}`) with an
//! in-memory backend and a JSON-file backend.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;

mod notify;

pub use trait_::{Result, Storage, StorageError};
pub use memory::MemoryStorage;
pub use json_storage::JsonStorage;
