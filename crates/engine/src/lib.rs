//! Questline game engine.
//!
//! The sole authority over the game's state transitions: stage advancement
//! from QR scans, coupon redemption, catalog configuration, and the admin
//! capability check. Every service is constructed with an injected
//! [`Storage`](questline_storage::Storage) handle; there is no global state.

#![warn(missing_docs)]

pub mod engine;
pub mod redemption;
pub mod catalog;
pub mod admin;

mod error;

pub use engine::ProgressEngine;
pub use redemption::RedemptionGate;
pub use catalog::CatalogStore;
pub use admin::AdminRegistry;
pub use error::EngineError;
