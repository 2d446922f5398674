//! Core types and the scheduling engine for Mentor.
//!
//! No HTTP or database dependencies live here. The storage backend
//! (`mentor-store-sqlite`) and the service shell (`mentor-api`,
//! `mentor-server`) build on this crate.

pub mod badge;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod review;
pub mod store;
pub mod summary;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use engine::MasteryEngine;
pub use error::{Error, Result};
