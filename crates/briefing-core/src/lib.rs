//! # Briefing Core
//!
//! The domain layer of the briefing publishing backend.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod store;

pub use error::StoreError;
pub use store::{AdjacentPosts, PostStore};
