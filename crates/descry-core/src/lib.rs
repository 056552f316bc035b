//! # descry-core
//!
//! Core types, traits, and abstractions for the descry image queue.
//!
//! This crate provides the data model, error taxonomy and trait seams that
//! the store, inference, worker and API crates depend on.

pub mod defaults;
pub mod error;
pub mod lease;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ExtractionError, Result};
pub use lease::{QueueLease, QueueLock};
pub use models::*;
pub use traits::*;
