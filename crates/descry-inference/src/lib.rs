//! # descry-inference
//!
//! Extraction backends for descry.
//!
//! This crate provides:
//! - Input validation (existence, size limit, image magic bytes)
//! - [`ExtractorRegistry`], routing each model selector to a backend
//! - [`OllamaVisionExtractor`], an HTTP vision backend
//! - [`FixedExtractor`], the deterministic `test` backend

pub mod fixed;
pub mod registry;
pub mod validation;
pub mod vision;

pub use fixed::{FixedExtractor, FIXED_DESCRIPTION};
pub use registry::ExtractorRegistry;
pub use validation::{max_input_bytes_from_env, validate_input, ValidatedInput};
pub use vision::OllamaVisionExtractor;
