//! Recap video generator.
//!
//! This crate provides:
//! - Options loading from YAML, environment and flags
//! - Interactive option prompts
//! - The staged recap pipeline
//! - Structured stage logging

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prompt;

pub use config::{load_options, CliOverrides, DEFAULT_OPTIONS_FILE};
pub use error::{RecapError, RecapResult};
pub use logging::StageLogger;
pub use pipeline::{ClipPlan, RangeOrigin, RecapPipeline, SourceVideo};
