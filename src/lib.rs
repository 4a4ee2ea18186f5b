//! promptweave - hierarchical weighted prompt composition
//!
//! Builds text prompts for image generation models from a tree of category
//! data files, driven by per-category selectors or by `[tag]` templates.
//!
//! # Architecture
//!
//! - [`category`] - Categories, selectors and priority presets
//! - [`config`] - Configuration loading and validation
//! - [`data`] - Directory walking, file loading and the category store
//! - [`error`] - Custom error types and handling
//! - [`generator`] - Selector-driven and Geek-mode prompt generation
//! - [`testing`] - Testing infrastructure (fixtures, assertions)
//!
//! # Example
//!
//! ```rust,ignore
//! use promptweave::{Category, CategoryStore, GeneratorConfig, Selector};
//! use promptweave::generator::{GeekGenerator, PromptGenerator, PromptRequest};
//!
//! let store = CategoryStore::open(GeneratorConfig::with_data_root("data"))?;
//!
//! let request = PromptRequest::new(42)
//!     .with_subject("a lighthouse keeper")
//!     .with_field(Category::Scene, Selector::Random, "")
//!     .with_field(Category::Lighting, Selector::Random, "");
//! println!("{}", PromptGenerator::new(&store).generate_prompt(&request));
//!
//! let geek = GeekGenerator::new(&store).generate_prompt(42, "[scene], [all camera]", "");
//! println!("{}", geek.prompt);
//! ```

pub mod category;
pub mod config;
pub mod data;
pub mod error;
pub mod generator;
pub mod testing;

// Re-export commonly used types
pub use category::{Category, PromptPriority, Selector};
pub use config::GeneratorConfig;
pub use data::CategoryStore;
pub use error::{PromptError, Result};
