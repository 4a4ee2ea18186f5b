//! Category data: directory walking, file loading, text cleaning and the
//! shared snapshot store.

pub mod cleaner;
pub mod loader;
pub mod store;
pub mod walker;

pub use cleaner::{clean_and_deduplicate, clean_prompt_string, remove_category_prefix, TextLanguage};
pub use loader::{DataFormat, FileLoader};
pub use store::{CategoryMapping, CategorySnapshot, CategoryStore, StructuredOption, TagSource};
pub use walker::{CategoryEntry, DirectoryWalker, Exclusion};
