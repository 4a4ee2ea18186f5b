//! Testing infrastructure for promptweave.
//!
//! - **Fixtures**: temporary category trees (test-only)
//! - **Assertions**: checks on composed prompt text
//!
//! # Example
//!
//! ```rust,ignore
//! use promptweave::testing::{assert_clean_join, DataFixture};
//!
//! let fixture = DataFixture::new()
//!     .with_file("scene/1-places.txt", "desert\nharbor\n");
//! let store = CategoryStore::open(fixture.config())?;
//! ```

pub mod assertions;
#[cfg(test)]
pub mod fixtures;

pub use assertions::*;
#[cfg(test)]
pub use fixtures::*;
