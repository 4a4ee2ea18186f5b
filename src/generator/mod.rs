//! Prompt generation on top of a [`CategoryStore`] snapshot.
//!
//! - [`PromptGenerator`]: per-category selectors joined by a priority preset
//! - [`GeekGenerator`]: `[tag]` expansion in a free-form template
//!
//! Both draw every random choice from one seeded generator per call, so equal
//! inputs over the same data produce equal prompts.
//!
//! [`CategoryStore`]: crate::data::CategoryStore

pub mod component;
pub mod expression;
pub mod geek;
pub mod prompt;
pub mod rewrite;

pub use component::ComponentGenerator;
pub use expression::combine_expression;
pub use geek::{GeekGenerator, GeekOutput};
pub use prompt::{join_fragments, FieldInput, PromptFragment, PromptGenerator, PromptRequest};
pub use rewrite::{dedupe_known_tags, RewriteRule, RewriteRules};
