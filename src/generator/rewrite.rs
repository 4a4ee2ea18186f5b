//! Text rewrite rules applied around Geek expansion.
//!
//! Rules are plain substring substitutions loaded from JSON:
//!
//! ```json
//! {
//!   "pre":  [{ "find": "[mood]", "replace": "[all expression]" }],
//!   "post": [{ "find": "sunset", "replace": "golden hour", "probability": 0.5 }],
//!   "dedupe_tags": ["[scene]", "[all lighting]"]
//! }
//! ```
//!
//! `pre` rules run on the template, `post` rules on the expanded prompt.

use crate::error::{PromptError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tags kept only once in a template when no list is configured.
pub const DEFAULT_DEDUPE_TAGS: &[&str] = &[
    "[all scene]",
    "[scene]",
    "[season]",
    "[all lighting]",
    "[all camera]",
    "[all style]",
];

fn default_probability() -> f64 {
    1.0
}

/// One substring substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub find: String,
    #[serde(default)]
    pub replace: String,
    /// Chance the rule applies when `find` occurs.
    #[serde(default = "default_probability")]
    pub probability: f64,
}

impl RewriteRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            probability: 1.0,
        }
    }

    #[must_use]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    fn apply<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Option<String> {
        if self.find.is_empty() || !text.contains(&self.find) {
            return None;
        }
        if rng.random::<f64>() >= self.probability {
            return None;
        }
        Some(text.replace(&self.find, &self.replace))
    }
}

/// Pre- and post-expansion rules plus the de-duplicated tag list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRules {
    #[serde(default)]
    pub pre: Vec<RewriteRule>,
    #[serde(default)]
    pub post: Vec<RewriteRule>,
    #[serde(default = "default_dedupe_tags")]
    pub dedupe_tags: Vec<String>,
}

fn default_dedupe_tags() -> Vec<String> {
    DEFAULT_DEDUPE_TAGS.iter().map(|t| (*t).to_string()).collect()
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            pre: Vec::new(),
            post: Vec::new(),
            dedupe_tags: default_dedupe_tags(),
        }
    }
}

impl RewriteRules {
    /// Load rules from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let rules: RewriteRules = serde_json::from_str(&content)
            .map_err(|e| PromptError::config_with_path(e.to_string(), path.to_path_buf()))?;
        rules.validate()?;
        tracing::debug!(
            "Loaded {} pre and {} post rewrite rules from {}",
            rules.pre.len(),
            rules.post.len(),
            path.display()
        );
        Ok(rules)
    }

    pub fn validate(&self) -> Result<()> {
        for rule in self.pre.iter().chain(&self.post) {
            if rule.find.is_empty() {
                return Err(PromptError::invalid_config("rewrite_rules", "empty 'find'"));
            }
            if !(0.0..=1.0).contains(&rule.probability) {
                return Err(PromptError::invalid_config(
                    "rewrite_rules",
                    format!(
                        "probability for '{}' must be within [0, 1], got {}",
                        rule.find, rule.probability
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Random source for rule rolls, independent of the expansion sequence.
    pub fn rng_for(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed.wrapping_add(1))
    }

    pub fn apply_pre<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        apply_all(&self.pre, text, rng)
    }

    pub fn apply_post<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        apply_all(&self.post, text, rng)
    }

    pub fn dedupe(&self, text: &str) -> String {
        dedupe_known_tags(text, &self.dedupe_tags)
    }
}

fn apply_all<R: Rng + ?Sized>(rules: &[RewriteRule], text: &str, rng: &mut R) -> String {
    let mut current = text.to_string();
    for rule in rules {
        if let Some(next) = rule.apply(&current, rng) {
            tracing::trace!("rewrite '{}' -> '{}'", rule.find, rule.replace);
            current = next;
        }
    }
    current
}

/// Keep only the first occurrence of each listed tag.
pub fn dedupe_known_tags<S: AsRef<str>>(text: &str, tags: &[S]) -> String {
    let mut result = text.to_string();
    for tag in tags {
        let tag = tag.as_ref();
        if tag.is_empty() {
            continue;
        }
        let Some(first) = result.find(tag) else {
            continue;
        };
        let keep_until = first + tag.len();
        let tail = result[keep_until..].replace(tag, "");
        result.truncate(keep_until);
        result.push_str(&tail);
    }
    result
}
