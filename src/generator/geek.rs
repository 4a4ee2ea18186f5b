//! Geek mode: `[category]` tag expansion in a free-form template.
//!
//! Each bracketed tag is looked up in the store's [`CategoryMapping`] and
//! replaced by one randomly composed value:
//!
//! - expression tags combine a drawn expression with an intensity;
//! - `all <category>` tags apply the category's strategy across every mapped
//!   file;
//! - any other tag picks one mapped file, then one item from it.
//!
//! Unknown tags stay in the output untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use promptweave::generator::GeekGenerator;
//!
//! let geek = GeekGenerator::new(&store);
//! let out = geek.generate_prompt(7, "[scene], [all lighting], [mood]", "a lighthouse");
//! println!("{}\n{}", out.prompt, out.sys_prompt);
//! ```
//!
//! [`CategoryMapping`]: crate::data::store::CategoryMapping

use crate::category::Category;
use crate::data::cleaner::{clean_prompt_string, detect_language, remove_category_prefix};
use crate::data::store::{CategoryStore, TagSource};
use crate::generator::component::ComponentGenerator;
use crate::generator::rewrite::RewriteRules;
use rand::seq::IndexedRandom;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").expect("valid regex"))
}

/// Private-use range standing in for bracketed spans while cleaning.
const MASK_FIRST: char = '\u{E000}';
const MASK_LAST: char = '\u{F8FF}';

/// Expanded prompt plus the instruction text for a downstream LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeekOutput {
    pub prompt: String,
    pub sys_prompt: String,
}

/// Template expansion over the category mapping.
pub struct GeekGenerator<'a> {
    store: &'a CategoryStore,
}

impl<'a> GeekGenerator<'a> {
    pub fn new(store: &'a CategoryStore) -> Self {
        Self { store }
    }

    /// Expand `custom_prompt` and prepend `custom_subject`.
    pub fn generate_prompt(&self, seed: u64, custom_prompt: &str, custom_subject: &str) -> GeekOutput {
        let snapshot = self.store.snapshot();
        let config = self.store.config();
        let mut gen = ComponentGenerator::new(seed, &snapshot, config.probabilities());

        let expanded = clean_keeping_tags(&expand_template(&mut gen, custom_prompt));
        let subject = clean_prompt_string(custom_subject, None);

        let prompt = match (subject.is_empty(), expanded.is_empty()) {
            (false, false) => format!("{}, {}", subject, expanded),
            (false, true) => subject,
            (true, _) => expanded,
        };

        GeekOutput {
            prompt: clean_keeping_tags(&prompt),
            sys_prompt: config.system_prompt.clone(),
        }
    }

    /// Caller-side variant: rewrite and de-duplicate the template, expand it,
    /// then rewrite the result.
    pub fn generate_with_rewrites(
        &self,
        seed: u64,
        custom_prompt: &str,
        custom_subject: &str,
        rules: &RewriteRules,
    ) -> GeekOutput {
        let mut rewrite_rng = RewriteRules::rng_for(seed);
        let template = rules.apply_pre(custom_prompt, &mut rewrite_rng);
        let template = rules.dedupe(&template);

        let mut output = self.generate_prompt(seed, &template, custom_subject);
        let rewritten = rules.apply_post(&output.prompt, &mut rewrite_rng);
        output.prompt = clean_keeping_tags(&rewritten);
        output
    }
}

/// Replace every known `[tag]` in `template` with a drawn value.
pub fn expand_template(gen: &mut ComponentGenerator<'_>, template: &str) -> String {
    tag_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let tag = caps[1].trim();
            match expand_tag(gen, tag) {
                Some(value) => value,
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Expand one tag, or `None` when the mapping does not know it.
pub fn expand_tag(gen: &mut ComponentGenerator<'_>, tag: &str) -> Option<String> {
    let snapshot = gen.snapshot();
    let Some((key, source)) = snapshot.mapping().get(tag) else {
        let similar = snapshot.mapping().similar(tag);
        tracing::warn!("Unknown tag [{}]; similar tags: {:?}", tag, similar);
        return None;
    };

    let value = if source.category == Category::Expression {
        expand_expression(gen, source)
    } else if key.starts_with("all ") {
        if let Some(decided) = gen.gate("") {
            return Some(decided);
        }
        let options = snapshot.structured_for(&source.files);
        gen.generate_with_strategy(source.category.strategy(), &options)
    } else {
        expand_leaf(gen, source)
    };

    tracing::debug!("[{}] -> {:?}", key, value);
    Some(value)
}

fn expand_expression(gen: &mut ComponentGenerator<'_>, source: &TagSource) -> String {
    if let Some(decided) = gen.gate("") {
        return decided;
    }
    let options = gen.snapshot().structured_for(&source.files);
    let expression = gen.generate_from_single_file(&options);
    let probability = gen.probabilities().exp_str_random;
    gen.combine("", &expression, probability)
}

/// Clean `text` while leaving every `[...]` span byte-for-byte intact.
///
/// Unknown tags survive expansion verbatim, so cleaning must not respace the
/// punctuation inside them.
pub fn clean_keeping_tags(text: &str) -> String {
    let language = detect_language(text);
    if text.chars().any(|c| (MASK_FIRST..=MASK_LAST).contains(&c)) {
        return clean_prompt_string(text, Some(language));
    }

    let mut kept: Vec<String> = Vec::new();
    let masked = tag_re().replace_all(text, |caps: &regex::Captures<'_>| {
        let mask = u32::try_from(kept.len())
            .ok()
            .and_then(|i| char::from_u32(u32::from(MASK_FIRST) + i))
            .filter(|c| *c <= MASK_LAST);
        match mask {
            Some(mask) => {
                kept.push(caps[0].to_string());
                mask.to_string()
            }
            None => caps[0].to_string(),
        }
    });

    let cleaned = clean_prompt_string(&masked, Some(language));
    let mut out = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        let tag = (MASK_FIRST..=MASK_LAST)
            .contains(&c)
            .then(|| (u32::from(c) - u32::from(MASK_FIRST)) as usize)
            .and_then(|i| kept.get(i));
        match tag {
            Some(tag) => out.push_str(tag),
            None => out.push(c),
        }
    }
    out
}

fn expand_leaf(gen: &mut ComponentGenerator<'_>, source: &TagSource) -> String {
    let snapshot = gen.snapshot();
    let Some(entry) = source.files.choose(gen.rng()) else {
        return String::new();
    };
    let Some(file) = snapshot.file(&entry.file_relative_path) else {
        return String::new();
    };
    file.options
        .choose(gen.rng())
        .map(|item| clean_prompt_string(remove_category_prefix(item), None))
        .unwrap_or_default()
}
