//! Per-category fragment selection.
//!
//! A [`ComponentGenerator`] lives for one generation call and owns that call's
//! random source. Two selection strategies cover most categories:
//!
//! - **multi-file**: every file independently rolls for inclusion and
//!   contributes one item, joined with `", "`;
//! - **single-file**: one file is chosen, then one item from it.
//!
//! Descriptions use a fixed six-slot sentence template instead.
//!
//! Random fields are first passed through two gates: the empty gate (the
//! field resolves to nothing) and the custom gate (the caller's custom text is
//! used instead of data).

use crate::category::{Category, Strategy};
use crate::config::Probabilities;
use crate::data::cleaner::{clean_prompt_string, remove_category_prefix};
use crate::data::store::{CategorySnapshot, StructuredOption};
use crate::generator::expression::combine_expression;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Slots of the description template, in sentence order.
pub const DESCRIPTION_SLOTS: [&str; 6] = [
    "sensory",
    "detail",
    "quality",
    "composition",
    "color",
    "creativity",
];

/// Phrase used when a description slot has no data.
#[must_use]
pub fn description_default(slot: &str) -> &'static str {
    match slot {
        "sensory" => "visual feast",
        "detail" => "intricate details",
        "quality" => "exquisite quality",
        "composition" => "balanced composition",
        "color" => "harmonious colors",
        "creativity" => "unique creative vision",
        _ => "",
    }
}

/// Random source plus selection strategies for one generation call.
pub struct ComponentGenerator<'a> {
    rng: ChaCha8Rng,
    snapshot: &'a CategorySnapshot,
    probabilities: Probabilities,
}

impl<'a> ComponentGenerator<'a> {
    pub fn new(seed: u64, snapshot: &'a CategorySnapshot, probabilities: Probabilities) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            snapshot,
            probabilities,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &'a CategorySnapshot {
        self.snapshot
    }

    #[must_use]
    pub fn probabilities(&self) -> Probabilities {
        self.probabilities
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// True with probability `p`; `0.0` never, `1.0` always.
    pub fn roll(&mut self, p: f64) -> bool {
        self.rng.random::<f64>() < p
    }

    /// Apply the empty and custom gates.
    ///
    /// Returns `Some` when a gate decided the field: `""` for the empty gate,
    /// the cleaned custom text for the custom gate. Both gates are always
    /// rolled so the random sequence does not depend on the custom text; the
    /// custom gate only fires for non-empty custom text.
    pub fn gate(&mut self, custom: &str) -> Option<String> {
        if self.roll(self.probabilities.random_empty) {
            return Some(String::new());
        }
        let use_custom = self.roll(self.probabilities.custom_field);
        let custom = clean_prompt_string(custom, None);
        (use_custom && !custom.is_empty()).then_some(custom)
    }

    /// Random fragment for a category, gates included.
    pub fn generate_for(&mut self, category: Category, custom: &str) -> String {
        if let Some(decided) = self.gate(custom) {
            return decided;
        }
        let structured = self.snapshot.structured(category);
        self.generate_with_strategy(category.strategy(), structured)
    }

    /// Ungated fragment drawn from `options` with an explicit strategy.
    pub fn generate_with_strategy(
        &mut self,
        strategy: Strategy,
        options: &[StructuredOption],
    ) -> String {
        let raw = match strategy {
            Strategy::MultiFile => self.generate_from_multiple_files(options),
            Strategy::SingleFile => self.generate_from_single_file(options),
            Strategy::Description => self.generate_description(options),
        };
        clean_prompt_string(&raw, None)
    }

    /// Each file independently rolls for inclusion and contributes one item.
    pub fn generate_from_multiple_files(&mut self, options: &[StructuredOption]) -> String {
        let mut picked = Vec::new();
        for option in options {
            if !self.roll(self.probabilities.structured_select) {
                continue;
            }
            if let Some(item) = self.pick(option) {
                picked.push(item);
            }
        }
        picked.join(", ")
    }

    /// Choose one file uniformly, then one item from it.
    pub fn generate_from_single_file(&mut self, options: &[StructuredOption]) -> String {
        let Some(option) = options.choose(&mut self.rng) else {
            return String::new();
        };
        self.pick(option).unwrap_or_default()
    }

    /// Compose the six-slot description sentence.
    pub fn generate_description(&mut self, options: &[StructuredOption]) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(DESCRIPTION_SLOTS.len());
        for slot in DESCRIPTION_SLOTS {
            let pool: Vec<String> = options
                .iter()
                .filter(|o| o.label_matches(slot))
                .flat_map(|o| o.options.iter().map(move |item| (o.needs_prefix, item)))
                .map(|(needs_prefix, item)| strip_unless_needed(item, needs_prefix))
                .collect();
            let value = pool
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_else(|| description_default(slot).to_string());
            parts.push(value);
        }

        format!(
            "a {} of work with {} and {}, featuring a {} and {}, presenting a {}",
            parts[0], parts[1], parts[2], parts[3], parts[4], parts[5]
        )
    }

    /// Roll the intensity probability and draw one modifier.
    pub fn generate_exp_str(&mut self) -> String {
        if !self.roll(self.probabilities.exp_str_random) {
            return String::new();
        }
        self.snapshot
            .intensity_pool()
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }

    /// Combine an expression with an intensity through the shared rules.
    pub fn combine(&mut self, intensity: &str, expression: &str, probability: f64) -> String {
        combine_expression(
            intensity,
            expression,
            &mut self.rng,
            self.snapshot.intensity_pool(),
            probability,
        )
    }

    /// Pick one item from a file, stripping the prefix when the file needs none.
    fn pick(&mut self, option: &StructuredOption) -> Option<String> {
        option
            .options
            .choose(&mut self.rng)
            .map(|item| strip_unless_needed(item, option.needs_prefix))
            .filter(|item| !item.trim().is_empty())
    }
}

fn strip_unless_needed(item: &str, needs_prefix: bool) -> String {
    if needs_prefix {
        item.to_string()
    } else {
        remove_category_prefix(item).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::CategoryStore;
    use crate::testing::DataFixture;
    use std::sync::Arc;

    fn probabilities(empty: f64, custom: f64, select: f64) -> Probabilities {
        Probabilities {
            random_empty: empty,
            custom_field: custom,
            exp_str_random: 0.8,
            structured_select: select,
        }
    }

    fn option(label: &str, items: &[&str]) -> StructuredOption {
        StructuredOption {
            source_file: format!("x/{}.txt", label),
            category_label: label.to_string(),
            needs_prefix: false,
            options: Arc::new(items.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn snapshot(fixture: &DataFixture) -> Arc<CategorySnapshot> {
        CategoryStore::open(fixture.config()).unwrap().snapshot()
    }

    #[test]
    fn test_empty_gate_always_fires_at_one() {
        let snap = CategorySnapshot::default();
        for seed in 0..30 {
            let mut gen = ComponentGenerator::new(seed, &snap, probabilities(1.0, 1.0, 1.0));
            assert_eq!(gen.gate("custom"), Some(String::new()));
        }
    }

    #[test]
    fn test_custom_gate() {
        let snap = CategorySnapshot::default();
        let mut gen = ComponentGenerator::new(3, &snap, probabilities(0.0, 1.0, 1.0));
        assert_eq!(gen.gate(" my , text "), Some("my, text".to_string()));
        assert_eq!(gen.gate("   "), None);

        let mut gen = ComponentGenerator::new(3, &snap, probabilities(0.0, 0.0, 1.0));
        assert_eq!(gen.gate("custom"), None);
    }

    #[test]
    fn test_multi_file_all_included() {
        let snap = CategorySnapshot::default();
        let options = vec![option("a", &["red"]), option("b", &["blue"]), option("c", &[])];
        let mut gen = ComponentGenerator::new(9, &snap, probabilities(0.0, 0.0, 1.0));
        assert_eq!(gen.generate_from_multiple_files(&options), "red, blue");
    }

    #[test]
    fn test_multi_file_none_included() {
        let snap = CategorySnapshot::default();
        let options = vec![option("a", &["red"]), option("b", &["blue"])];
        let mut gen = ComponentGenerator::new(9, &snap, probabilities(0.0, 0.0, 0.0));
        assert_eq!(gen.generate_from_multiple_files(&options), "");
    }

    #[test]
    fn test_single_file_picks_from_one_file() {
        let snap = CategorySnapshot::default();
        let options = vec![option("a", &["red", "crimson"]), option("b", &["blue"])];
        for seed in 0..40 {
            let mut gen = ComponentGenerator::new(seed, &snap, probabilities(0.0, 0.0, 0.5));
            let value = gen.generate_from_single_file(&options);
            assert!(["red", "crimson", "blue"].contains(&value.as_str()), "{}", value);
        }
        let mut gen = ComponentGenerator::new(0, &snap, probabilities(0.0, 0.0, 0.5));
        assert_eq!(gen.generate_from_single_file(&[]), "");
    }

    #[test]
    fn test_pick_strips_prefix_only_when_not_needed() {
        let snap = CategorySnapshot::default();
        let mut plain = option("a", &["outdoor/park"]);
        let mut gen = ComponentGenerator::new(1, &snap, probabilities(0.0, 0.0, 1.0));
        assert_eq!(gen.generate_from_single_file(std::slice::from_ref(&plain)), "park");

        plain.needs_prefix = true;
        assert_eq!(gen.generate_from_single_file(&[plain]), "outdoor/park");
    }

    #[test]
    fn test_description_template() {
        let snap = CategorySnapshot::default();
        let options = vec![
            option("sensory", &["dreamlike feast"]),
            option("color", &["pastel tones"]),
        ];
        let mut gen = ComponentGenerator::new(4, &snap, probabilities(0.0, 0.0, 1.0));
        assert_eq!(
            gen.generate_description(&options),
            "a dreamlike feast of work with intricate details and exquisite quality, \
             featuring a balanced composition and pastel tones, presenting a unique creative vision"
        );
    }

    #[test]
    fn test_generate_for_never_empty_without_gates() {
        let fixture = DataFixture::new()
            .with_file("motion/1-standing.txt", "standing\n")
            .with_file("motion/2-sitting.txt", "sitting\n");
        let snap = snapshot(&fixture);
        for seed in 0..50 {
            let mut gen = ComponentGenerator::new(seed, &snap, probabilities(0.0, 0.0, 0.5));
            let value = gen.generate_for(Category::Motion, "custom");
            assert!(value == "standing" || value == "sitting", "{}", value);
        }
    }

    #[test]
    fn test_generate_exp_str() {
        let fixture = DataFixture::new().with_file("exp_str/1-levels.txt", "slightly\n");
        let snap = snapshot(&fixture);

        let mut always = probabilities(0.0, 0.0, 0.5);
        always.exp_str_random = 1.0;
        let mut gen = ComponentGenerator::new(2, &snap, always);
        assert_eq!(gen.generate_exp_str(), "slightly");

        let mut never = always;
        never.exp_str_random = 0.0;
        let mut gen = ComponentGenerator::new(2, &snap, never);
        assert_eq!(gen.generate_exp_str(), "");
    }

    #[test]
    fn test_same_seed_same_choices() {
        let snap = CategorySnapshot::default();
        let options: Vec<_> = (0..6)
            .map(|i| option(&format!("f{}", i), &["a", "b", "c", "d"]))
            .collect();
        let run = |seed| {
            let mut gen = ComponentGenerator::new(seed, &snap, probabilities(0.1, 0.0, 0.5));
            (0..10)
                .map(|_| gen.generate_from_multiple_files(&options))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }
}
