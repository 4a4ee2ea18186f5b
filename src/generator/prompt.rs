//! Selector-driven prompt generation.
//!
//! Each category resolves independently from its [`Selector`]:
//!
//! | selector | fragment |
//! |----------|----------|
//! | `disable` | nothing |
//! | `enable` | the cleaned custom text |
//! | `random` | the category's random strategy (gates included) |
//! | `use image N` | custom text, else `use image N <role>` |
//! | literal | custom text, else the literal without its category prefix |
//!
//! Expressions additionally pass through [`combine_expression`] with the
//! expression-strength field. Fragments are then ordered by a
//! [`PromptPriority`] preset, empties dropped, and joined with `", "`.
//!
//! [`combine_expression`]: crate::generator::expression::combine_expression

use crate::category::{Category, PromptPriority, PromptSlot, Selector};
use crate::data::cleaner::{clean_prompt_string, remove_category_prefix};
use crate::data::store::CategoryStore;
use crate::generator::component::ComponentGenerator;
use std::collections::HashMap;

/// Selector and custom text for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInput {
    pub selector: Selector,
    pub custom: String,
}

impl FieldInput {
    pub fn new(selector: Selector, custom: impl Into<String>) -> Self {
        Self {
            selector,
            custom: custom.into(),
        }
    }
}

/// Everything one `generate_prompt` call needs.
///
/// # Example
///
/// ```rust
/// use promptweave::category::{Category, PromptPriority, Selector};
/// use promptweave::generator::PromptRequest;
///
/// let request = PromptRequest::new(42)
///     .with_priority(PromptPriority::LightingCamera)
///     .with_subject("a red fox")
///     .with_field(Category::Scene, Selector::Random, "")
///     .with_field(Category::Lighting, Selector::Literal("soft/rim light".into()), "");
/// assert_eq!(request.field(Category::Motion).selector, Selector::Disable);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptRequest {
    pub seed: u64,
    pub priority: PromptPriority,
    pub custom_subject: String,
    fields: HashMap<Category, FieldInput>,
}

impl PromptRequest {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: PromptPriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.custom_subject = subject.into();
        self
    }

    #[must_use]
    pub fn with_field(
        mut self,
        category: Category,
        selector: Selector,
        custom: impl Into<String>,
    ) -> Self {
        self.fields.insert(category, FieldInput::new(selector, custom));
        self
    }

    /// Set every category's selector at once.
    #[must_use]
    pub fn with_all(mut self, selector: Selector) -> Self {
        for category in Category::all() {
            self.fields.entry(*category).or_default().selector = selector.clone();
        }
        self
    }

    /// The input for a category; unset categories are disabled.
    #[must_use]
    pub fn field(&self, category: Category) -> FieldInput {
        self.fields.get(&category).cloned().unwrap_or_default()
    }
}

/// A resolved fragment for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFragment {
    pub slot: PromptSlot,
    pub value: String,
}

/// Resolves selectors into a joined prompt.
pub struct PromptGenerator<'a> {
    store: &'a CategoryStore,
}

impl<'a> PromptGenerator<'a> {
    pub fn new(store: &'a CategoryStore) -> Self {
        Self { store }
    }

    /// Compose and join a prompt. Identical requests give identical output.
    pub fn generate_prompt(&self, request: &PromptRequest) -> String {
        let fragments = self.compose(request);
        join_fragments(request.priority, &fragments)
    }

    /// Resolve every slot, in a fixed order independent of priority.
    pub fn compose(&self, request: &PromptRequest) -> Vec<PromptFragment> {
        let snapshot = self.store.snapshot();
        let config = self.store.config();
        let mut gen = ComponentGenerator::new(request.seed, &snapshot, config.probabilities());

        let mut fragments = vec![PromptFragment {
            slot: PromptSlot::Subject,
            value: clean_prompt_string(&request.custom_subject, None),
        }];

        for slot in PromptPriority::SubjectScene.order() {
            let Some(category) = slot.category() else {
                continue;
            };
            let field = request.field(category);
            let value = match category {
                Category::Expression => self.resolve_expression(&mut gen, request, &field),
                _ => self.resolve(&mut gen, category, &field),
            };
            tracing::debug!("{:?} -> {:?}", slot, value);
            fragments.push(PromptFragment { slot, value });
        }

        fragments
    }

    fn resolve(
        &self,
        gen: &mut ComponentGenerator<'_>,
        category: Category,
        field: &FieldInput,
    ) -> String {
        match &field.selector {
            Selector::Disable => String::new(),
            Selector::Enable => clean_prompt_string(&field.custom, None),
            Selector::Random => gen.generate_for(category, &field.custom),
            Selector::UseImage(n) => custom_or(&field.custom, || {
                format!("use image {} {}", n, category.reference_role())
            }),
            Selector::Literal(value) => custom_or(&field.custom, || {
                clean_prompt_string(remove_category_prefix(value), None)
            }),
        }
    }

    fn resolve_expression(
        &self,
        gen: &mut ComponentGenerator<'_>,
        request: &PromptRequest,
        field: &FieldInput,
    ) -> String {
        match &field.selector {
            Selector::Disable => String::new(),
            Selector::Enable => clean_prompt_string(&field.custom, None),
            Selector::UseImage(n) => custom_or(&field.custom, || {
                format!("use image {} {}", n, Category::Expression.reference_role())
            }),
            Selector::Random => {
                if let Some(decided) = gen.gate(&field.custom) {
                    return decided;
                }
                let options = gen.snapshot().structured(Category::Expression);
                let expression = gen.generate_from_single_file(options);
                let (intensity, probability) = self.resolve_intensity(gen, request);
                gen.combine(&intensity, &expression, probability)
            }
            Selector::Literal(value) => {
                let custom = clean_prompt_string(&field.custom, None);
                if !custom.is_empty() {
                    return custom;
                }
                let (intensity, probability) = self.resolve_intensity(gen, request);
                gen.combine(&intensity, remove_category_prefix(value), probability)
            }
        }
    }

    /// Intensity text and draw probability from the expression-strength field.
    fn resolve_intensity(
        &self,
        gen: &mut ComponentGenerator<'_>,
        request: &PromptRequest,
    ) -> (String, f64) {
        let field = request.field(Category::ExpressionIntensity);
        match &field.selector {
            Selector::Disable => (String::new(), 0.0),
            Selector::Enable | Selector::UseImage(_) => {
                (clean_prompt_string(&field.custom, None), 0.0)
            }
            // `generate_exp_str` has already rolled the intensity probability.
            Selector::Random => (gen.generate_exp_str(), 0.0),
            Selector::Literal(value) => (
                custom_or(&field.custom, || remove_category_prefix(value).to_string()),
                0.0,
            ),
        }
    }
}

fn custom_or(custom: &str, fallback: impl FnOnce() -> String) -> String {
    let cleaned = clean_prompt_string(custom, None);
    if cleaned.is_empty() {
        fallback()
    } else {
        cleaned
    }
}

/// Order fragments by priority, drop empties and join with `", "`.
#[must_use]
pub fn join_fragments(priority: PromptPriority, fragments: &[PromptFragment]) -> String {
    priority
        .order()
        .iter()
        .filter_map(|slot| fragments.iter().find(|f| f.slot == *slot))
        .map(|f| f.value.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::testing::{assert_clean_join, DataFixture};

    fn sample() -> DataFixture {
        DataFixture::new()
            .with_file("scene/1-desert.txt", "desert\n")
            .with_file("motion/1-standing.txt", "standing\n")
            .with_file("facial_action/1-eyes.txt", "eyes closed\n")
            .with_file("exp_str/1-levels.txt", "slightly\n")
            .with_file("expression/1-happy.txt", "smiling\n")
            .with_file("lighting/1-light.txt", "soft light\n")
            .with_file("camera/1-angle.txt", "low angle\n")
            .with_file("style/1-style.txt", "watercolor\n")
    }

    fn config(fixture: &DataFixture, empty: f64, custom: f64) -> GeneratorConfig {
        let mut config = fixture.config();
        config.random_empty_prob = empty;
        config.custom_field_prob = custom;
        config.structured_select_prob = 1.0;
        config.exp_str_random_prob = 0.0;
        config
    }

    #[test]
    fn test_disable_enable_literal() {
        let fixture = sample();
        let store = CategoryStore::open(config(&fixture, 0.0, 0.0)).unwrap();
        let gen = PromptGenerator::new(&store);

        let request = PromptRequest::new(1)
            .with_subject("a fox")
            .with_field(Category::Scene, Selector::Disable, "ignored")
            .with_field(Category::Motion, Selector::Enable, " running ,")
            .with_field(Category::Lighting, Selector::Literal("soft/rim light".into()), "");
        assert_eq!(gen.generate_prompt(&request), "a fox, running, rim light");
    }

    #[test]
    fn test_literal_prefers_custom() {
        let fixture = sample();
        let store = CategoryStore::open(config(&fixture, 0.0, 0.0)).unwrap();
        let gen = PromptGenerator::new(&store);

        let request = PromptRequest::new(1)
            .with_field(Category::Camera, Selector::Literal("angle/low angle".into()), "fisheye");
        assert_eq!(gen.generate_prompt(&request), "fisheye");
    }

    #[test]
    fn test_use_image_reference() {
        let fixture = sample();
        let store = CategoryStore::open(config(&fixture, 0.0, 0.0)).unwrap();
        let gen = PromptGenerator::new(&store);

        let request = PromptRequest::new(1)
            .with_field(Category::Motion, Selector::UseImage(2), "")
            .with_field(Category::Scene, Selector::UseImage(1), "my own scene");
        assert_eq!(
            gen.generate_prompt(&request),
            "my own scene, use image 2 pose"
        );
    }

    #[test]
    fn test_random_all_categories_without_gates() {
        let fixture = sample();
        let store = CategoryStore::open(config(&fixture, 0.0, 0.0)).unwrap();
        let gen = PromptGenerator::new(&store);

        let request = PromptRequest::new(5)
            .with_all(Selector::Random)
            .with_field(Category::Description, Selector::Disable, "")
            .with_field(Category::ExpressionIntensity, Selector::Disable, "");
        assert_eq!(
            gen.generate_prompt(&request),
            "desert, standing, eyes closed, smiling, soft light, low angle, watercolor"
        );
    }

    #[test]
    fn test_empty_gate_at_one_blanks_random_fields() {
        let fixture = sample();
        let store = CategoryStore::open(config(&fixture, 1.0, 0.0)).unwrap();
        let gen = PromptGenerator::new(&store);

        for seed in 0..20 {
            let request = PromptRequest::new(seed)
                .with_all(Selector::Random)
                .with_subject("a fox")
                .with_field(Category::Camera, Selector::Literal("close-up".into()), "");
            assert_eq!(gen.generate_prompt(&request), "a fox, close-up");
        }
    }

    #[test]
    fn test_expression_literal_with_intensity() {
        let fixture = sample();
        let store = CategoryStore::open(config(&fixture, 0.0, 0.0)).unwrap();
        let gen = PromptGenerator::new(&store);

        let request = PromptRequest::new(1)
            .with_field(Category::Expression, Selector::Literal("happy/smiling".into()), "")
            .with_field(Category::ExpressionIntensity, Selector::Literal("levels/very".into()), "");
        assert_eq!(gen.generate_prompt(&request), "very smiling");

        let request = PromptRequest::new(1)
            .with_field(Category::Expression, Selector::Literal("happy/smiling".into()), "")
            .with_field(Category::ExpressionIntensity, Selector::Disable, "");
        assert_eq!(gen.generate_prompt(&request), "smiling");
    }

    #[test]
    fn test_expression_random_with_random_intensity() {
        let fixture = sample();
        let mut cfg = config(&fixture, 0.0, 0.0);
        cfg.exp_str_random_prob = 1.0;
        let store = CategoryStore::open(cfg).unwrap();
        let gen = PromptGenerator::new(&store);

        let request = PromptRequest::new(8)
            .with_field(Category::Expression, Selector::Random, "")
            .with_field(Category::ExpressionIntensity, Selector::Random, "");
        assert_eq!(gen.generate_prompt(&request), "slightly smiling");
    }

    #[test]
    fn test_priority_reorders() {
        let fixture = sample();
        let store = CategoryStore::open(config(&fixture, 0.0, 0.0)).unwrap();
        let gen = PromptGenerator::new(&store);

        let base = PromptRequest::new(3)
            .with_subject("a fox")
            .with_field(Category::Scene, Selector::Enable, "forest")
            .with_field(Category::Lighting, Selector::Enable, "dusk")
            .with_field(Category::Camera, Selector::Enable, "wide shot")
            .with_field(Category::Style, Selector::Enable, "ink");

        assert_eq!(
            gen.generate_prompt(&base.clone().with_priority(PromptPriority::SubjectScene)),
            "a fox, forest, dusk, wide shot, ink"
        );
        assert_eq!(
            gen.generate_prompt(&base.clone().with_priority(PromptPriority::LightingCamera)),
            "dusk, wide shot, a fox, forest, ink"
        );
        assert_eq!(
            gen.generate_prompt(&base.with_priority(PromptPriority::DescriptionStyle)),
            "ink, a fox, forest, dusk, wide shot"
        );
    }

    #[test]
    fn test_random_intensity_rolled_once() {
        let fixture = sample();
        let mut config = config(&fixture, 0.0, 0.0);
        config.exp_str_random_prob = 0.5;
        let store = CategoryStore::open(config).unwrap();
        let gen = PromptGenerator::new(&store);

        let trials = 400;
        let attached = (0..trials)
            .filter(|seed| {
                let request = PromptRequest::new(*seed)
                    .with_field(Category::Expression, Selector::Random, "")
                    .with_field(Category::ExpressionIntensity, Selector::Random, "");
                gen.generate_prompt(&request) == "slightly smiling"
            })
            .count();

        // Two rolls at 0.5 would attach about 75% of the time.
        assert!(
            (140..=260).contains(&attached),
            "attached {} of {}",
            attached,
            trials
        );
    }

    #[test]
    fn test_deterministic_for_seed() {
        let fixture = DataFixture::sample_tree();
        let store = CategoryStore::open(fixture.config()).unwrap();
        let gen = PromptGenerator::new(&store);

        for seed in [0, 1, 42, u64::MAX] {
            let request = PromptRequest::new(seed)
                .with_all(Selector::Random)
                .with_subject("a knight");
            let first = gen.generate_prompt(&request);
            assert_eq!(first, gen.generate_prompt(&request));

            store.invalidate();
            assert_eq!(first, gen.generate_prompt(&request));
            assert_clean_join(&first);
        }
    }

    #[test]
    fn test_join_fragments_drops_empties() {
        let fragments = vec![
            PromptFragment {
                slot: PromptSlot::Subject,
                value: String::new(),
            },
            PromptFragment {
                slot: PromptSlot::Scene,
                value: "forest".into(),
            },
            PromptFragment {
                slot: PromptSlot::Motion,
                value: "  ".into(),
            },
            PromptFragment {
                slot: PromptSlot::Camera,
                value: "wide".into(),
            },
        ];
        assert_eq!(
            join_fragments(PromptPriority::SubjectScene, &fragments),
            "forest, wide"
        );
    }
}
