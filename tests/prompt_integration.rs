//! Integration tests for the public generation API.
//!
//! Each test builds its own data root in a temp dir; the crate's fixtures are
//! only compiled for unit tests.

use promptweave::category::{Category, PromptPriority, Selector};
use promptweave::data::cleaner::{clean_prompt_string, remove_category_prefix};
use promptweave::data::walker::Exclusion;
use promptweave::generator::{GeekGenerator, PromptGenerator, PromptRequest};
use promptweave::testing::assert_clean_join;
use promptweave::{CategoryStore, GeneratorConfig, PromptError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn data_root(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (relative, content) in files {
        write(temp.path(), relative, content);
    }
    temp
}

fn full_tree() -> TempDir {
    data_root(&[
        ("scene/1-season.txt", "spring\nwinter\n"),
        ("scene/2-outdoor/1-landscape.txt", "forest\nharbor\n"),
        ("scene/2-outdoor/2-weather.txt", "fog\nlight rain\n"),
        ("motion/1-pose.txt", "standing\nsitting\n"),
        ("facial_action/1-eyes.txt", "eyes closed\nwinking\n"),
        ("exp_str/1-levels.txt", "slightly\nvery\n"),
        ("expression/1-happy.txt", "smiling\nlaughing\n"),
        ("expression/2-sad.json", r#"["crying", "frowning"]"#),
        ("lighting/1-natural.txt", "soft light\ngolden hour\n"),
        ("camera/1-angle.txt", "low angle\nhigh angle\n"),
        ("camera/2-shot.txt", "close-up\nwide shot\n"),
        ("style/1-artist/1-painters.txt", "monet\nklimt\n"),
        ("style/2-form/1-media.txt", "watercolor\nink\n"),
        ("description/1-sensory.txt", "dreamlike atmosphere\n"),
        ("description/2-color.txt", "muted tones\n"),
    ])
}

fn open(root: &TempDir, tweak: impl FnOnce(&mut GeneratorConfig)) -> CategoryStore {
    let mut config = GeneratorConfig::with_data_root(root.path());
    tweak(&mut config);
    CategoryStore::open(config).unwrap()
}

// ============================================================================
// Determinism and cleanliness
// ============================================================================

#[test]
fn test_same_seed_same_prompt_across_stores() {
    let root = full_tree();
    let first_store = open(&root, |_| {});
    let second_store = open(&root, |_| {});

    for seed in [0u64, 7, 99, 123_456_789] {
        let request = PromptRequest::new(seed)
            .with_all(Selector::Random)
            .with_subject("a lighthouse keeper");
        let a = PromptGenerator::new(&first_store).generate_prompt(&request);
        let b = PromptGenerator::new(&second_store).generate_prompt(&request);
        assert_eq!(a, b, "seed {}", seed);
        assert_clean_join(&a);
    }
}

#[test]
fn test_no_empty_joins_for_any_seed() {
    let root = full_tree();
    let store = open(&root, |c| c.random_empty_prob = 0.5);
    let generator = PromptGenerator::new(&store);

    for seed in 0..200 {
        for priority in [
            PromptPriority::SubjectScene,
            PromptPriority::DescriptionStyle,
            PromptPriority::DescriptionStyleLightingCamera,
            PromptPriority::LightingCamera,
        ] {
            let request = PromptRequest::new(seed)
                .with_priority(priority)
                .with_all(Selector::Random);
            let prompt = generator.generate_prompt(&request);
            assert_clean_join(&prompt);
            assert!(!prompt.contains(", , "));
        }
    }
}

#[test]
fn test_cleaning_is_idempotent() {
    let samples = [
        "  red sky , , ,blue sea  ",
        "a,,b;;c!!",
        ", leading and trailing ,",
        "1,000 stars . .",
        "夕阳，，海边。",
        "",
        "mixed 日本 text , ok",
    ];
    for sample in samples {
        let once = clean_prompt_string(sample, None);
        assert_eq!(clean_prompt_string(&once, None), once, "{:?}", sample);
    }
}

// ============================================================================
// Gates
// ============================================================================

#[test]
fn test_empty_gate_at_one_blanks_random_fields() {
    let root = full_tree();
    let store = open(&root, |c| c.random_empty_prob = 1.0);
    let generator = PromptGenerator::new(&store);

    for seed in 0..50 {
        let request = PromptRequest::new(seed)
            .with_all(Selector::Random)
            .with_subject("a cat")
            .with_field(Category::Camera, Selector::Literal("angle/low angle".into()), "");
        assert_eq!(generator.generate_prompt(&request), "a cat, low angle");
    }
}

#[test]
fn test_random_never_empty_without_gates() {
    let root = full_tree();
    let store = open(&root, |c| {
        c.random_empty_prob = 0.0;
        c.custom_field_prob = 0.0;
        c.structured_select_prob = 1.0;
    });
    let generator = PromptGenerator::new(&store);

    for seed in 0..50 {
        for category in [Category::Scene, Category::Motion, Category::Lighting, Category::Camera] {
            let request = PromptRequest::new(seed).with_field(category, Selector::Random, "");
            assert!(
                !generator.generate_prompt(&request).is_empty(),
                "{} empty for seed {}",
                category,
                seed
            );
        }
    }
}

// ============================================================================
// Data store
// ============================================================================

#[test]
fn test_two_sibling_files_get_prefixes() {
    let root = data_root(&[("scene/1-a.txt", "red sky\n"), ("scene/2-b.txt", "blue sky\n")]);
    let store = open(&root, |_| {});
    assert_eq!(
        store.load_category_options(Category::Scene),
        vec!["a/red sky".to_string(), "b/blue sky".to_string()]
    );
}

#[test]
fn test_single_file_has_no_prefix() {
    let root = data_root(&[("scene/1-a.txt", "red sky\nblue sky\n")]);
    let store = open(&root, |_| {});
    assert_eq!(
        store.load_category_options(Category::Scene),
        vec!["red sky".to_string(), "blue sky".to_string()]
    );
}

#[test]
fn test_prefix_strip_round_trip() {
    let root = full_tree();
    let store = open(&root, |_| {});
    let prefixed_files: Vec<_> = store
        .load_structured_category_options(Category::Scene)
        .into_iter()
        .filter(|o| o.needs_prefix)
        .collect();
    assert_eq!(prefixed_files.len(), 2);

    for option in prefixed_files {
        for item in option.options.iter() {
            let prefixed = format!("{}/{}", option.category_label, item);
            assert_eq!(remove_category_prefix(&prefixed), item.as_str());
        }
    }
}

#[test]
fn test_exclusion_threshold() {
    let root = data_root(&[
        ("scene/899-included.txt", "kept\n"),
        ("scene/900-excluded.txt", "hidden\n"),
    ]);
    let store = open(&root, |c| c.exclusion = Exclusion::Threshold(900));

    let flat = store.load_category_options(Category::Scene);
    assert!(flat.iter().any(|o| o.ends_with("kept")));
    assert!(!flat.iter().any(|o| o.contains("hidden")));

    let structured = store.load_structured_category_options(Category::Scene);
    assert_eq!(structured.len(), 1);
    assert!(structured[0].source_file.contains("899-included"));
}

#[test]
fn test_missing_data_root_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = GeneratorConfig::with_data_root(temp.path().join("absent"));
    let err = CategoryStore::open(config).unwrap_err();
    assert!(matches!(err, PromptError::MissingDataRoot { .. }));
    assert_eq!(err.exit_code(), 6);
}

#[test]
fn test_geek_menu_shape() {
    let root = full_tree();
    let store = open(&root, |_| {});
    let menu = store.load_geek_category_options(Category::Camera, true);
    assert_eq!(menu.first().map(String::as_str), Some("select"));
    assert_eq!(menu.last().map(String::as_str), Some("all camera"));
    assert!(menu.iter().any(|m| m == "angle"));
}

// ============================================================================
// Geek mode
// ============================================================================

#[test]
fn test_geek_single_desert() {
    let root = data_root(&[("scene/1-places.txt", "desert\n")]);
    let store = open(&root, |_| {});
    let geek = GeekGenerator::new(&store);
    for seed in 0..100 {
        assert_eq!(geek.generate_prompt(seed, "[scene]", "").prompt, "desert");
    }
}

#[test]
fn test_geek_unknown_tag_survives() {
    let root = data_root(&[("scene/1-places.txt", "desert\n")]);
    let store = open(&root, |_| {});
    let geek = GeekGenerator::new(&store);
    for template in ["[nonexistent_xyz]", "[mood,dark] at [scene]", "[a ; b],[scene]"] {
        let out = geek.generate_prompt(5, template, "");
        let unknown = template.split(']').next().unwrap();
        assert!(out.prompt.contains(unknown), "{:?} lost {:?}", out.prompt, unknown);
    }
}

#[test]
fn test_geek_aggregates_follow_empty_gate() {
    let root = full_tree();
    let store = open(&root, |c| c.random_empty_prob = 1.0);
    let geek = GeekGenerator::new(&store);
    for seed in 0..20 {
        let out = geek.generate_prompt(seed, "[all scene], [all lighting], [all expression]", "");
        assert_eq!(out.prompt, "");
    }
}

#[test]
fn test_geek_style_subcategory_tags() {
    let root = full_tree();
    let store = open(&root, |c| c.random_empty_prob = 0.0);
    let mapping = store.category_mapping();
    assert!(mapping.get("all artist").is_some());
    assert!(mapping.get("all form").is_some());

    let geek = GeekGenerator::new(&store);
    for seed in 0..20 {
        let prompt = geek.generate_prompt(seed, "[all form]", "").prompt;
        assert!(prompt == "watercolor" || prompt == "ink", "{}", prompt);
    }
}
