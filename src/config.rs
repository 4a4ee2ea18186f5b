//! Configuration management for promptweave.
//!
//! Configuration is read from a TOML or JSON file. Every field has a default,
//! so an empty or missing file yields a working configuration pointed at
//! `./data`.
//!
//! # Example promptweave.toml
//!
//! ```toml
//! data_root = "/srv/prompts"
//! random_empty_prob = 0.1
//! custom_field_prob = 0.05
//! exclusion = 900
//!
//! [directories]
//! scene = "10-scene"
//! ```

use crate::category::Category;
use crate::data::walker::Exclusion;
use crate::error::{PromptError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Instruction text returned alongside Geek prompts for a downstream LLM.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a prompt writer for an image generation model. \
Rewrite the given tag-expanded prompt into one fluent English description. \
Keep every concrete subject, scene, pose, lighting and style detail, \
do not invent new objects, and answer with the description only.";

/// Directory name per category, relative to the data root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryDirectories {
    pub scene: String,
    pub motion: String,
    pub facial_action: String,
    pub exp_str: String,
    pub expression: String,
    pub lighting: String,
    pub camera: String,
    pub style: String,
    pub description: String,
}

impl Default for CategoryDirectories {
    fn default() -> Self {
        Self {
            scene: Category::Scene.default_dir().to_string(),
            motion: Category::Motion.default_dir().to_string(),
            facial_action: Category::FacialAction.default_dir().to_string(),
            exp_str: Category::ExpressionIntensity.default_dir().to_string(),
            expression: Category::Expression.default_dir().to_string(),
            lighting: Category::Lighting.default_dir().to_string(),
            camera: Category::Camera.default_dir().to_string(),
            style: Category::Style.default_dir().to_string(),
            description: Category::Description.default_dir().to_string(),
        }
    }
}

impl CategoryDirectories {
    /// Directory name for a category.
    #[must_use]
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Scene => &self.scene,
            Category::Motion => &self.motion,
            Category::FacialAction => &self.facial_action,
            Category::ExpressionIntensity => &self.exp_str,
            Category::Expression => &self.expression,
            Category::Lighting => &self.lighting,
            Category::Camera => &self.camera,
            Category::Style => &self.style,
            Category::Description => &self.description,
        }
    }
}

/// Probabilities driving random selection.
///
/// Split out of [`GeneratorConfig`] so generation code borrows only what it
/// reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    /// Chance a random field resolves to nothing.
    pub random_empty: f64,
    /// Chance a random field uses the caller's custom text instead of data.
    pub custom_field: f64,
    /// Chance an intensity modifier is attached to an expression.
    pub exp_str_random: f64,
    /// Per-file inclusion chance for the multi-file strategy.
    pub structured_select: f64,
}

/// Top-level generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory holding one subdirectory per category.
    pub data_root: PathBuf,

    /// Default: 0.10
    pub random_empty_prob: f64,

    /// Default: 0.05
    pub custom_field_prob: f64,

    /// Default: 0.80
    pub exp_str_random_prob: f64,

    /// Default: 0.50
    pub structured_select_prob: f64,

    /// Number of `use image N` selector values offered.
    pub ref_image_count: u32,

    /// Entries hidden from random selection.
    pub exclusion: Exclusion,

    pub directories: CategoryDirectories,

    /// Style subdirectories that get their own `all <name>` tag.
    pub style_subcategories: Vec<String>,

    /// Returned as `sys_prompt` by Geek generation.
    pub system_prompt: String,

    /// Optional Geek rewrite rules (JSON), relative to the config file or absolute.
    pub rewrite_rules: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            random_empty_prob: 0.10,
            custom_field_prob: 0.05,
            exp_str_random_prob: 0.80,
            structured_select_prob: 0.50,
            ref_image_count: 3,
            exclusion: Exclusion::Threshold(900),
            directories: CategoryDirectories::default(),
            style_subcategories: vec!["artist".to_string(), "form".to_string()],
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            rewrite_rules: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration for a data root with default settings.
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a `.toml` or `.json` file.
    ///
    /// A missing file yields defaults. Relative `data_root` and
    /// `rewrite_rules` paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: GeneratorConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                PromptError::config_with_path(e.to_string(), path.to_path_buf())
            })?,
            Some("toml") | None => toml::from_str(&content).map_err(|e| {
                PromptError::config_with_path(e.to_string(), path.to_path_buf())
            })?,
            Some(other) => {
                return Err(PromptError::config_with_path(
                    format!("unsupported config extension '{}'", other),
                    path.to_path_buf(),
                ))
            }
        };

        if let Some(base) = path.parent() {
            if config.data_root.is_relative() {
                config.data_root = base.join(&config.data_root);
            }
            if let Some(rules) = config.rewrite_rules.as_mut() {
                if rules.is_relative() {
                    *rules = base.join(&*rules);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Find a configuration file in the usual places.
    ///
    /// Checks `./promptweave.toml`, then `<config dir>/promptweave/config.toml`.
    pub fn discover() -> Result<Self> {
        let local = PathBuf::from("promptweave.toml");
        if local.exists() {
            return Self::load(&local);
        }
        if let Some(dir) = dirs::config_dir() {
            let user = dir.join("promptweave").join("config.toml");
            if user.exists() {
                return Self::load(&user);
            }
        }
        Ok(Self::default())
    }

    /// Probability settings as one copyable value.
    #[must_use]
    pub fn probabilities(&self) -> Probabilities {
        Probabilities {
            random_empty: self.random_empty_prob,
            custom_field: self.custom_field_prob,
            exp_str_random: self.exp_str_random_prob,
            structured_select: self.structured_select_prob,
        }
    }

    /// Absolute directory of a category.
    #[must_use]
    pub fn category_root(&self, category: Category) -> PathBuf {
        self.data_root.join(self.directories.get(category))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any probability is NaN or outside `[0, 1]`
    /// - `ref_image_count` is zero
    /// - Any category directory name is empty
    pub fn validate(&self) -> Result<()> {
        let probabilities = [
            ("random_empty_prob", self.random_empty_prob),
            ("custom_field_prob", self.custom_field_prob),
            ("exp_str_random_prob", self.exp_str_random_prob),
            ("structured_select_prob", self.structured_select_prob),
        ];

        for (name, value) in probabilities {
            if value.is_nan() {
                return Err(PromptError::invalid_config(name, "is NaN"));
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(PromptError::invalid_config(
                    name,
                    format!("must be within [0, 1], got {}", value),
                ));
            }
        }

        if self.ref_image_count == 0 {
            return Err(PromptError::invalid_config(
                "ref_image_count",
                "must be at least 1",
            ));
        }

        for category in Category::all() {
            if self.directories.get(*category).trim().is_empty() {
                return Err(PromptError::invalid_config(
                    format!("directories.{}", category),
                    "directory name is empty",
                ));
            }
        }

        Ok(())
    }
}
