//! Closed category, slot, selector and priority types.
//!
//! Every data category and every prompt slot is an enum variant so that
//! dispatch over them is an exhaustive `match` rather than a string lookup.
//!
//! # Example
//!
//! ```rust
//! use promptweave::category::{Category, Selector};
//!
//! assert_eq!(Category::FacialAction.tag_name(), "facial action");
//! assert_eq!(Selector::parse("use image 2", 3), Selector::UseImage(2));
//! assert_eq!(Selector::parse("use image 9", 3), Selector::Literal("use image 9".into()));
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A data category backed by one directory under the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Scene,
    Motion,
    FacialAction,
    /// Intensity modifiers combined with expressions ("slightly", "very").
    ExpressionIntensity,
    Expression,
    Lighting,
    Camera,
    Style,
    Description,
}

/// How a category turns its structured options into one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every file may contribute independently.
    MultiFile,
    /// Exactly one file speaks.
    SingleFile,
    /// Fixed six-slot sentence template.
    Description,
}

impl Category {
    /// Get all categories in data-root order.
    #[must_use]
    pub fn all() -> &'static [Category] {
        &[
            Category::Scene,
            Category::Motion,
            Category::FacialAction,
            Category::ExpressionIntensity,
            Category::Expression,
            Category::Lighting,
            Category::Camera,
            Category::Style,
            Category::Description,
        ]
    }

    /// Categories that get an `all <name>` entry in Geek menus and tag mapping.
    #[must_use]
    pub fn primary() -> &'static [Category] {
        &[
            Category::Scene,
            Category::Motion,
            Category::FacialAction,
            Category::Expression,
            Category::Lighting,
            Category::Camera,
            Category::Style,
            Category::Description,
        ]
    }

    /// Default directory name under the data root.
    #[must_use]
    pub fn default_dir(&self) -> &'static str {
        match self {
            Category::Scene => "scene",
            Category::Motion => "motion",
            Category::FacialAction => "facial_action",
            Category::ExpressionIntensity => "exp_str",
            Category::Expression => "expression",
            Category::Lighting => "lighting",
            Category::Camera => "camera",
            Category::Style => "style",
            Category::Description => "description",
        }
    }

    /// Human name used in Geek tags, e.g. `[all facial action]`.
    #[must_use]
    pub fn tag_name(&self) -> &'static str {
        match self {
            Category::Scene => "scene",
            Category::Motion => "motion",
            Category::FacialAction => "facial action",
            Category::ExpressionIntensity => "expression strength",
            Category::Expression => "expression",
            Category::Lighting => "lighting",
            Category::Camera => "camera",
            Category::Style => "style",
            Category::Description => "description",
        }
    }

    /// The `all <name>` aggregate tag for this category.
    #[must_use]
    pub fn all_tag(&self) -> String {
        format!("all {}", self.tag_name())
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self {
            Category::Scene | Category::FacialAction | Category::Camera => Strategy::MultiFile,
            Category::Motion
            | Category::ExpressionIntensity
            | Category::Expression
            | Category::Lighting
            | Category::Style => Strategy::SingleFile,
            Category::Description => Strategy::Description,
        }
    }

    /// Role named in a synthesized `use image N <role>` reference.
    #[must_use]
    pub fn reference_role(&self) -> &'static str {
        match self {
            Category::Scene => "scene",
            Category::Motion => "pose",
            Category::FacialAction => "facial action",
            Category::ExpressionIntensity => "expression strength",
            Category::Expression => "expression",
            Category::Lighting => "lighting",
            Category::Camera => "camera angle",
            Category::Style => "style",
            Category::Description => "composition",
        }
    }

    /// Key prefix used for the snapshot views (`SCENE_OPTIONS`, ...).
    #[must_use]
    pub fn cache_key(&self) -> &'static str {
        match self {
            Category::Scene => "SCENE",
            Category::Motion => "MOTION",
            Category::FacialAction => "FACIAL_ACTION",
            Category::ExpressionIntensity => "EXP_STR",
            Category::Expression => "EXPRESSION",
            Category::Lighting => "LIGHTING",
            Category::Camera => "CAMERA",
            Category::Style => "STYLE",
            Category::Description => "DESCRIPTION",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default_dir())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace([' ', '-'], "_");
        match lower.as_str() {
            "scene" | "scenes" => Ok(Category::Scene),
            "motion" | "pose" => Ok(Category::Motion),
            "facial_action" => Ok(Category::FacialAction),
            "exp_str" | "expression_strength" | "intensity" => Ok(Category::ExpressionIntensity),
            "expression" => Ok(Category::Expression),
            "lighting" => Ok(Category::Lighting),
            "camera" => Ok(Category::Camera),
            "style" => Ok(Category::Style),
            "description" => Ok(Category::Description),
            _ => Err(ParseCategoryError {
                input: s.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an invalid category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError {
    input: String,
}

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: '{}'", self.input)
    }
}

impl std::error::Error for ParseCategoryError {}

/// One of the nine positions in a composed prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptSlot {
    Subject,
    Scene,
    Motion,
    FacialAction,
    Expression,
    Lighting,
    Camera,
    Style,
    Description,
}

impl PromptSlot {
    /// The data category feeding this slot; `Subject` has none.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match self {
            PromptSlot::Subject => None,
            PromptSlot::Scene => Some(Category::Scene),
            PromptSlot::Motion => Some(Category::Motion),
            PromptSlot::FacialAction => Some(Category::FacialAction),
            PromptSlot::Expression => Some(Category::Expression),
            PromptSlot::Lighting => Some(Category::Lighting),
            PromptSlot::Camera => Some(Category::Camera),
            PromptSlot::Style => Some(Category::Style),
            PromptSlot::Description => Some(Category::Description),
        }
    }
}

/// Fragment ordering preset applied before joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptPriority {
    /// subject+scene
    #[default]
    SubjectScene,
    /// description+style
    DescriptionStyle,
    /// description+style+lighting+camera
    DescriptionStyleLightingCamera,
    /// lighting+camera
    LightingCamera,
}

impl PromptPriority {
    /// Total ordering over all nine slots.
    #[must_use]
    pub fn order(&self) -> [PromptSlot; 9] {
        use PromptSlot::*;
        match self {
            PromptPriority::SubjectScene => [
                Subject,
                Scene,
                Motion,
                FacialAction,
                Expression,
                Lighting,
                Camera,
                Style,
                Description,
            ],
            PromptPriority::DescriptionStyle => [
                Description,
                Style,
                Subject,
                Scene,
                Motion,
                FacialAction,
                Expression,
                Lighting,
                Camera,
            ],
            PromptPriority::DescriptionStyleLightingCamera => [
                Description,
                Style,
                Lighting,
                Camera,
                Subject,
                Scene,
                Motion,
                FacialAction,
                Expression,
            ],
            PromptPriority::LightingCamera => [
                Lighting,
                Camera,
                Subject,
                Scene,
                Motion,
                FacialAction,
                Expression,
                Style,
                Description,
            ],
        }
    }

    /// Host-facing label, e.g. `subject+scene`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PromptPriority::SubjectScene => "subject+scene",
            PromptPriority::DescriptionStyle => "description+style",
            PromptPriority::DescriptionStyleLightingCamera => "description+style+lighting+camera",
            PromptPriority::LightingCamera => "lighting+camera",
        }
    }
}

impl fmt::Display for PromptPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The value chosen in a category's dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    Disable,
    Enable,
    Random,
    /// `use image N`, 1-based.
    UseImage(u32),
    /// Any concrete option, usually carrying a category prefix.
    Literal(String),
}

impl Selector {
    /// Parse a selector value.
    ///
    /// `use image N` is only recognised for `1..=ref_image_count`; anything
    /// else that is not a control token becomes a literal.
    #[must_use]
    pub fn parse(value: &str, ref_image_count: u32) -> Selector {
        let trimmed = value.trim();
        match trimmed {
            "disable" => return Selector::Disable,
            "enable" => return Selector::Enable,
            "random" => return Selector::Random,
            _ => {}
        }
        if let Some(n) = trimmed
            .strip_prefix("use image ")
            .and_then(|n| n.trim().parse::<u32>().ok())
        {
            if (1..=ref_image_count).contains(&n) {
                return Selector::UseImage(n);
            }
        }
        Selector::Literal(trimmed.to_string())
    }
}

/// Selector values offered for a category in a host dropdown.
#[must_use]
pub fn control_choices(ref_image_count: u32) -> Vec<String> {
    let mut choices = vec![
        "disable".to_string(),
        "enable".to_string(),
        "random".to_string(),
    ];
    choices.extend((1..=ref_image_count).map(|n| format!("use image {}", n)));
    choices
}
