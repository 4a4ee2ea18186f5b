//! Category data store.
//!
//! [`CategoryStore`] owns the walker, the loader and a lazily built
//! [`CategorySnapshot`]: every derived view (flat options, structured
//! options, Geek menus, the tag mapping, the intensity pool) is computed from
//! one directory walk per category and never mutated afterwards. Rebuilding is
//! all-or-nothing through [`CategoryStore::invalidate`], so the tag mapping and
//! the per-category views always describe the same directory snapshot.
//!
//! # Example
//!
//! ```rust,ignore
//! use promptweave::{CategoryStore, GeneratorConfig, Category};
//!
//! let store = CategoryStore::open(GeneratorConfig::with_data_root("data"))?;
//! let scenes = store.load_category_options(Category::Scene);
//! let menu = store.load_geek_category_options(Category::Scene, true);
//! assert_eq!(menu.first().map(String::as_str), Some("select"));
//! ```

use crate::category::Category;
use crate::config::GeneratorConfig;
use crate::data::cleaner::{clean_and_deduplicate, remove_category_prefix};
use crate::data::loader::FileLoader;
use crate::data::walker::{compare_names, strip_numeric_prefix, CategoryEntry, DirectoryWalker};
use crate::error::{PromptError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use walkdir::WalkDir;

/// First entry of every Geek menu.
pub const MENU_PLACEHOLDER: &str = "select";

/// The materialized content of one [`CategoryEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOption {
    pub source_file: String,
    /// The entry's prefix when it needs one, else its label.
    pub category_label: String,
    pub needs_prefix: bool,
    pub options: Arc<Vec<String>>,
}

impl StructuredOption {
    fn from_entry(entry: &CategoryEntry, options: Arc<Vec<String>>) -> Self {
        let category_label = if entry.needs_prefix {
            entry.category_prefix.clone()
        } else {
            entry.label.clone()
        };
        Self {
            source_file: entry.file_relative_path.clone(),
            category_label,
            needs_prefix: entry.needs_prefix,
            options,
        }
    }

    /// Whether any `/`-separated segment of the label equals `name`.
    #[must_use]
    pub fn label_matches(&self, name: &str) -> bool {
        self.category_label
            .split('/')
            .any(|seg| seg.replace('_', " ").eq_ignore_ascii_case(name))
    }
}

/// Files behind one Geek tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagSource {
    pub category: Category,
    pub files: Vec<CategoryEntry>,
}

impl TagSource {
    #[must_use]
    pub fn file_paths(&self) -> Vec<&str> {
        self.files
            .iter()
            .map(|f| f.file_relative_path.as_str())
            .collect()
    }
}

/// Tag label to source files, used by Geek template expansion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMapping {
    tags: BTreeMap<String, TagSource>,
}

impl CategoryMapping {
    /// Look a tag up exactly, then case-insensitively.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<(&str, &TagSource)> {
        if let Some((key, source)) = self.tags.get_key_value(tag) {
            return Some((key.as_str(), source));
        }
        self.tags
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(tag))
            .map(|(key, source)| (key.as_str(), source))
    }

    /// Keys containing `tag` as a substring, for diagnostics.
    #[must_use]
    pub fn similar(&self, tag: &str) -> Vec<&str> {
        let needle = tag.to_lowercase();
        self.tags
            .keys()
            .filter(|k| k.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagSource)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Insert or replace an aggregate key.
    fn set(&mut self, key: String, source: TagSource) {
        self.tags.insert(key, source);
    }

    /// Insert only if the key is unclaimed.
    fn alias(&mut self, key: String, source: TagSource) {
        self.tags.entry(key).or_insert(source);
    }

    /// Register a leaf file under its label; same-category labels accumulate files.
    fn add_leaf(&mut self, label: &str, category: Category, entry: &CategoryEntry) {
        if label.is_empty() {
            return;
        }
        match self.tags.get_mut(label) {
            None => {
                self.tags.insert(
                    label.to_string(),
                    TagSource {
                        category,
                        files: vec![entry.clone()],
                    },
                );
            }
            Some(existing) if existing.category == category => {
                if !existing
                    .files
                    .iter()
                    .any(|f| f.file_relative_path == entry.file_relative_path)
                {
                    existing.files.push(entry.clone());
                }
            }
            Some(existing) => {
                tracing::debug!(
                    "Tag '{}' already belongs to {}, ignoring {}",
                    label,
                    existing.category,
                    entry.file_relative_path
                );
            }
        }
    }
}

/// All views of one category, derived from a single walk.
#[derive(Debug, Clone, Default)]
pub struct CategoryData {
    pub entries: Vec<CategoryEntry>,
    pub options: Vec<String>,
    pub structured: Vec<StructuredOption>,
    /// Geek menu without the trailing `all <name>` entry.
    pub geek_menu: Vec<String>,
}

/// Immutable build of every derived view.
#[derive(Debug, Default)]
pub struct CategorySnapshot {
    categories: HashMap<Category, CategoryData>,
    files: HashMap<String, StructuredOption>,
    mapping: CategoryMapping,
    intensity_pool: Vec<String>,
}

impl CategorySnapshot {
    #[must_use]
    pub fn category(&self, category: Category) -> Option<&CategoryData> {
        self.categories.get(&category)
    }

    /// Flat options (`SCENE_OPTIONS`, ...).
    #[must_use]
    pub fn options(&self, category: Category) -> &[String] {
        self.category(category)
            .map(|d| d.options.as_slice())
            .unwrap_or_default()
    }

    /// Structured options (`SCENE_STRUCTURED_OPTIONS`, ...).
    #[must_use]
    pub fn structured(&self, category: Category) -> &[StructuredOption] {
        self.category(category)
            .map(|d| d.structured.as_slice())
            .unwrap_or_default()
    }

    /// Structured content of a loaded file.
    #[must_use]
    pub fn file(&self, relative_path: &str) -> Option<&StructuredOption> {
        self.files.get(relative_path)
    }

    /// Structured options for a set of entries, in entry order.
    #[must_use]
    pub fn structured_for(&self, entries: &[CategoryEntry]) -> Vec<StructuredOption> {
        entries
            .iter()
            .filter_map(|e| self.file(&e.file_relative_path).cloned())
            .collect()
    }

    /// `CATEGORY_MAPPING`.
    #[must_use]
    pub fn mapping(&self) -> &CategoryMapping {
        &self.mapping
    }

    /// Every intensity modifier, prefixes stripped.
    #[must_use]
    pub fn intensity_pool(&self) -> &[String] {
        &self.intensity_pool
    }

    /// Keys this snapshot answers to, in the `<CATEGORY>_<VIEW>` naming.
    #[must_use]
    pub fn cache_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Category::all()
            .iter()
            .filter(|c| self.categories.contains_key(c))
            .flat_map(|c| {
                let key = c.cache_key();
                [
                    format!("{}_OPTIONS", key),
                    format!("{}_STRUCTURED_OPTIONS", key),
                    format!("{}_CATEGORIES", key),
                ]
            })
            .collect();
        keys.push("CATEGORY_MAPPING".to_string());
        keys
    }
}

/// Lazily built, explicitly invalidated category data.
#[derive(Debug)]
pub struct CategoryStore {
    config: GeneratorConfig,
    walker: DirectoryWalker,
    loader: FileLoader,
    snapshot: Mutex<Option<Arc<CategorySnapshot>>>,
}

impl CategoryStore {
    /// Create a store for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the data root does
    /// not exist. Nothing is read until the first snapshot access.
    pub fn open(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        if !config.data_root.is_dir() {
            return Err(PromptError::MissingDataRoot {
                path: config.data_root.clone(),
            });
        }
        Ok(Self {
            walker: DirectoryWalker::new(&config.data_root),
            loader: FileLoader::new(&config.data_root),
            config,
            snapshot: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    #[must_use]
    pub fn loader(&self) -> &FileLoader {
        &self.loader
    }

    /// The current snapshot, building it on first access.
    ///
    /// Concurrent first accesses block on one build.
    pub fn snapshot(&self) -> Arc<CategorySnapshot> {
        let mut guard = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(snapshot) = guard.as_ref() {
            return Arc::clone(snapshot);
        }
        let built = Arc::new(self.build());
        *guard = Some(Arc::clone(&built));
        built
    }

    /// Whether a snapshot has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.snapshot
            .lock()
            .map(|g| g.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some())
    }

    /// Drop the snapshot and the loader memo together.
    pub fn invalidate(&self) {
        let mut guard = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        self.loader.clear();
        *guard = None;
        tracing::debug!("Category cache invalidated");
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Flat option list, items prefixed `<prefix>/<item>` where needed.
    pub fn load_category_options(&self, category: Category) -> Vec<String> {
        self.snapshot().options(category).to_vec()
    }

    /// One structured option per discovered file.
    pub fn load_structured_category_options(&self, category: Category) -> Vec<StructuredOption> {
        self.snapshot().structured(category).to_vec()
    }

    /// `select`, each label in walk order, and `all <name>` when `is_primary`.
    pub fn load_geek_category_options(&self, category: Category, is_primary: bool) -> Vec<String> {
        let snapshot = self.snapshot();
        let mut menu = snapshot
            .category(category)
            .map(|d| d.geek_menu.clone())
            .unwrap_or_else(|| vec![MENU_PLACEHOLDER.to_string()]);
        if is_primary {
            menu.push(category.all_tag());
        }
        menu
    }

    /// Tag label to source files for Geek expansion.
    pub fn category_mapping(&self) -> CategoryMapping {
        self.snapshot().mapping().clone()
    }

    // =========================================================================
    // Build
    // =========================================================================

    fn build(&self) -> CategorySnapshot {
        let started = Instant::now();
        let mut snapshot = CategorySnapshot::default();

        for category in Category::all() {
            let data = self.build_category(*category, &mut snapshot.files);
            snapshot.categories.insert(*category, data);
        }

        snapshot.intensity_pool = clean_and_deduplicate(
            snapshot
                .structured(Category::ExpressionIntensity)
                .iter()
                .flat_map(|s| s.options.iter())
                .map(|o| remove_category_prefix(o)),
        );

        snapshot.mapping = self.build_category_mapping(&snapshot);

        tracing::info!(
            "Built category data: {} files, {} tags in {:?}",
            snapshot.files.len(),
            snapshot.mapping.len(),
            started.elapsed()
        );
        snapshot
    }

    fn build_category(
        &self,
        category: Category,
        files: &mut HashMap<String, StructuredOption>,
    ) -> CategoryData {
        let root = self.config.category_root(category);
        let entries = self.walker.walk(&root, &self.config.exclusion);

        let mut structured = Vec::with_capacity(entries.len());
        let mut options = Vec::new();
        for entry in &entries {
            let loaded = self.loader.load(&entry.file_relative_path);
            if entry.needs_prefix {
                options.extend(
                    loaded
                        .iter()
                        .map(|item| format!("{}/{}", entry.category_prefix, item)),
                );
            } else {
                options.extend(loaded.iter().cloned());
            }
            let option = StructuredOption::from_entry(entry, loaded);
            files.insert(entry.file_relative_path.clone(), option.clone());
            structured.push(option);
        }

        let mut geek_menu = vec![MENU_PLACEHOLDER.to_string()];
        geek_menu.extend(clean_and_deduplicate(entries.iter().map(|e| &e.label)));

        tracing::debug!(
            "{}: {} files, {} options",
            category,
            entries.len(),
            options.len()
        );

        CategoryData {
            entries,
            options,
            structured,
            geek_menu,
        }
    }

    fn build_category_mapping(&self, snapshot: &CategorySnapshot) -> CategoryMapping {
        let mut mapping = CategoryMapping::default();

        for category in Category::primary() {
            let entries = snapshot
                .category(*category)
                .map(|d| d.entries.clone())
                .unwrap_or_default();

            mapping.set(
                category.all_tag(),
                TagSource {
                    category: *category,
                    files: entries.clone(),
                },
            );
            for entry in &entries {
                mapping.add_leaf(&entry.label, *category, entry);
            }
            mapping.alias(
                category.tag_name().to_string(),
                TagSource {
                    category: *category,
                    files: entries,
                },
            );
        }

        for name in &self.config.style_subcategories {
            let files = match self.style_subcategory_root(name) {
                Some(root) => self.walker.walk(&root, &self.config.exclusion),
                None => {
                    tracing::debug!("Style subcategory '{}' not found", name);
                    Vec::new()
                }
            };
            // Entries must point at files the style walk already loaded.
            let files: Vec<CategoryEntry> = files
                .into_iter()
                .filter(|e| snapshot.file(&e.file_relative_path).is_some())
                .collect();
            mapping.set(
                format!("all {}", name),
                TagSource {
                    category: Category::Style,
                    files: files.clone(),
                },
            );
            mapping.alias(
                name.clone(),
                TagSource {
                    category: Category::Style,
                    files,
                },
            );
        }

        mapping.set(
            Category::ExpressionIntensity.tag_name().to_string(),
            TagSource {
                category: Category::ExpressionIntensity,
                files: snapshot
                    .category(Category::ExpressionIntensity)
                    .map(|d| d.entries.clone())
                    .unwrap_or_default(),
            },
        );

        mapping
    }

    /// A direct child of the style root whose stripped name is `name`.
    fn style_subcategory_root(&self, name: &str) -> Option<PathBuf> {
        let style_root = self.config.category_root(Category::Style);
        WalkDir::new(&style_root)
            .min_depth(1)
            .max_depth(1)
            .sort_by(|a, b| {
                compare_names(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
            })
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .find(|e| {
                strip_numeric_prefix(&e.file_name().to_string_lossy()).eq_ignore_ascii_case(name)
            })
            .map(|e| e.into_path())
    }
}
