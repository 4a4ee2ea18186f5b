//! Category directory walking.
//!
//! A category root is a tree of subdirectories and leaf data files whose names
//! may carry a `<digits>-<label>` ordering prefix. Walking happens in two
//! passes: [`scan`] reads the tree into [`DirNode`]s, then
//! [`DirectoryWalker::walk`] assigns `needs_prefix` top-down and flattens the
//! tree into [`CategoryEntry`] values in depth-first order, files and
//! subdirectories interleaved by natural sort.
//!
//! A level needs prefixes when it holds two or more subdirectories, two or
//! more data files, or when its parent level needed them.
//!
//! # Example
//!
//! ```rust
//! use promptweave::data::walker::{natural_sort_key, strip_numeric_prefix};
//!
//! assert_eq!(strip_numeric_prefix("10-indoor"), "indoor");
//! assert!(natural_sort_key("2-b") < natural_sort_key("10-a"));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Extensions the loader can read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "json", "yaml", "yml", "toml", "csv"];

/// Rule hiding entries from random selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Exclusion {
    /// Skip names whose leading `<digits>-` number is at least this value.
    Threshold(u32),
    /// Skip names starting with this string. An empty prefix skips nothing.
    Prefix(String),
    #[default]
    None,
}

impl Exclusion {
    /// Check whether a file or directory name is excluded.
    #[must_use]
    pub fn excludes(&self, name: &str) -> bool {
        match self {
            Exclusion::Threshold(mark) => {
                numeric_prefix(name).is_some_and(|n| n >= u64::from(*mark))
            }
            Exclusion::Prefix(prefix) => !prefix.is_empty() && name.starts_with(prefix.as_str()),
            Exclusion::None => false,
        }
    }
}

/// One leaf data file discovered under a category root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Path relative to the data root, always `/`-separated.
    pub file_relative_path: String,
    /// `subdir/.../stem` with numeric prefixes stripped; empty when not needed.
    pub category_prefix: String,
    pub needs_prefix: bool,
    /// Human label for Geek menus and tags: the stripped stem with `_` as spaces.
    pub label: String,
}

/// A chunk of a natural sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    Num(u64),
    Text(String),
}

fn digit_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

fn numeric_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)-").expect("valid regex"))
}

/// Split a name on digit runs so `2-b` sorts before `10-a`.
#[must_use]
pub fn natural_sort_key(name: &str) -> Vec<KeyPart> {
    let lower = name.to_lowercase();
    let mut parts = Vec::new();
    let mut last = 0;
    for m in digit_run_re().find_iter(&lower) {
        if m.start() > last {
            parts.push(KeyPart::Text(lower[last..m.start()].to_string()));
        }
        // Digit runs too long for u64 fall back to text ordering.
        match m.as_str().parse::<u64>() {
            Ok(n) => parts.push(KeyPart::Num(n)),
            Err(_) => parts.push(KeyPart::Text(m.as_str().to_string())),
        }
        last = m.end();
    }
    if last < lower.len() {
        parts.push(KeyPart::Text(lower[last..].to_string()));
    }
    parts
}

/// Natural ordering of two file or directory names.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natural_sort_key(a)
        .cmp(&natural_sort_key(b))
        .then_with(|| a.cmp(b))
}

/// The number in a leading `<digits>-` prefix, if any.
#[must_use]
pub fn numeric_prefix(name: &str) -> Option<u64> {
    numeric_prefix_re()
        .captures(name)
        .and_then(|c| c[1].parse().ok())
}

/// Remove a leading `<digits>-` prefix.
#[must_use]
pub fn strip_numeric_prefix(name: &str) -> &str {
    match numeric_prefix_re().find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Check whether a path has a loadable extension.
#[must_use]
pub fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// A child of a scanned directory.
#[derive(Debug, Clone)]
pub enum NodeItem {
    File(PathBuf),
    Dir(DirNode),
}

/// One directory level of a scanned category tree.
#[derive(Debug, Clone, Default)]
pub struct DirNode {
    /// Directory name with its numeric prefix stripped.
    pub name: String,
    /// Data files and subdirectories in natural sort order.
    pub items: Vec<NodeItem>,
}

impl DirNode {
    pub fn file_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, NodeItem::File(_)))
            .count()
    }

    pub fn dir_count(&self) -> usize {
        self.items.len() - self.file_count()
    }

    /// Whether this level alone requires prefixes.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.dir_count() >= 2 || self.file_count() >= 2
    }
}

/// Pass 1: read a directory tree into nodes, applying exclusion and sorting.
///
/// Unreadable entries are logged and skipped.
#[must_use]
pub fn scan(dir: &Path, exclusion: &Exclusion) -> DirNode {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| strip_numeric_prefix(n).to_string())
        .unwrap_or_default();

    let walker = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by(|a, b| {
        compare_names(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
    });

    let mut items = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') || exclusion.excludes(&file_name) {
            tracing::trace!("Excluded {}", entry.path().display());
            continue;
        }
        if entry.file_type().is_dir() {
            items.push(NodeItem::Dir(scan(entry.path(), exclusion)));
        } else if is_supported_file(entry.path()) {
            items.push(NodeItem::File(entry.path().to_path_buf()));
        }
    }

    DirNode { name, items }
}

/// Walks category roots into ordered [`CategoryEntry`] lists.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    data_root: PathBuf,
}

impl DirectoryWalker {
    /// Create a walker whose entry paths are relative to `data_root`.
    pub fn new<P: AsRef<Path>>(data_root: P) -> Self {
        Self {
            data_root: data_root.as_ref().to_path_buf(),
        }
    }

    /// Walk one category root.
    ///
    /// A missing root yields an empty list with a warning.
    pub fn walk(&self, category_root: &Path, exclusion: &Exclusion) -> Vec<CategoryEntry> {
        if !category_root.is_dir() {
            tracing::warn!("Category directory not found: {}", category_root.display());
            return Vec::new();
        }
        let tree = scan(category_root, exclusion);
        let mut entries = Vec::new();
        self.collect(&tree, &[], false, &mut entries);
        entries
    }

    /// Pass 2: assign prefixes top-down and flatten depth-first.
    fn collect(
        &self,
        node: &DirNode,
        path: &[&str],
        parent_needs_prefix: bool,
        out: &mut Vec<CategoryEntry>,
    ) {
        let needs_prefix = parent_needs_prefix || node.is_ambiguous();

        for item in &node.items {
            match item {
                NodeItem::File(file) => out.push(self.entry(file, path, needs_prefix)),
                NodeItem::Dir(child) => {
                    let mut child_path = path.to_vec();
                    child_path.push(child.name.as_str());
                    self.collect(child, &child_path, needs_prefix, out);
                }
            }
        }
    }

    fn entry(&self, file: &Path, path: &[&str], needs_prefix: bool) -> CategoryEntry {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(strip_numeric_prefix)
            .unwrap_or_default();

        let category_prefix = if needs_prefix {
            path.iter()
                .copied()
                .chain(std::iter::once(stem))
                .collect::<Vec<_>>()
                .join("/")
        } else {
            String::new()
        };

        CategoryEntry {
            file_relative_path: self.relative(file),
            category_prefix,
            needs_prefix,
            label: stem.replace('_', " ").trim().to_string(),
        }
    }

    fn relative(&self, file: &Path) -> String {
        let rel = file.strip_prefix(&self.data_root).unwrap_or(file);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
