//! Leaf data file loading.
//!
//! Every supported format reduces to an ordered, deduplicated list of option
//! strings. Failures never propagate past [`FileLoader::load`]: a missing or
//! malformed file is logged and yields an empty list, leaving the other files
//! of a category unaffected.
//!
//! | extension | reading |
//! |-----------|---------|
//! | `txt` | one option per non-empty line, `#` lines skipped |
//! | `csv` | first column of each row, `#` lines skipped |
//! | `json`, `yaml`/`yml`, `toml` | array items, or all values of an object with arrays flattened |

use crate::data::cleaner::clean_and_deduplicate;
use crate::error::{PromptError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Parsed file format, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Text,
    Json,
    Csv,
    Yaml,
    Toml,
}

impl DataFormat {
    /// Map a path's extension to a format.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<DataFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(DataFormat::Text),
            "json" => Some(DataFormat::Json),
            "csv" => Some(DataFormat::Csv),
            "yaml" | "yml" => Some(DataFormat::Yaml),
            "toml" => Some(DataFormat::Toml),
            _ => None,
        }
    }

    /// Whether this build can parse the format.
    #[must_use]
    pub fn is_available(&self) -> bool {
        match self {
            DataFormat::Yaml => cfg!(feature = "yaml"),
            _ => true,
        }
    }
}

/// Loads option lists relative to a data root, memoized by resolved path.
#[derive(Debug)]
pub struct FileLoader {
    data_root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Arc<Vec<String>>>>,
}

impl FileLoader {
    pub fn new<P: AsRef<Path>>(data_root: P) -> Self {
        Self {
            data_root: data_root.as_ref().to_path_buf(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Load a file's options. Never fails; problems are logged.
    pub fn load(&self, relative: &str) -> Arc<Vec<String>> {
        let path = self.data_root.join(relative);

        if let Some(hit) = self.lock_cache().get(&path) {
            return Arc::clone(hit);
        }

        let options = if path.is_file() {
            match read_options(&path) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Ignoring {}: {}", path.display(), e);
                    Vec::new()
                }
            }
        } else {
            tracing::warn!("Data file not found: {}", path.display());
            Vec::new()
        };

        let options = Arc::new(options);
        self.lock_cache().insert(path, Arc::clone(&options));
        options
    }

    /// Drop every memoized file.
    pub fn clear(&self) {
        self.lock_cache().clear();
    }

    /// Number of memoized files.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<Vec<String>>>> {
        // The map holds plain data, so a poisoned lock is still consistent.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Read and parse one data file into cleaned options.
pub fn read_options(path: &Path) -> Result<Vec<String>> {
    let format = DataFormat::from_path(path).ok_or_else(|| PromptError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;

    if !format.is_available() {
        return Err(PromptError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: format!("{:?} (built without support)", format).to_lowercase(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let raw = match format {
        DataFormat::Text => parse_text(&content),
        DataFormat::Csv => parse_csv(&content),
        DataFormat::Json => flatten_value(path, serde_json::from_str(&content)?)?,
        DataFormat::Toml => flatten_value(path, toml::from_str::<Value>(&content)?)?,
        DataFormat::Yaml => flatten_value(path, parse_yaml(&content)?)?,
    };

    Ok(clean_and_deduplicate(raw))
}

#[cfg(feature = "yaml")]
fn parse_yaml(content: &str) -> Result<Value> {
    Ok(serde_yaml::from_str(content)?)
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(_content: &str) -> Result<Value> {
    Err(PromptError::config("YAML support not compiled in"))
}

fn parse_text(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

fn parse_csv(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(first_csv_field)
        .collect()
}

/// First field of a CSV row, honouring double-quoted fields.
fn first_csv_field(line: &str) -> Option<String> {
    let Some(rest) = line.strip_prefix('"') else {
        let field = line.split(',').next().unwrap_or("").trim();
        return (!field.is_empty()).then(|| field.to_string());
    };

    let mut field = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                field.push('"');
                chars.next();
            } else {
                break;
            }
        } else {
            field.push(c);
        }
    }
    let field = field.trim();
    (!field.is_empty()).then(|| field.to_string())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reduce a structured document to option strings.
///
/// Arrays yield their scalar items; objects yield their scalar values and the
/// scalar items of array values. Nested objects are skipped.
fn flatten_value(path: &Path, value: Value) -> Result<Vec<String>> {
    let mut out = Vec::new();
    match value {
        Value::Array(items) => out.extend(items.iter().filter_map(scalar_to_string)),
        Value::Object(map) => {
            for (key, v) in map {
                match v {
                    Value::Array(items) => out.extend(items.iter().filter_map(scalar_to_string)),
                    Value::Object(_) | Value::Null => {
                        tracing::debug!("Skipping nested key '{}' in {}", key, path.display());
                    }
                    scalar => out.extend(scalar_to_string(&scalar)),
                }
            }
        }
        other => {
            return Err(PromptError::malformed(
                path,
                format!("top level must be an array or object, found {}", kind_name(&other)),
            ))
        }
    }
    Ok(out)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
