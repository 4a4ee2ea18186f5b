//! Text normalization for options and composed prompts.
//!
//! # Example
//!
//! ```rust
//! use promptweave::data::cleaner::{clean_prompt_string, remove_category_prefix};
//!
//! assert_eq!(clean_prompt_string("red sky , , ,blue sea", None), "red sky, blue sea");
//! assert_eq!(remove_category_prefix("indoor/kitchen/warm light"), "warm light");
//! assert_eq!(remove_category_prefix("random"), "random");
//! ```

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Maximum number of punctuation-run collapsing passes.
const MAX_COLLAPSE_PASSES: usize = 5;

/// Script family that decides punctuation glyphs and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLanguage {
    English,
    /// Chinese, Japanese and Korean text: full-width glyphs, no spacing.
    Cjk,
}

impl TextLanguage {
    fn glyph(&self, kind: PunctKind) -> char {
        match (self, kind) {
            (TextLanguage::English, PunctKind::Comma) => ',',
            (TextLanguage::English, PunctKind::Period) => '.',
            (TextLanguage::English, PunctKind::Semicolon) => ';',
            (TextLanguage::English, PunctKind::Question) => '?',
            (TextLanguage::English, PunctKind::Exclamation) => '!',
            (TextLanguage::Cjk, PunctKind::Comma) => '，',
            (TextLanguage::Cjk, PunctKind::Period) => '。',
            (TextLanguage::Cjk, PunctKind::Semicolon) => '；',
            (TextLanguage::Cjk, PunctKind::Question) => '？',
            (TextLanguage::Cjk, PunctKind::Exclamation) => '！',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PunctKind {
    Comma,
    Period,
    Semicolon,
    Question,
    Exclamation,
}

fn punct_kind(c: char) -> Option<PunctKind> {
    match c {
        ',' | '，' => Some(PunctKind::Comma),
        '.' | '。' => Some(PunctKind::Period),
        ';' | '；' => Some(PunctKind::Semicolon),
        '?' | '？' => Some(PunctKind::Question),
        '!' | '！' => Some(PunctKind::Exclamation),
        _ => None,
    }
}

fn is_punct(c: char) -> bool {
    punct_kind(c).is_some()
}

/// Letters only; edge punctuation is trimmed and must not decide the language.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // Hiragana, Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
        | '\u{FF66}'..='\u{FF9D}' // Half-width katakana
    )
}

/// Detect the script family of a string from its character ranges.
#[must_use]
pub fn detect_language(text: &str) -> TextLanguage {
    if text.chars().any(is_cjk) {
        TextLanguage::Cjk
    } else {
        TextLanguage::English
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn punct_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[,.;?!，。；？！](?:\s*[,.;?!，。；？！])+").expect("valid regex")
    })
}

/// Trim, drop empties and remove duplicates, keeping first occurrences in order.
#[must_use]
pub fn clean_and_deduplicate<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Normalize whitespace and punctuation in a prompt string.
///
/// Runs of two or more punctuation marks collapse to the first mark's kind,
/// rendered in the language's glyph. English text gets exactly one space after
/// each mark and none before; CJK text gets no spacing around marks. Leading
/// and trailing punctuation and whitespace are stripped. The result is a fixed
/// point: cleaning it again returns it unchanged.
#[must_use]
pub fn clean_prompt_string(text: &str, language: Option<TextLanguage>) -> String {
    let language = language.unwrap_or_else(|| detect_language(text));

    let mut result = whitespace_re().replace_all(text.trim(), " ").into_owned();

    for _ in 0..MAX_COLLAPSE_PASSES {
        let collapsed = punct_run_re()
            .replace_all(&result, |caps: &regex::Captures<'_>| {
                let first = caps[0].chars().next().and_then(punct_kind);
                first
                    .map(|kind| language.glyph(kind).to_string())
                    .unwrap_or_default()
            })
            .into_owned();
        if collapsed == result {
            break;
        }
        result = collapsed;
    }

    let spaced = space_punctuation(&result, language);
    spaced
        .trim_matches(|c: char| c.is_whitespace() || is_punct(c))
        .to_string()
}

/// Apply per-language spacing rules around surviving punctuation marks.
fn space_punctuation(text: &str, language: TextLanguage) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !is_punct(c) {
            if c == ' ' {
                // Drop spaces directly before a mark; collapse the rest.
                let next_non_space = chars[i..].iter().find(|ch| **ch != ' ');
                if next_non_space.is_some_and(|ch| is_punct(*ch)) || out.ends_with(' ') {
                    i += 1;
                    continue;
                }
            }
            out.push(c);
            i += 1;
            continue;
        }

        out.push(c);
        let mut j = i + 1;
        while j < chars.len() && chars[j] == ' ' {
            j += 1;
        }
        let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
        let next_digit = i + 1 < chars.len() && chars[i + 1].is_ascii_digit();

        match language {
            TextLanguage::Cjk => {}
            // Keep decimals and thousands separators such as 1.5 or 1,000 intact.
            TextLanguage::English if prev_digit && next_digit => {}
            TextLanguage::English => {
                if j < chars.len() {
                    out.push(' ');
                }
            }
        }
        i = j;
    }

    out
}

/// Strip a hierarchical category prefix from an option value.
///
/// Control tokens are returned unchanged. Both `/` and `\` count as
/// separators.
#[must_use]
pub fn remove_category_prefix(value: &str) -> &str {
    if matches!(value, "enable" | "disable" | "random") {
        return value;
    }
    match value.rfind(['/', '\\']) {
        Some(idx) => &value[idx + 1..],
        None => value,
    }
}
