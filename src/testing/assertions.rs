//! Custom assertions for composed prompt text.

/// Assert that a prompt is a clean `", "` join.
///
/// # Panics
///
/// Panics when the prompt has an empty fragment, or leading or trailing
/// separators or whitespace.
///
/// # Example
///
/// ```rust,ignore
/// let prompt = generator.generate_prompt(&request);
/// assert_clean_join(&prompt);
/// ```
pub fn assert_clean_join(prompt: &str) {
    assert!(
        !prompt.contains(", ,") && !prompt.contains(",,"),
        "Prompt contains an empty fragment: {:?}",
        prompt
    );
    assert!(
        !prompt.starts_with(',') && !prompt.ends_with(','),
        "Prompt has a dangling separator: {:?}",
        prompt
    );
    assert_eq!(prompt, prompt.trim(), "Prompt has surrounding whitespace");
}

/// Assert that a prompt contains every fragment.
///
/// # Panics
///
/// Panics naming the first missing fragment.
pub fn assert_contains_all(prompt: &str, fragments: &[&str]) {
    for fragment in fragments {
        assert!(
            prompt.contains(fragment),
            "Expected {:?} in prompt {:?}",
            fragment,
            prompt
        );
    }
}
