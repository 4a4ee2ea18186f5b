//! Intensity + expression combination.
//!
//! Shared by the selector-driven generator and Geek tag expansion; neither
//! keeps its own copy of these rules.

use crate::data::cleaner::clean_prompt_string;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Combine an intensity modifier with an expression.
///
/// An empty expression yields `""` whatever the intensity. A non-empty
/// `intensity` is used as given; otherwise one is drawn from `intensity_pool`
/// with `intensity_probability`. The result is `"<intensity> <expression>"`,
/// or the bare expression when no intensity was resolved.
pub fn combine_expression<R: Rng + ?Sized>(
    intensity: &str,
    expression: &str,
    rng: &mut R,
    intensity_pool: &[String],
    intensity_probability: f64,
) -> String {
    let expression = clean_prompt_string(expression, None);
    if expression.is_empty() {
        return String::new();
    }

    let supplied = clean_prompt_string(intensity, None);
    let intensity = if !supplied.is_empty() {
        Some(supplied)
    } else if rng.random::<f64>() < intensity_probability {
        intensity_pool
            .choose(rng)
            .map(|i| clean_prompt_string(i, None))
            .filter(|i| !i.is_empty())
    } else {
        None
    };

    match intensity {
        Some(intensity) => format!("{} {}", intensity, expression),
        None => expression,
    }
}
