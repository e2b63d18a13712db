//! Exact set similarity between shingle sets.

use perceptual::ShingleSet;

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`.
///
/// Defined as 0 when both sets are empty, so it is always in `[0, 1]` and
/// symmetric in its arguments.
pub fn jaccard(a: &ShingleSet, b: &ShingleSet) -> f64 {
    let intersection = a.intersection_len(b);
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}
