// ABOUTME: ICE (Impact x Confidence / Effort) prioritisation score
// ABOUTME: Pure function shared by idea storage and the API layer

/// Compute the ICE score for an idea.
///
/// Returns `None` when `effort` is zero or when `impact * confidence`
/// does not fit in an `i64`.
pub fn ice_score(impact: i64, confidence: i64, effort: i64) -> Option<f64> {
    if effort == 0 {
        return None;
    }
    let product = impact.checked_mul(confidence)?;
    Some(product as f64 / effort as f64)
}
