//! Rendering of evaluation results for people and machines.

use crate::error::Result;
use crate::types::AggregateResult;
use std::cmp::Ordering;
use std::fmt::Write;

/// Classes ordered by AP, best first. Equal APs are ordered by name.
pub fn ranked_classes(result: &AggregateResult) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = result
        .ap_per_class
        .iter()
        .map(|(name, ap)| (name.as_str(), *ap))
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked
}

/// Plain text summary: one `AP for <class>: <ap>` line per class in
/// vocabulary order, followed by the mAP and any issues.
///
/// ```
/// use voc_eval::report::render_text;
/// use voc_eval::types::AggregateResult;
///
/// let result = AggregateResult {
///     ap_per_class: vec![("car".to_string(), 0.75)],
///     map: 75.0,
///     ..Default::default()
/// };
/// let text = render_text(&result);
/// assert!(text.contains("AP for car: 0.7500"));
/// assert!(text.contains("mAP: 75.00%"));
/// ```
pub fn render_text(result: &AggregateResult) -> String {
    let mut out = String::new();

    for (class_name, ap) in &result.ap_per_class {
        let _ = writeln!(out, "AP for {}: {:.4}", class_name, ap);
    }
    let _ = writeln!(out, "mAP: {:.2}%", result.map);

    if result.has_issues() {
        let _ = writeln!(out, "{} issues:", result.issues.len());
        for issue in &result.issues {
            let _ = writeln!(out, "  - {}", issue);
        }
    }

    out
}

/// Serialize the full result, per-class curves included, as pretty JSON.
pub fn to_json(result: &AggregateResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
