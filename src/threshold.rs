//! Threshold validation and confidence filtering.

use crate::error::{Result, VocEvalError};
use crate::types::Detection;

/// Keep only detections whose score is strictly above `threshold`.
///
/// # Errors
///
/// Returns an error if the threshold is not in the valid range [0.0, 1.0].
///
/// # Example
///
/// ```
/// use voc_eval::threshold::filter_by_confidence;
/// use voc_eval::types::{BoundingBox, Detection};
///
/// let detections = vec![
///     Detection::new(BoundingBox::new(10.0, 20.0, 30.0, 40.0), "car", 0.9),
///     Detection::new(BoundingBox::new(50.0, 60.0, 70.0, 80.0), "car", 0.3),
/// ];
///
/// let filtered = filter_by_confidence(&detections, 0.5).unwrap();
/// assert_eq!(filtered.len(), 1);
/// ```
pub fn filter_by_confidence(detections: &[Detection], threshold: f64) -> Result<Vec<Detection>> {
    validate_threshold("confidence", threshold)?;

    Ok(detections
        .iter()
        .filter(|det| det.score > threshold)
        .cloned()
        .collect())
}

/// Validate that a threshold is in the valid range [0.0, 1.0].
pub fn validate_threshold(name: &str, threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(VocEvalError::InvalidThreshold(format!(
            "{} threshold must be between 0.0 and 1.0, got {}",
            name, threshold
        )));
    }
    Ok(())
}
