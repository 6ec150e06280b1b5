//! Average Precision (AP) and mean Average Precision (mAP) calculation.

use serde::{Deserialize, Serialize};

/// How a precision-recall curve is reduced to a single AP value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApMethod {
    /// Area under the monotonic precision envelope (VOC2010 and later).
    #[default]
    AllPoints,
    /// Mean of the envelope sampled at recall 0.0, 0.1, ..., 1.0 (VOC2007).
    ElevenPoint,
}

impl ApMethod {
    /// Compute AP for the given curve with this method.
    pub fn compute(self, recall: &[f64], precision: &[f64]) -> f64 {
        match self {
            ApMethod::AllPoints => voc_ap(recall, precision).ap,
            ApMethod::ElevenPoint => eleven_point_ap(recall, precision),
        }
    }
}

/// AP together with the padded curves it was integrated from.
///
/// `mrec` and `mprec` are what a plotting consumer needs to shade the area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocAp {
    pub ap: f64,
    pub mrec: Vec<f64>,
    pub mprec: Vec<f64>,
}

/// Calculate Average Precision with the all-point interpolated VOC method.
///
/// The recall curve is padded with 0.0 and 1.0, precision with 0.0 on both
/// ends. Precision is then swept right to left into a non-increasing envelope,
/// and the area is summed at every index where recall changes.
///
/// # Arguments
///
/// * `recall` - Recall values in descending score order (non-decreasing)
/// * `precision` - Precision values aligned with `recall`
///
/// # Example
///
/// ```
/// use voc_eval::metrics::ap::voc_ap;
///
/// let result = voc_ap(&[0.5, 1.0], &[1.0, 1.0]);
/// assert!((result.ap - 1.0).abs() < 1e-12);
/// assert_eq!(result.mrec, vec![0.0, 0.5, 1.0, 1.0]);
/// ```
pub fn voc_ap(recall: &[f64], precision: &[f64]) -> VocAp {
    debug_assert_eq!(recall.len(), precision.len(), "recall/precision length mismatch");

    let mut mrec = Vec::with_capacity(recall.len() + 2);
    mrec.push(0.0);
    mrec.extend_from_slice(recall);
    mrec.push(1.0);

    let mut mprec = Vec::with_capacity(precision.len() + 2);
    mprec.push(0.0);
    mprec.extend_from_slice(precision);
    mprec.push(0.0);

    for i in (0..mprec.len() - 1).rev() {
        mprec[i] = mprec[i].max(mprec[i + 1]);
    }

    let ap = (1..mrec.len())
        .filter(|&i| mrec[i] != mrec[i - 1])
        .map(|i| (mrec[i] - mrec[i - 1]) * mprec[i])
        .sum::<f64>();

    VocAp { ap, mrec, mprec }
}

/// Calculate Average Precision with the VOC2007 11-point method.
///
/// ```
/// use voc_eval::metrics::ap::eleven_point_ap;
///
/// let ap = eleven_point_ap(&[0.5, 1.0], &[1.0, 1.0]);
/// assert!((ap - 1.0).abs() < 1e-12);
/// ```
pub fn eleven_point_ap(recall: &[f64], precision: &[f64]) -> f64 {
    (0..=10)
        .map(|i| {
            let level = i as f64 / 10.0;
            recall
                .iter()
                .zip(precision)
                .filter(|&(&r, _)| r >= level)
                .map(|(_, &p)| p)
                .fold(0.0f64, f64::max)
        })
        .sum::<f64>()
        / 11.0
}

/// Calculate mean Average Precision (mAP) across multiple classes.
///
/// # Returns
///
/// Returns the arithmetic mean (0.0 to 1.0), or 0.0 for an empty slice.
///
/// # Example
///
/// ```
/// use voc_eval::metrics::ap::calculate_map;
///
/// let class_aps = vec![0.8, 0.9, 0.75, 0.85];
/// let map = calculate_map(&class_aps);
/// assert!((map - 0.825).abs() < 1e-10);
/// ```
pub fn calculate_map(class_aps: &[f64]) -> f64 {
    if class_aps.is_empty() {
        return 0.0;
    }

    class_aps.iter().sum::<f64>() / class_aps.len() as f64
}

/// mAP expressed as a percentage.
///
/// ```
/// use voc_eval::metrics::ap::map_percentage;
///
/// let map = map_percentage(&[0.8, 0.6, 1.0]);
/// assert!((map - 80.0).abs() < 1e-9);
/// ```
pub fn map_percentage(class_aps: &[f64]) -> f64 {
    calculate_map(class_aps) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voc_ap_empty() {
        let result = voc_ap(&[], &[]);
        assert_eq!(result.ap, 0.0);
        assert_eq!(result.mrec, vec![0.0, 1.0]);
        assert_eq!(result.mprec, vec![0.0, 0.0]);
    }

    #[test]
    fn test_voc_ap_perfect() {
        let recall = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        let precision = vec![1.0; 10];
        let result = voc_ap(&recall, &precision);
        assert!((result.ap - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_voc_ap_envelope() {
        // TP, FP, TP with 2 ground truths.
        let recall = vec![0.5, 0.5, 1.0];
        let precision = vec![1.0, 0.5, 2.0 / 3.0];
        let result = voc_ap(&recall, &precision);

        // Envelope: [1, 1, 2/3, 2/3, 0] after padding.
        assert!((result.mprec[2] - 2.0 / 3.0).abs() < 1e-12);
        assert!((result.ap - (0.5 * 1.0 + 0.5 * 2.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_voc_ap_all_false_positives() {
        let result = voc_ap(&[0.0, 0.0], &[0.0, 0.0]);
        assert_eq!(result.ap, 0.0);
    }

    #[test]
    fn test_voc_ap_partial_recall() {
        let result = voc_ap(&[0.25, 0.5], &[1.0, 1.0]);
        assert!((result.ap - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_eleven_point_partial_recall() {
        // Recall 0.5 covers the levels 0.0..=0.5, i.e. 6 of 11.
        let ap = eleven_point_ap(&[0.25, 0.5], &[1.0, 1.0]);
        assert!((ap - 6.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_eleven_point_empty() {
        assert_eq!(eleven_point_ap(&[], &[]), 0.0);
    }

    #[test]
    fn test_ap_method_dispatch() {
        let recall = [0.25, 0.5];
        let precision = [1.0, 1.0];
        assert!((ApMethod::AllPoints.compute(&recall, &precision) - 0.5).abs() < 1e-12);
        assert!((ApMethod::ElevenPoint.compute(&recall, &precision) - 6.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_map() {
        let class_aps = vec![0.8, 0.9, 0.75, 0.85];
        let map = calculate_map(&class_aps);
        assert!((map - 0.825).abs() < 1e-10);
    }

    #[test]
    fn test_calculate_map_empty() {
        assert_eq!(calculate_map(&[]), 0.0);
    }

    #[test]
    fn test_map_percentage() {
        let map = map_percentage(&[0.8, 0.6, 1.0]);
        assert!((map - 80.0).abs() < 1e-9);
    }
}
