//! Precision/recall curve construction from per-prediction match flags.

use crate::types::PrecisionRecallCurve;

/// Build the cumulative precision-recall curve for one class.
///
/// # Arguments
///
/// * `is_true_positive` - Match flag per prediction, sorted by confidence (descending)
/// * `num_ground_truth` - Total number of ground truth instances of the class
///
/// When `num_ground_truth` is zero every recall value is 0.0 rather than a
/// division by zero.
///
/// # Example
///
/// ```
/// use voc_eval::metrics::precision_recall::build_precision_recall_curve;
///
/// let curve = build_precision_recall_curve(&[true, false, true], 4);
/// assert_eq!(curve.cumulative_tp, vec![1, 1, 2]);
/// assert_eq!(curve.recall, vec![0.25, 0.25, 0.5]);
/// assert!((curve.precision[1] - 0.5).abs() < 1e-12);
/// ```
pub fn build_precision_recall_curve(
    is_true_positive: &[bool],
    num_ground_truth: usize,
) -> PrecisionRecallCurve {
    let n = is_true_positive.len();
    let mut curve = PrecisionRecallCurve {
        cumulative_tp: Vec::with_capacity(n),
        cumulative_fp: Vec::with_capacity(n),
        recall: Vec::with_capacity(n),
        precision: Vec::with_capacity(n),
    };

    let mut tp = 0usize;
    let mut fp = 0usize;

    for &is_tp in is_true_positive {
        if is_tp {
            tp += 1;
        } else {
            fp += 1;
        }

        curve.cumulative_tp.push(tp);
        curve.cumulative_fp.push(fp);
        curve.recall.push(recall(tp, num_ground_truth));
        curve.precision.push(precision(tp, fp));
    }

    curve
}

/// Fraction of ground truth recovered; 0.0 when there is no ground truth.
pub fn recall(tp: usize, num_ground_truth: usize) -> f64 {
    if num_ground_truth == 0 {
        return 0.0;
    }
    tp as f64 / num_ground_truth as f64
}

/// Fraction of predictions that are correct; 0.0 when nothing was predicted.
pub fn precision(tp: usize, fp: usize) -> f64 {
    let denominator = tp + fp;
    if denominator == 0 {
        return 0.0;
    }
    tp as f64 / denominator as f64
}
