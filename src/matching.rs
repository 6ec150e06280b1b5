//! Greedy matching of score-ordered predictions against ground truth.

use crate::metrics::iou::calculate_iou;
use crate::types::{GroundTruthRecord, PredictionRecord};
use log::trace;
use std::collections::HashMap;

/// Outcome of matching one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Index of the prediction in the class's score-ordered list.
    pub prediction_index: usize,
    /// Index of the claimed record within its image's candidates.
    pub ground_truth_index: Option<usize>,
    /// Best IoU seen among eligible candidates (0.0 if there were none).
    pub iou: f64,
    pub is_true_positive: bool,
    pub confidence: f64,
}

/// Working copy of one class's ground truth, grouped by image.
///
/// A pool is created fresh for every class pass and borrowed mutably by
/// [`match_class`], which is the only place usage flags change.
#[derive(Debug, Clone, Default)]
pub struct GroundTruthPool {
    by_image: HashMap<String, Vec<GroundTruthRecord>>,
    len: usize,
}

impl GroundTruthPool {
    /// Build a pool, preserving the relative order of records within each image.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = GroundTruthRecord>,
    {
        let mut pool = Self::default();
        for record in records {
            pool.by_image
                .entry(record.image_id.clone())
                .or_default()
                .push(record);
            pool.len += 1;
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ground truth of one image, in source order.
    pub fn candidates(&self, image_id: &str) -> &[GroundTruthRecord] {
        self.by_image
            .get(image_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of records claimed so far in this pass.
    pub fn used_count(&self) -> usize {
        self.by_image
            .values()
            .flatten()
            .filter(|record| record.is_used())
            .count()
    }

    fn claim(&mut self, image_id: &str, index: usize) {
        if let Some(record) = self
            .by_image
            .get_mut(image_id)
            .and_then(|records| records.get_mut(index))
        {
            record.mark_used();
        }
    }
}

/// Find the ground truth a prediction should claim.
///
/// Only unused candidates from the prediction's image are eligible. The
/// candidate with the strictly greatest IoU wins (ties keep the first seen),
/// and it is accepted only if that IoU reaches `iou_threshold`. A candidate
/// with IoU 0 is never selected.
///
/// This does not mark anything as used; the caller does.
///
/// # Example
///
/// ```
/// use voc_eval::matching::match_prediction;
/// use voc_eval::types::{BoundingBox, GroundTruthRecord, PredictionRecord};
///
/// let gts = vec![
///     GroundTruthRecord::new("img", BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car"),
///     GroundTruthRecord::new("img", BoundingBox::new(20.0, 20.0, 30.0, 30.0), "car"),
/// ];
/// let pred = PredictionRecord::new("img", BoundingBox::new(21.0, 21.0, 30.0, 30.0), "car", 0.9);
/// assert_eq!(match_prediction(&pred, &gts, 0.5), Some(1));
/// ```
pub fn match_prediction(
    prediction: &PredictionRecord,
    candidates: &[GroundTruthRecord],
    iou_threshold: f64,
) -> Option<usize> {
    best_candidate(prediction, candidates)
        .filter(|&(_, iou)| iou >= iou_threshold)
        .map(|(index, _)| index)
}

fn best_candidate(
    prediction: &PredictionRecord,
    candidates: &[GroundTruthRecord],
) -> Option<(usize, f64)> {
    let mut best_iou = 0.0;
    let mut best_index = None;

    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.is_used() || candidate.image_id != prediction.image_id {
            continue;
        }

        let iou = calculate_iou(&prediction.bbox, &candidate.bbox);
        if iou > best_iou {
            best_iou = iou;
            best_index = Some(index);
        }
    }

    best_index.map(|index| (index, best_iou))
}

/// Match every prediction of one class, in order, against the pool.
///
/// `predictions` must already be sorted by descending score: a higher
/// confidence prediction always gets first claim on its best candidate. This is
/// the greedy VOC assignment, not a globally optimal one.
///
/// Returns one [`Match`] per prediction, in the same order.
///
/// # Contract
///
/// The descending-score order is not checked in release builds; unsorted input
/// gives claims in input order rather than confidence order.
/// [`PredictionSet::for_class`](crate::source::PredictionSet::for_class) always
/// returns a correctly ordered slice.
///
/// # Panics
///
/// Panics in debug builds if `predictions` is not sorted by descending score.
pub fn match_class(
    predictions: &[PredictionRecord],
    pool: &mut GroundTruthPool,
    iou_threshold: f64,
) -> Vec<Match> {
    debug_assert!(
        predictions.windows(2).all(|w| w[0].score >= w[1].score),
        "predictions must be sorted by descending score"
    );

    let mut matches = Vec::with_capacity(predictions.len());

    for (prediction_index, prediction) in predictions.iter().enumerate() {
        let candidates = pool.candidates(&prediction.image_id);
        let best = best_candidate(prediction, candidates);
        let best_iou = best.map_or(0.0, |(_, iou)| iou);

        let claimed = best
            .filter(|&(_, iou)| iou >= iou_threshold)
            .map(|(index, _)| index);

        if let Some(index) = claimed {
            pool.claim(&prediction.image_id, index);
        }

        trace!(
            "{} '{}' score={:.4} best_iou={:.4} -> {}",
            prediction.label,
            prediction.image_id,
            prediction.score,
            best_iou,
            if claimed.is_some() { "TP" } else { "FP" }
        );

        matches.push(Match {
            prediction_index,
            ground_truth_index: claimed,
            iou: best_iou,
            is_true_positive: claimed.is_some(),
            confidence: prediction.score,
        });
    }

    matches
}
