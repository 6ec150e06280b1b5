//! Core data types for ground truth, predictions and evaluation results.

use crate::error::EvalIssue;
use crate::stats::IngestStats;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in corner format (xmin, ymin, xmax, ymax).
///
/// Serialized as a four element array `[xmin, ymin, xmax, ymax]`.
/// Zero-area boxes are legal; boxes whose max is below their min are
/// considered malformed and are rejected at ingestion, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Area of the box. Not clamped, so an inverted box yields a negative area.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check that every coordinate is finite and the corners are ordered.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like [`is_valid`](Self::is_valid) but reports what is wrong.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let coords = [self.xmin, self.ymin, self.xmax, self.ymax];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(format!("non-finite coordinate in {:?}", coords));
        }
        if self.xmax < self.xmin {
            return Err(format!("xmax ({}) < xmin ({})", self.xmax, self.xmin));
        }
        if self.ymax < self.ymin {
            return Err(format!("ymax ({}) < ymin ({})", self.ymax, self.ymin));
        }
        Ok(())
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

/// Whether a ground-truth box has been claimed during a class's matching pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    #[default]
    Unused,
    Used,
}

/// A ground-truth box together with its matching state.
///
/// Records are handed out as fresh working copies for each class pass, so the
/// usage flag never leaks from one class's evaluation into another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthRecord {
    pub image_id: String,
    pub bbox: BoundingBox,
    pub label: String,
    #[serde(default)]
    usage: Usage,
}

impl GroundTruthRecord {
    /// Create an unused ground-truth record.
    pub fn new(image_id: impl Into<String>, bbox: BoundingBox, label: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            bbox,
            label: label.into(),
            usage: Usage::Unused,
        }
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn is_used(&self) -> bool {
        self.usage == Usage::Used
    }

    /// Claim this record for a prediction. A record is claimed at most once.
    pub fn mark_used(&mut self) {
        debug_assert!(!self.is_used(), "ground truth record claimed twice");
        self.usage = Usage::Used;
    }
}

/// A scored prediction attributed to one image and class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub image_id: String,
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f64,
}

impl PredictionRecord {
    pub fn new(
        image_id: impl Into<String>,
        bbox: BoundingBox,
        label: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            image_id: image_id.into(),
            bbox,
            label: label.into(),
            score,
        }
    }
}

/// A single detection as returned by a prediction source for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, score: f64) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }
}

/// A labelled ground-truth object inside one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedObject {
    pub bbox: BoundingBox,
    pub label: String,
}

/// All ground-truth objects of one image, as supplied by an annotation source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageAnnotation {
    pub image_id: String,
    pub objects: Vec<AnnotatedObject>,
}

impl ImageAnnotation {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            objects: Vec::new(),
        }
    }

    /// Builder-style helper used mostly by tests and in-memory sources.
    pub fn with_object(mut self, bbox: BoundingBox, label: impl Into<String>) -> Self {
        self.objects.push(AnnotatedObject {
            bbox,
            label: label.into(),
        });
        self
    }
}

/// Cumulative counts and the recall/precision sequences for one class.
///
/// All vectors are index-aligned with the predictions in descending score order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PrecisionRecallCurve {
    pub cumulative_tp: Vec<usize>,
    pub cumulative_fp: Vec<usize>,
    pub recall: Vec<f64>,
    pub precision: Vec<f64>,
}

impl PrecisionRecallCurve {
    pub fn len(&self) -> usize {
        self.recall.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recall.is_empty()
    }
}

/// Evaluation outcome for a single class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEvaluation {
    pub class_name: String,
    /// True-positive flag per prediction, in descending score order.
    pub is_true_positive: Vec<bool>,
    pub curve: PrecisionRecallCurve,
    pub ap: f64,
    pub true_positives: usize,
    pub ground_truth_count: usize,
    pub prediction_count: usize,
}

impl ClassEvaluation {
    /// Result for a class that received no predictions at all.
    pub fn without_predictions(class_name: impl Into<String>, ground_truth_count: usize) -> Self {
        Self {
            class_name: class_name.into(),
            is_true_positive: Vec::new(),
            curve: PrecisionRecallCurve::default(),
            ap: 0.0,
            true_positives: 0,
            ground_truth_count,
            prediction_count: 0,
        }
    }

    pub fn false_positives(&self) -> usize {
        self.prediction_count - self.true_positives
    }
}

/// Aggregated evaluation over the whole class vocabulary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateResult {
    /// Per-class evaluations in vocabulary order.
    pub classes: Vec<ClassEvaluation>,
    /// AP for every class of the vocabulary, 0 for classes without predictions.
    pub ap_per_class: Vec<(String, f64)>,
    /// True-positive counts, only for classes with at least one prediction.
    pub true_positives_per_class: Vec<(String, usize)>,
    pub ground_truth_counts: Vec<(String, usize)>,
    pub prediction_counts: Vec<(String, usize)>,
    /// Mean Average Precision as a percentage (0 to 100).
    pub map: f64,
    /// Record-level problems encountered during ingestion and evaluation.
    pub issues: Vec<EvalIssue>,
    /// Combined ground-truth and prediction ingestion counters.
    pub ingest: IngestStats,
}

impl AggregateResult {
    pub fn ap_for(&self, class_name: &str) -> Option<f64> {
        lookup(&self.ap_per_class, class_name)
    }

    pub fn true_positives_for(&self, class_name: &str) -> Option<usize> {
        lookup(&self.true_positives_per_class, class_name)
    }

    pub fn class(&self, class_name: &str) -> Option<&ClassEvaluation> {
        self.classes.iter().find(|c| c.class_name == class_name)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

fn lookup<T: Copy>(pairs: &[(String, T)], key: &str) -> Option<T> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
}
