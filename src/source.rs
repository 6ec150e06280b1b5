//! Collaborator interfaces and per-class prediction accumulation.
//!
//! The evaluation core never runs a model or reads an annotation format
//! itself. It talks to an [`AnnotationSource`] for ground truth and a
//! [`PredictionSource`] for detections, queried once per annotated image.

use crate::annotation::AnnotationIndex;
use crate::error::{EvalIssue, Result};
use crate::stats::IngestStats;
use crate::threshold::{filter_by_confidence, validate_threshold};
use crate::types::{Detection, ImageAnnotation, PredictionRecord};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Something that turns an image into scored detections, typically a model.
pub trait PredictionSource {
    /// Detections for one image scoring above `score_threshold`.
    fn predict(&mut self, image_id: &str, score_threshold: f64) -> Result<Vec<Detection>>;
}

impl<F> PredictionSource for F
where
    F: FnMut(&str, f64) -> Result<Vec<Detection>>,
{
    fn predict(&mut self, image_id: &str, score_threshold: f64) -> Result<Vec<Detection>> {
        self(image_id, score_threshold)
    }
}

/// Something that supplies the ground truth of every image.
pub trait AnnotationSource {
    fn annotations(&mut self) -> Result<Vec<ImageAnnotation>>;

    /// Records the source itself could not turn into annotations.
    fn take_issues(&mut self) -> Vec<EvalIssue> {
        Vec::new()
    }
}

impl AnnotationSource for Vec<ImageAnnotation> {
    fn annotations(&mut self) -> Result<Vec<ImageAnnotation>> {
        Ok(self.clone())
    }
}

/// Precomputed detections keyed by image id.
///
/// Deserializes from a JSON object mapping image ids to detection lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticPredictions {
    detections: HashMap<String, Vec<Detection>>,
}

impl StaticPredictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_id: impl Into<String>, detections: Vec<Detection>) {
        self.detections
            .entry(image_id.into())
            .or_default()
            .extend(detections);
    }

    pub fn image_count(&self) -> usize {
        self.detections.len()
    }
}

impl PredictionSource for StaticPredictions {
    fn predict(&mut self, image_id: &str, score_threshold: f64) -> Result<Vec<Detection>> {
        match self.detections.get(image_id) {
            Some(detections) => filter_by_confidence(detections, score_threshold),
            None => Ok(Vec::new()),
        }
    }
}

/// Predictions grouped per class, each list sorted by descending score.
///
/// Equal scores keep their accumulation order. Records with a malformed box or
/// a non-finite score never enter the set; they are kept as issues.
#[derive(Debug, Clone, Default)]
pub struct PredictionSet {
    by_class: HashMap<String, Vec<PredictionRecord>>,
    issues: Vec<EvalIssue>,
    stats: IngestStats,
}

impl PredictionSet {
    /// Build a set from already attributed records.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PredictionRecord>,
    {
        let mut set = Self::default();
        for record in records {
            set.accept(record);
        }
        set.sort_by_score();
        set
    }

    fn accept(&mut self, record: PredictionRecord) -> bool {
        self.stats.add_record();

        if !record.score.is_finite() {
            warn!(
                "Skipping prediction in '{}' for class '{}': score {}",
                record.image_id, record.label, record.score
            );
            self.stats.reject_score();
            self.issues.push(EvalIssue::InvalidScore {
                image: record.image_id,
                class: record.label,
                score: record.score,
            });
            return false;
        }

        if let Err(reason) = record.bbox.validate() {
            warn!(
                "Skipping prediction in '{}' for class '{}': {}",
                record.image_id, record.label, reason
            );
            self.stats.reject_box();
            self.issues.push(EvalIssue::MalformedBox {
                image: record.image_id,
                class: record.label,
                reason,
            });
            return false;
        }

        self.by_class
            .entry(record.label.clone())
            .or_default()
            .push(record);
        true
    }

    fn reject_unknown(&mut self, image_id: &str, label: String) {
        self.stats.add_record();
        self.stats.reject_unknown_class();
        self.issues.push(EvalIssue::UnknownClass {
            image: image_id.to_string(),
            label,
        });
    }

    fn sort_by_score(&mut self) {
        for records in self.by_class.values_mut() {
            // Stable, so ties keep accumulation order.
            records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        }
    }

    /// Predictions of one class in descending score order.
    pub fn for_class(&self, class_name: &str) -> &[PredictionRecord] {
        self.by_class
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn prediction_count(&self, class_name: &str) -> usize {
        self.for_class(class_name).len()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.by_class.keys().map(String::as_str)
    }

    /// Total number of accepted predictions over all classes.
    pub fn len(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn issues(&self) -> &[EvalIssue] {
        &self.issues
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}

/// Query `source` for every image of `index` and accumulate the detections.
///
/// Images are visited in index order. A failing image is recorded as an issue
/// and skipped; labels outside `vocabulary` are rejected.
///
/// # Errors
///
/// Returns an error only if `score_threshold` is outside [0.0, 1.0].
pub fn collect_predictions<P, S>(
    source: &mut P,
    index: &AnnotationIndex,
    vocabulary: &[S],
    score_threshold: f64,
) -> Result<PredictionSet>
where
    P: PredictionSource + ?Sized,
    S: AsRef<str>,
{
    validate_threshold("score", score_threshold)?;
    let known: HashSet<&str> = vocabulary.iter().map(|s| s.as_ref()).collect();

    let mut set = PredictionSet::default();

    for image_id in index.image_ids() {
        set.stats.add_processed_image();

        let detections = match source.predict(image_id, score_threshold) {
            Ok(detections) => detections,
            Err(err) => {
                warn!("Prediction failed for '{}': {}", image_id, err);
                set.stats.fail_image();
                set.issues.push(EvalIssue::PredictionSourceFailed {
                    image: image_id.to_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        debug!("Found {} boxes for {}", detections.len(), image_id);

        let mut accepted = 0;
        for detection in detections {
            if !known.contains(detection.label.as_str()) {
                warn!(
                    "Skipping prediction in '{}': unknown class '{}'",
                    image_id, detection.label
                );
                set.reject_unknown(image_id, detection.label);
                continue;
            }

            let record =
                PredictionRecord::new(image_id, detection.bbox, detection.label, detection.score);
            if set.accept(record) {
                accepted += 1;
            }
        }

        if accepted == 0 {
            set.stats.add_empty_prediction_image();
        }
    }

    set.sort_by_score();
    Ok(set)
}
