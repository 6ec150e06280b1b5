//! Statistics tracking for ground-truth and prediction ingestion
//!
//! Counts what was accepted and what was rejected while building the
//! annotation index and collecting predictions, so callers can see at a glance
//! how much of the input actually reached the evaluation.

use crate::error::EvalIssue;
use serde::{Deserialize, Serialize};

/// Statistics collected during ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Total number of box records seen (ground truth or predictions)
    pub total_records: usize,

    /// Records rejected because their box was malformed
    pub rejected_boxes: usize,

    /// Records rejected because their class was not in the vocabulary
    pub unknown_classes: usize,

    /// Predictions rejected because of a non-finite score
    pub invalid_scores: usize,

    /// Raw tokens that could not be parsed at all
    pub unparsable_records: usize,

    /// Images for which the prediction source returned an error
    pub failed_images: usize,

    /// Number of images processed
    pub processed_images: usize,

    /// Number of images that produced zero accepted predictions
    pub empty_prediction_images: usize,
}

impl IngestStats {
    /// Create a new `IngestStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self) {
        self.total_records += 1;
    }

    pub fn reject_box(&mut self) {
        self.rejected_boxes += 1;
    }

    pub fn reject_unknown_class(&mut self) {
        self.unknown_classes += 1;
    }

    pub fn reject_score(&mut self) {
        self.invalid_scores += 1;
    }

    pub fn reject_unparsable(&mut self) {
        self.unparsable_records += 1;
    }

    pub fn fail_image(&mut self) {
        self.failed_images += 1;
    }

    pub fn add_processed_image(&mut self) {
        self.processed_images += 1;
    }

    pub fn add_empty_prediction_image(&mut self) {
        self.empty_prediction_images += 1;
    }

    /// Count an issue reported by an outside source
    ///
    /// Such records were rejected before reaching us, so the total is bumped
    /// as well, except for unparsable tokens and whole-image failures.
    pub fn record_issue(&mut self, issue: &EvalIssue) {
        match issue {
            EvalIssue::MalformedBox { .. } => {
                self.add_record();
                self.reject_box();
            }
            EvalIssue::UnknownClass { .. } => {
                self.add_record();
                self.reject_unknown_class();
            }
            EvalIssue::InvalidScore { .. } => {
                self.add_record();
                self.reject_score();
            }
            EvalIssue::UnparsableRecord { .. } => self.reject_unparsable(),
            EvalIssue::PredictionSourceFailed { .. } => self.fail_image(),
            EvalIssue::DegenerateGroundTruth { .. } => {}
        }
    }

    /// Number of records that passed every check
    ///
    /// Unparsable tokens never became records, so they are not subtracted.
    pub fn accepted_records(&self) -> usize {
        self.total_records
            .saturating_sub(self.rejected_boxes)
            .saturating_sub(self.unknown_classes)
            .saturating_sub(self.invalid_scores)
    }

    /// Total number of rejected records and tokens
    pub fn total_skipped(&self) -> usize {
        self.rejected_boxes + self.unknown_classes + self.invalid_scores + self.unparsable_records
    }

    /// Add another set of counters into this one
    pub fn merge(&mut self, other: &IngestStats) {
        self.total_records += other.total_records;
        self.rejected_boxes += other.rejected_boxes;
        self.unknown_classes += other.unknown_classes;
        self.invalid_scores += other.invalid_scores;
        self.unparsable_records += other.unparsable_records;
        self.failed_images += other.failed_images;
        self.processed_images += other.processed_images;
        self.empty_prediction_images += other.empty_prediction_images;
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "IngestStats {{ total: {}, accepted: {}, skipped: {}, failed_images: {}, \
             processed_images: {}, empty: {} }}",
            self.total_records,
            self.accepted_records(),
            self.total_skipped(),
            self.failed_images,
            self.processed_images,
            self.empty_prediction_images
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = IngestStats::new();
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.accepted_records(), 0);
        assert_eq!(stats.total_skipped(), 0);
    }

    #[test]
    fn test_skip_counters() {
        let mut stats = IngestStats::new();
        for _ in 0..5 {
            stats.add_record();
        }
        stats.reject_box();
        stats.reject_unknown_class();
        stats.reject_score();
        stats.reject_unparsable();

        assert_eq!(stats.total_skipped(), 4);
        assert_eq!(stats.accepted_records(), 2);
    }

    #[test]
    fn test_merge() {
        let mut a = IngestStats::new();
        a.add_record();
        a.add_processed_image();

        let mut b = IngestStats::new();
        b.add_record();
        b.fail_image();

        a.merge(&b);
        assert_eq!(a.total_records, 2);
        assert_eq!(a.processed_images, 1);
        assert_eq!(a.failed_images, 1);
    }

    #[test]
    fn test_record_issue() {
        let mut stats = IngestStats::new();
        stats.record_issue(&EvalIssue::UnparsableRecord {
            image: "a.jpg".to_string(),
            record: "1,2".to_string(),
            reason: "too short".to_string(),
        });
        stats.record_issue(&EvalIssue::UnknownClass {
            image: "a.jpg".to_string(),
            label: "7".to_string(),
        });

        assert_eq!(stats.unparsable_records, 1);
        assert_eq!(stats.unknown_classes, 1);
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.accepted_records(), 0);
    }

    #[test]
    fn test_summary_string() {
        let mut stats = IngestStats::new();
        stats.total_records = 50;
        stats.processed_images = 10;

        let summary = stats.summary_string();
        assert!(summary.contains("total: 50"));
        assert!(summary.contains("processed_images: 10"));
    }
}
