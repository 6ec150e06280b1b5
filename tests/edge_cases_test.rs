//! Comprehensive edge case and boundary condition tests.

use voc_eval::config::EvalConfig;
use voc_eval::evaluator::{evaluate, run_evaluation};
use voc_eval::matching::{match_class, GroundTruthPool};
use voc_eval::metrics::{calculate_iou, voc_ap};
use voc_eval::source::{PredictionSet, StaticPredictions};
use voc_eval::types::{BoundingBox, Detection, GroundTruthRecord, ImageAnnotation, PredictionRecord};
use voc_eval::AnnotationIndex;

fn gt(image_id: &str, bbox: [f64; 4]) -> GroundTruthRecord {
    GroundTruthRecord::new(image_id, bbox.into(), "car")
}

fn pred(image_id: &str, bbox: [f64; 4], score: f64) -> PredictionRecord {
    PredictionRecord::new(image_id, bbox.into(), "car", score)
}

fn flags(
    predictions: &[PredictionRecord],
    ground_truth: Vec<GroundTruthRecord>,
    iou_threshold: f64,
) -> Vec<bool> {
    let mut pool = GroundTruthPool::from_records(ground_truth);
    match_class(predictions, &mut pool, iou_threshold)
        .iter()
        .map(|m| m.is_true_positive)
        .collect()
}

// ============================================================================
// MATCHING EDGE CASES
// ============================================================================

#[test]
fn test_empty_predictions_with_ground_truth() {
    let mut pool = GroundTruthPool::from_records(vec![gt("1", [0.0, 0.0, 10.0, 10.0])]);
    let matches = match_class(&[], &mut pool, 0.5);
    assert!(matches.is_empty());
    assert_eq!(pool.used_count(), 0);
}

#[test]
fn test_predictions_without_ground_truth() {
    let predictions = vec![pred("1", [0.0, 0.0, 10.0, 10.0], 0.9)];
    assert_eq!(flags(&predictions, Vec::new(), 0.5), vec![false]);
}

#[test]
fn test_duplicate_detection_is_false_positive() {
    let predictions = vec![
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.9),
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.8),
    ];
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0])];
    assert_eq!(flags(&predictions, ground_truth, 0.5), vec![true, false]);
}

#[test]
fn test_higher_score_claims_first() {
    // The lower scoring prediction overlaps better but arrives second.
    let predictions = vec![
        pred("1", [1.0, 0.0, 10.0, 10.0], 0.9),
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.5),
    ];
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0])];
    assert_eq!(flags(&predictions, ground_truth, 0.5), vec![true, false]);
}

#[test]
fn test_no_fallback_below_threshold() {
    // The second prediction's best unused candidate only reaches IoU 0.25.
    let predictions = vec![
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.9),
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.8),
    ];
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0]), gt("1", [0.0, 0.0, 5.0, 5.0])];
    assert_eq!(flags(&predictions, ground_truth, 0.5), vec![true, false]);
}

#[test]
fn test_second_prediction_takes_other_box() {
    let predictions = vec![
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.9),
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.8),
    ];
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0]), gt("1", [0.0, 0.0, 10.0, 9.0])];
    assert_eq!(flags(&predictions, ground_truth, 0.5), vec![true, true]);
}

#[test]
fn test_tie_keeps_first_candidate() {
    let predictions = vec![pred("1", [0.0, 0.0, 10.0, 10.0], 0.9)];
    let mut pool = GroundTruthPool::from_records(vec![
        gt("1", [0.0, 0.0, 10.0, 10.0]),
        gt("1", [0.0, 0.0, 10.0, 10.0]),
    ]);
    let matches = match_class(&predictions, &mut pool, 0.5);
    assert_eq!(matches[0].ground_truth_index, Some(0));
    assert!(!pool.candidates("1")[1].is_used());
}

#[test]
fn test_iou_exactly_at_threshold_is_accepted() {
    // IoU = 50 / 100 = 0.5
    let predictions = vec![pred("1", [0.0, 0.0, 10.0, 5.0], 0.9)];
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0])];
    assert_eq!(flags(&predictions, ground_truth, 0.5), vec![true]);
}

#[test]
fn test_zero_iou_never_matches() {
    let predictions = vec![pred("1", [50.0, 50.0, 60.0, 60.0], 0.9)];
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0])];
    assert_eq!(flags(&predictions, ground_truth, 0.0), vec![false]);
}

#[test]
fn test_other_image_is_not_eligible() {
    let predictions = vec![pred("2", [0.0, 0.0, 10.0, 10.0], 0.9)];
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0])];
    assert_eq!(flags(&predictions, ground_truth, 0.5), vec![false]);
}

#[test]
fn test_true_positives_never_exceed_ground_truth() {
    let predictions: Vec<PredictionRecord> = (0..20)
        .map(|i| pred("1", [0.0, 0.0, 10.0, 10.0], 1.0 - i as f64 * 0.01))
        .collect();
    let ground_truth = vec![gt("1", [0.0, 0.0, 10.0, 10.0]), gt("1", [1.0, 1.0, 10.0, 10.0])];

    let tp = flags(&predictions, ground_truth, 0.5).iter().filter(|&&f| f).count();
    assert_eq!(tp, 2);
}

#[test]
fn test_raising_iou_threshold_never_adds_true_positives() {
    let predictions = vec![
        pred("1", [0.0, 0.0, 10.0, 10.0], 0.9),
        pred("1", [2.0, 2.0, 12.0, 12.0], 0.8),
        pred("1", [20.0, 20.0, 28.0, 30.0], 0.7),
        pred("1", [19.0, 19.0, 31.0, 31.0], 0.6),
        pred("2", [5.0, 0.0, 15.0, 10.0], 0.5),
    ];
    let ground_truth = || {
        vec![
            gt("1", [0.0, 0.0, 10.0, 10.0]),
            gt("1", [20.0, 20.0, 30.0, 30.0]),
            gt("2", [0.0, 0.0, 10.0, 10.0]),
        ]
    };

    let mut previous = usize::MAX;
    for step in 0..=10 {
        let threshold = step as f64 / 10.0;
        let tp = flags(&predictions, ground_truth(), threshold)
            .iter()
            .filter(|&&f| f)
            .count();
        assert!(tp <= previous, "threshold {} gave {} > {}", threshold, tp, previous);
        previous = tp;
    }
}

// ============================================================================
// GEOMETRY EDGE CASES
// ============================================================================

#[test]
fn test_zero_area_boxes() {
    let point = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
    assert_eq!(calculate_iou(&point, &point), 0.0);

    let line = BoundingBox::new(0.0, 0.0, 10.0, 0.0);
    let square = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(calculate_iou(&line, &square), 0.0);
}

#[test]
fn test_far_apart_boxes_are_clamped() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(100.0, 100.0, 110.0, 110.0);
    assert_eq!(calculate_iou(&a, &b), 0.0);
}

// ============================================================================
// AP EDGE CASES
// ============================================================================

#[test]
fn test_ap_of_empty_curve_is_zero() {
    assert_eq!(voc_ap(&[], &[]).ap, 0.0);
}

#[test]
fn test_precision_dip_is_smoothed() {
    // Envelope turns [1.0, 0.5, 0.75] into [1.0, 0.75, 0.75].
    let result = voc_ap(&[0.25, 0.25, 0.75], &[1.0, 0.5, 0.75]);
    assert!((result.ap - (0.25 + 0.5 * 0.75)).abs() < 1e-12);
}

// ============================================================================
// AGGREGATION EDGE CASES
// ============================================================================

#[test]
fn test_class_with_neither_ground_truth_nor_predictions() {
    let index = AnnotationIndex::build(vec![
        ImageAnnotation::new("1").with_object(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car"),
    ]);
    let predictions = PredictionSet::from_records(vec![pred("1", [0.0, 0.0, 10.0, 10.0], 0.9)]);

    let result = evaluate(
        &index,
        &predictions,
        &["car", "unicorn"],
        &EvalConfig::default(),
    )
    .unwrap();
    assert_eq!(result.ap_for("unicorn"), Some(0.0));
    assert!((result.map - 50.0).abs() < 1e-9);
    assert!(!result.has_issues());
}

#[test]
fn test_image_without_objects_still_queried() {
    let mut annotations = vec![
        ImageAnnotation::new("1").with_object(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car"),
        ImageAnnotation::new("background"),
    ];
    let mut predictions = StaticPredictions::new();
    predictions.insert(
        "1",
        vec![Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car", 0.9)],
    );
    predictions.insert(
        "background",
        vec![Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car", 0.95)],
    );

    let result = run_evaluation(
        &mut annotations,
        &mut predictions,
        &["car"],
        &EvalConfig::default(),
    )
    .unwrap();

    let car = result.class("car").unwrap();
    assert_eq!(car.is_true_positive, vec![false, true]);
    assert!((car.ap - 0.5).abs() < 1e-12);
}

#[test]
fn test_equal_scores_keep_accumulation_order() {
    let mut annotations = vec![
        ImageAnnotation::new("a").with_object(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car"),
        ImageAnnotation::new("b"),
    ];
    let mut predictions = StaticPredictions::new();
    predictions.insert(
        "a",
        vec![Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car", 0.5)],
    );
    predictions.insert(
        "b",
        vec![Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "car", 0.5)],
    );

    let result = run_evaluation(
        &mut annotations,
        &mut predictions,
        &["car"],
        &EvalConfig::default(),
    )
    .unwrap();

    // Image "a" is visited first, so its TP comes first.
    assert_eq!(result.class("car").unwrap().is_true_positive, vec![true, false]);
    assert!((result.ap_for("car").unwrap() - 1.0).abs() < 1e-12);
}
