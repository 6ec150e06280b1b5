//! Main evaluation orchestrator for VOC-style detection metrics.

use crate::annotation::AnnotationIndex;
use crate::config::EvalConfig;
use crate::error::{EvalIssue, Result, VocEvalError};
use crate::matching::match_class;
use crate::metrics::ap::map_percentage;
use crate::metrics::precision_recall::build_precision_recall_curve;
use crate::source::{collect_predictions, AnnotationSource, PredictionSet, PredictionSource};
use crate::types::{AggregateResult, ClassEvaluation};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;

/// Evaluate collected predictions against the ground truth of `index`.
///
/// **Independent per-class evaluation**: every class of `vocabulary` gets its
/// own fresh working copy of the ground truth, so a box claimed while matching
/// one class is never seen as used by another. With `config.parallel` the
/// classes run on the rayon pool; the result is identical to a serial run.
///
/// A class listed more than once in `vocabulary` is evaluated once, at its
/// first position. Classes without predictions score AP 0 and get no
/// true-positive entry. Classes with predictions but no ground truth score AP 0
/// and are reported as [`EvalIssue::DegenerateGroundTruth`]. Every class counts
/// towards the mAP once.
///
/// Ground truth and predictions of classes outside `vocabulary` are not
/// evaluated; each such record is reported as [`EvalIssue::UnknownClass`] and
/// counted as rejected.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or `vocabulary` is empty.
pub fn evaluate<S>(
    index: &AnnotationIndex,
    predictions: &PredictionSet,
    vocabulary: &[S],
    config: &EvalConfig,
) -> Result<AggregateResult>
where
    S: AsRef<str> + Sync,
{
    config.validate()?;
    if vocabulary.is_empty() {
        return Err(VocEvalError::EmptyDataset(
            "class vocabulary must contain at least one class".to_string(),
        ));
    }

    let classes = distinct_classes(vocabulary);

    let outcomes: Vec<(ClassEvaluation, Option<EvalIssue>)> = if config.parallel {
        classes
            .par_iter()
            .map(|&class_name| evaluate_class(index, predictions, class_name, config))
            .collect()
    } else {
        classes
            .iter()
            .map(|&class_name| evaluate_class(index, predictions, class_name, config))
            .collect()
    };

    let mut result = AggregateResult::default();
    result.issues.extend_from_slice(index.issues());
    result.issues.extend_from_slice(predictions.issues());
    result.ingest.merge(index.stats());
    result.ingest.merge(predictions.stats());

    for issue in out_of_vocabulary(index, predictions, &classes) {
        result.ingest.reject_unknown_class();
        result.issues.push(issue);
    }

    for (evaluation, issue) in outcomes {
        let name = evaluation.class_name.clone();
        result.ap_per_class.push((name.clone(), evaluation.ap));
        if evaluation.prediction_count > 0 {
            result
                .true_positives_per_class
                .push((name.clone(), evaluation.true_positives));
        }
        result
            .ground_truth_counts
            .push((name.clone(), evaluation.ground_truth_count));
        result
            .prediction_counts
            .push((name, evaluation.prediction_count));
        result.issues.extend(issue);
        result.classes.push(evaluation);
    }

    let aps: Vec<f64> = result.ap_per_class.iter().map(|&(_, ap)| ap).collect();
    result.map = map_percentage(&aps);

    info!(
        "Evaluated {} classes: mAP = {:.2}% ({} issues)",
        result.classes.len(),
        result.map,
        result.issues.len()
    );

    Ok(result)
}

/// Class names in first-seen order, each once.
fn distinct_classes<S: AsRef<str>>(vocabulary: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut classes = Vec::with_capacity(vocabulary.len());
    for class_name in vocabulary.iter().map(|class_name| class_name.as_ref()) {
        if seen.insert(class_name) {
            classes.push(class_name);
        } else {
            warn!("Class '{}' listed more than once, evaluating it once", class_name);
        }
    }
    classes
}

/// Accepted records whose class is not evaluated.
///
/// Ground truth comes first in index order, then predictions by class name.
fn out_of_vocabulary(
    index: &AnnotationIndex,
    predictions: &PredictionSet,
    classes: &[&str],
) -> Vec<EvalIssue> {
    let known: HashSet<&str> = classes.iter().copied().collect();
    let mut issues = Vec::new();

    for class_name in index.class_names() {
        if known.contains(class_name.as_str()) {
            continue;
        }
        let records = index.class_records(class_name);
        warn!(
            "Ground truth class '{}' is not in the vocabulary, skipping {} boxes",
            class_name,
            records.len()
        );
        issues.extend(records.iter().map(|record| EvalIssue::UnknownClass {
            image: record.image_id.clone(),
            label: class_name.clone(),
        }));
    }

    let mut predicted: Vec<&str> = predictions
        .class_names()
        .filter(|class_name| !known.contains(class_name))
        .collect();
    predicted.sort_unstable();
    for class_name in predicted {
        let records = predictions.for_class(class_name);
        warn!(
            "Predicted class '{}' is not in the vocabulary, skipping {} predictions",
            class_name,
            records.len()
        );
        issues.extend(records.iter().map(|record| EvalIssue::UnknownClass {
            image: record.image_id.clone(),
            label: class_name.to_string(),
        }));
    }

    issues
}

/// Evaluate a single class.
///
/// Matching mutates only the working copy created here.
fn evaluate_class(
    index: &AnnotationIndex,
    predictions: &PredictionSet,
    class_name: &str,
    config: &EvalConfig,
) -> (ClassEvaluation, Option<EvalIssue>) {
    let class_predictions = predictions.for_class(class_name);
    let ground_truth_count = index.ground_truth_count(class_name);

    if class_predictions.is_empty() {
        debug!("{}: no predictions, AP = 0 ({} ground truth)", class_name, ground_truth_count);
        return (
            ClassEvaluation::without_predictions(class_name, ground_truth_count),
            None,
        );
    }

    let mut pool = index.working_copy(class_name);
    let matches = match_class(class_predictions, &mut pool, config.iou_threshold);
    let is_true_positive: Vec<bool> = matches.iter().map(|m| m.is_true_positive).collect();
    let true_positives = is_true_positive.iter().filter(|&&tp| tp).count();

    let curve = build_precision_recall_curve(&is_true_positive, ground_truth_count);
    let ap = config.ap_method.compute(&curve.recall, &curve.precision);

    let issue = if ground_truth_count == 0 {
        warn!(
            "{}: {} predictions but no ground truth, recall forced to 0",
            class_name,
            class_predictions.len()
        );
        Some(EvalIssue::DegenerateGroundTruth {
            class: class_name.to_string(),
            predictions: class_predictions.len(),
        })
    } else {
        None
    };

    debug!(
        "{}: AP = {:.4} (tp={}, fp={}, gt={})",
        class_name,
        ap,
        true_positives,
        class_predictions.len() - true_positives,
        ground_truth_count
    );

    let evaluation = ClassEvaluation {
        class_name: class_name.to_string(),
        is_true_positive,
        curve,
        ap,
        true_positives,
        ground_truth_count,
        prediction_count: class_predictions.len(),
    };

    (evaluation, issue)
}

/// Run the whole pipeline: read annotations, query predictions, evaluate.
///
/// Annotations are indexed against `vocabulary`, then `prediction_source` is
/// asked once per annotated image with `config.score_threshold`. Problems
/// reported by the annotation source come first in the result's issues.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, `vocabulary` is empty or
/// the annotation source fails as a whole. Failures for single images or
/// records are recorded as issues instead.
///
/// # Example
///
/// ```
/// use voc_eval::config::EvalConfig;
/// use voc_eval::evaluator::run_evaluation;
/// use voc_eval::source::StaticPredictions;
/// use voc_eval::types::{BoundingBox, Detection, ImageAnnotation};
///
/// let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let mut annotations = vec![ImageAnnotation::new("img1").with_object(bbox, "car")];
/// let mut predictions = StaticPredictions::new();
/// predictions.insert("img1", vec![Detection::new(bbox, "car", 0.9)]);
///
/// let result = run_evaluation(
///     &mut annotations,
///     &mut predictions,
///     &["car", "dog"],
///     &EvalConfig::default(),
/// )
/// .unwrap();
///
/// assert_eq!(result.ap_for("car"), Some(1.0));
/// assert_eq!(result.ap_for("dog"), Some(0.0));
/// assert!((result.map - 50.0).abs() < 1e-9);
/// ```
pub fn run_evaluation<A, P, S>(
    annotation_source: &mut A,
    prediction_source: &mut P,
    vocabulary: &[S],
    config: &EvalConfig,
) -> Result<AggregateResult>
where
    A: AnnotationSource + ?Sized,
    P: PredictionSource + ?Sized,
    S: AsRef<str> + Sync,
{
    config.validate()?;
    if vocabulary.is_empty() {
        return Err(VocEvalError::EmptyDataset(
            "class vocabulary must contain at least one class".to_string(),
        ));
    }

    let annotations = annotation_source.annotations()?;
    let source_issues = annotation_source.take_issues();

    let index = AnnotationIndex::build_with_vocabulary(annotations, vocabulary);
    info!(
        "Indexed {} images with ground truth for {} classes",
        index.image_count(),
        index.class_names().len()
    );

    let predictions = collect_predictions(
        prediction_source,
        &index,
        vocabulary,
        config.score_threshold,
    )?;
    info!(
        "Collected {} predictions, {}",
        predictions.len(),
        predictions.stats().summary_string()
    );

    let mut result = evaluate(&index, &predictions, vocabulary, config)?;

    for issue in &source_issues {
        result.ingest.record_issue(issue);
    }
    let mut issues = source_issues;
    issues.append(&mut result.issues);
    result.issues = issues;

    Ok(result)
}
