//! # voc-eval
//!
//! A Rust library for PASCAL VOC style object detection evaluation.
//!
//! Given ground-truth boxes and scored predictions over a fixed class
//! vocabulary, it computes per-class **Average Precision** and the dataset
//! **mAP** (reported as a percentage):
//!
//! - IoU (Intersection over Union) between corner-format boxes
//! - Greedy, score-ordered matching of predictions to ground truth
//! - Cumulative precision/recall curves
//! - All-point interpolated AP (VOC2010+) or 11-point AP (VOC2007)
//!
//! Record-level problems such as malformed boxes, unknown classes or a
//! prediction source failing on one image are collected as issues on the
//! result instead of aborting the run.
//!
//! ## Quick Start
//!
//! ```rust
//! use voc_eval::config::EvalConfig;
//! use voc_eval::evaluator::run_evaluation;
//! use voc_eval::loader::{load_predictions_from_str, TextAnnotationSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let classes = vec!["car".to_string(), "dog".to_string()];
//! let mut annotations = TextAnnotationSource::from_text(
//!     "img1.jpg 10,10,50,50,0 60,60,90,90,1\n",
//!     &classes,
//! );
//! let mut predictions = load_predictions_from_str(
//!     r#"{"img1.jpg": [{"bbox": [10, 10, 50, 50], "label": "car", "score": 0.9}]}"#,
//! )?;
//!
//! let config = EvalConfig::default();
//! let result = run_evaluation(&mut annotations, &mut predictions, &classes, &config)?;
//! println!("{}", voc_eval::report::render_text(&result));
//! assert!((result.map - 50.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Annotation format
//!
//! One image per line, boxes as `xmin,ymin,xmax,ymax,class_index`:
//!
//! ```text
//! images/000001.jpg 100,120,200,235,11 85,63,156,128,6
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod stats;
pub mod threshold;
pub mod metrics;
pub mod matching;
pub mod annotation;
pub mod source;
pub mod loader;
pub mod evaluator;
pub mod report;

// Re-export commonly used types and functions
pub use annotation::AnnotationIndex;
pub use config::EvalConfig;
pub use error::{EvalIssue, Result, VocEvalError};
pub use evaluator::{evaluate, run_evaluation};
pub use loader::{
    load_class_names, load_predictions_from_file, load_predictions_from_str, TextAnnotationSource,
};
pub use source::{
    collect_predictions, AnnotationSource, PredictionSet, PredictionSource, StaticPredictions,
};
pub use stats::IngestStats;
pub use types::{
    AggregateResult, BoundingBox, ClassEvaluation, Detection, GroundTruthRecord, ImageAnnotation,
    PrecisionRecallCurve, PredictionRecord,
};
