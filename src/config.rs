//! Evaluation configuration.

use crate::error::Result;
use crate::metrics::ap::ApMethod;
use crate::threshold::validate_threshold;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default IoU a prediction needs to claim a ground-truth box.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;

/// Knobs of one evaluation run.
///
/// Every field has a default, so a JSON config only needs the fields it changes:
///
/// ```
/// use voc_eval::config::EvalConfig;
/// use voc_eval::metrics::ApMethod;
///
/// let config = EvalConfig::from_json_str(r#"{ "ap_method": "eleven_point" }"#).unwrap();
/// assert_eq!(config.iou_threshold, 0.5);
/// assert_eq!(config.ap_method, ApMethod::ElevenPoint);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// Minimum IoU for a match.
    pub iou_threshold: f64,
    /// Predictions must score strictly above this to be collected.
    pub score_threshold: f64,
    pub ap_method: ApMethod,
    /// Evaluate classes on the rayon thread pool.
    pub parallel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            score_threshold: 0.0,
            ap_method: ApMethod::AllPoints,
            parallel: false,
        }
    }
}

impl EvalConfig {
    pub fn with_iou_threshold(mut self, iou_threshold: f64) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_score_threshold(mut self, score_threshold: f64) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    pub fn with_ap_method(mut self, ap_method: ApMethod) -> Self {
        self.ap_method = ap_method;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that both thresholds lie in [0.0, 1.0].
    pub fn validate(&self) -> Result<()> {
        validate_threshold("IoU", self.iou_threshold)?;
        validate_threshold("score", self.score_threshold)?;
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EvalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: EvalConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
