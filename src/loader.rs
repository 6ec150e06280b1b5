//! Loading utilities for class lists, text annotations and JSON predictions.
//!
//! The text annotation format has one image per line:
//!
//! ```text
//! path/to/000001.jpg 100,120,200,235,11 85,63,156,128,6
//! path/to/000002.jpg 48,240,195,371,11
//! ```
//!
//! Each box is `xmin,ymin,xmax,ymax,class_index`, where the index points into
//! the class list loaded with [`load_class_names`].

use crate::error::{EvalIssue, Result, VocEvalError};
use crate::source::{AnnotationSource, StaticPredictions};
use crate::stats::IngestStats;
use crate::types::{BoundingBox, ImageAnnotation};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Load class names from a file with one name per line.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains no class names.
pub fn load_class_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    parse_class_names(&text)
}

/// Parse class names, one per line. Names are trimmed and blank lines skipped.
///
/// ```
/// use voc_eval::loader::parse_class_names;
///
/// let names = parse_class_names("aeroplane\nbicycle\n\nbird\n").unwrap();
/// assert_eq!(names, vec!["aeroplane", "bicycle", "bird"]);
/// ```
pub fn parse_class_names(text: &str) -> Result<Vec<String>> {
    let names: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return Err(VocEvalError::EmptyDataset(
            "class list must contain at least one class".to_string(),
        ));
    }

    Ok(names)
}

/// Result of parsing a text annotation file.
#[derive(Debug, Clone, Default)]
pub struct ParsedAnnotations {
    pub images: Vec<ImageAnnotation>,
    pub issues: Vec<EvalIssue>,
    pub stats: IngestStats,
}

/// Parse text annotations against a class list.
///
/// Tokens that cannot be parsed and class indices outside `class_names` are
/// reported as issues; the remaining boxes of the line are kept. Blank lines
/// are ignored and a line with only an image path yields an image without
/// objects.
///
/// ```
/// use voc_eval::loader::parse_annotation_lines;
///
/// let classes = vec!["dog".to_string(), "car".to_string()];
/// let parsed = parse_annotation_lines("img1.jpg 1,2,30,40,1 5,5,9,9,0\n", &classes);
/// assert_eq!(parsed.images.len(), 1);
/// assert_eq!(parsed.images[0].objects[0].label, "car");
/// assert!(parsed.issues.is_empty());
/// ```
pub fn parse_annotation_lines(text: &str, class_names: &[String]) -> ParsedAnnotations {
    let mut parsed = ParsedAnnotations::default();

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(image_id) = tokens.next() else {
            continue;
        };

        parsed.stats.add_processed_image();
        let mut image = ImageAnnotation::new(image_id);

        for token in tokens {
            match parse_box_token(token) {
                Ok((bbox, class_index)) => {
                    parsed.stats.add_record();
                    match class_names.get(class_index) {
                        Some(label) => {
                            image = image.with_object(bbox, label.clone());
                        }
                        None => {
                            warn!("Unknown class index {} in '{}'", class_index, image_id);
                            parsed.stats.reject_unknown_class();
                            parsed.issues.push(EvalIssue::UnknownClass {
                                image: image_id.to_string(),
                                label: class_index.to_string(),
                            });
                        }
                    }
                }
                Err(reason) => {
                    warn!("Unparsable box '{}' in '{}': {}", token, image_id, reason);
                    parsed.stats.reject_unparsable();
                    parsed.issues.push(EvalIssue::UnparsableRecord {
                        image: image_id.to_string(),
                        record: token.to_string(),
                        reason,
                    });
                }
            }
        }

        parsed.images.push(image);
    }

    debug!(
        "Parsed {} annotated images, {}",
        parsed.images.len(),
        parsed.stats.summary_string()
    );

    parsed
}

fn parse_box_token(token: &str) -> std::result::Result<(BoundingBox, usize), String> {
    let fields: Vec<&str> = token.split(',').collect();
    if fields.len() != 5 {
        return Err(format!("expected 5 comma separated fields, got {}", fields.len()));
    }

    let mut coords = [0.0f64; 4];
    for (slot, field) in coords.iter_mut().zip(&fields[..4]) {
        *slot = field
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate '{}': {}", field, e))?;
    }

    let class_index = fields[4]
        .parse::<usize>()
        .map_err(|e| format!("bad class index '{}': {}", fields[4], e))?;

    Ok((BoundingBox::from(coords), class_index))
}

/// An [`AnnotationSource`] backed by the text annotation format.
#[derive(Debug, Clone, Default)]
pub struct TextAnnotationSource {
    parsed: ParsedAnnotations,
}

impl TextAnnotationSource {
    pub fn from_text(text: &str, class_names: &[String]) -> Self {
        Self {
            parsed: parse_annotation_lines(text, class_names),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P, class_names: &[String]) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text, class_names))
    }

    pub fn stats(&self) -> &IngestStats {
        &self.parsed.stats
    }
}

impl AnnotationSource for TextAnnotationSource {
    fn annotations(&mut self) -> Result<Vec<ImageAnnotation>> {
        Ok(self.parsed.images.clone())
    }

    fn take_issues(&mut self) -> Vec<EvalIssue> {
        std::mem::take(&mut self.parsed.issues)
    }
}

/// Load precomputed predictions from a JSON file.
///
/// The file maps image ids to detection lists:
/// `{"000001.jpg": [{"bbox": [x1, y1, x2, y2], "label": "car", "score": 0.9}]}`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_predictions_from_file<P: AsRef<Path>>(path: P) -> Result<StaticPredictions> {
    let reader = BufReader::new(File::open(path)?);
    let predictions: StaticPredictions = serde_json::from_reader(reader)?;
    Ok(predictions)
}

/// Load precomputed predictions from a JSON string.
///
/// ```
/// use voc_eval::loader::load_predictions_from_str;
///
/// let json = r#"{"img1.jpg": [{"bbox": [0, 0, 10, 10], "label": "car", "score": 0.9}]}"#;
/// let predictions = load_predictions_from_str(json).unwrap();
/// assert_eq!(predictions.image_count(), 1);
/// ```
pub fn load_predictions_from_str(json_str: &str) -> Result<StaticPredictions> {
    let predictions: StaticPredictions = serde_json::from_str(json_str)?;
    Ok(predictions)
}
