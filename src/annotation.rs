//! Ground-truth index: per-image objects and per-class occurrences.

use crate::error::EvalIssue;
use crate::matching::GroundTruthPool;
use crate::stats::IngestStats;
use crate::types::{GroundTruthRecord, ImageAnnotation};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// The two views of the ground truth an evaluation needs.
///
/// * per image: the labelled boxes of that image, in source order
/// * per class: every (image, box) occurrence of that class, in source order
///
/// Malformed boxes and labels outside the vocabulary are left out of both
/// views and recorded as issues.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    images: Vec<ImageAnnotation>,
    image_lookup: HashMap<String, usize>,
    classes: HashMap<String, Vec<GroundTruthRecord>>,
    class_order: Vec<String>,
    issues: Vec<EvalIssue>,
    stats: IngestStats,
}

impl AnnotationIndex {
    /// Build an index accepting any class label.
    pub fn build<I>(annotations: I) -> Self
    where
        I: IntoIterator<Item = ImageAnnotation>,
    {
        Self::build_inner(annotations, None)
    }

    /// Build an index, rejecting labels that are not part of `vocabulary`.
    pub fn build_with_vocabulary<I, S>(annotations: I, vocabulary: &[S]) -> Self
    where
        I: IntoIterator<Item = ImageAnnotation>,
        S: AsRef<str>,
    {
        let known: HashSet<&str> = vocabulary.iter().map(|s| s.as_ref()).collect();
        Self::build_inner(annotations, Some(&known))
    }

    fn build_inner<I>(annotations: I, vocabulary: Option<&HashSet<&str>>) -> Self
    where
        I: IntoIterator<Item = ImageAnnotation>,
    {
        let mut index = Self::default();

        for annotation in annotations {
            index.stats.add_processed_image();
            let slot = index.image_slot(&annotation.image_id);

            for object in annotation.objects {
                index.stats.add_record();

                if vocabulary.is_some_and(|known| !known.contains(object.label.as_str())) {
                    warn!(
                        "Skipping ground truth in '{}': unknown class '{}'",
                        annotation.image_id, object.label
                    );
                    index.stats.reject_unknown_class();
                    index.issues.push(EvalIssue::UnknownClass {
                        image: annotation.image_id.clone(),
                        label: object.label,
                    });
                    continue;
                }

                if let Err(reason) = object.bbox.validate() {
                    warn!(
                        "Skipping ground truth in '{}' for class '{}': {}",
                        annotation.image_id, object.label, reason
                    );
                    index.stats.reject_box();
                    index.issues.push(EvalIssue::MalformedBox {
                        image: annotation.image_id.clone(),
                        class: object.label,
                        reason,
                    });
                    continue;
                }

                let record = GroundTruthRecord::new(
                    annotation.image_id.clone(),
                    object.bbox,
                    object.label.clone(),
                );
                match index.classes.get_mut(&object.label) {
                    Some(records) => records.push(record),
                    None => {
                        index.class_order.push(object.label.clone());
                        index.classes.insert(object.label.clone(), vec![record]);
                    }
                }
                index.images[slot].objects.push(object);
            }
        }

        debug!(
            "Annotation index: {} images, {} classes, {}",
            index.images.len(),
            index.class_order.len(),
            index.stats.summary_string()
        );

        index
    }

    /// Position of an image entry, creating it on first sight.
    ///
    /// An image listed twice keeps a single entry with the objects of both lines.
    fn image_slot(&mut self, image_id: &str) -> usize {
        if let Some(&slot) = self.image_lookup.get(image_id) {
            return slot;
        }
        let slot = self.images.len();
        self.images.push(ImageAnnotation::new(image_id));
        self.image_lookup.insert(image_id.to_string(), slot);
        slot
    }

    /// Accepted objects of one image.
    pub fn image(&self, image_id: &str) -> Option<&ImageAnnotation> {
        self.image_lookup.get(image_id).map(|&slot| &self.images[slot])
    }

    /// All images in the order they were first seen.
    pub fn images(&self) -> &[ImageAnnotation] {
        &self.images
    }

    pub fn image_ids(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|image| image.image_id.as_str())
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Classes that have at least one accepted ground-truth box, in order of
    /// first appearance.
    pub fn class_names(&self) -> &[String] {
        &self.class_order
    }

    /// Every ground-truth occurrence of a class (all unused).
    pub fn class_records(&self, class_name: &str) -> &[GroundTruthRecord] {
        self.classes
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn ground_truth_count(&self, class_name: &str) -> usize {
        self.class_records(class_name).len()
    }

    /// A fresh, fully unused working copy of one class's ground truth.
    pub fn working_copy(&self, class_name: &str) -> GroundTruthPool {
        GroundTruthPool::from_records(self.class_records(class_name).iter().cloned())
    }

    /// Records rejected while building the index.
    pub fn issues(&self) -> &[EvalIssue] {
        &self.issues
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}
