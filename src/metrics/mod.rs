//! Metric calculations: IoU, precision/recall curves and AP.

pub mod iou;
pub mod ap;
pub mod precision_recall;

pub use iou::calculate_iou;
pub use ap::{calculate_map, eleven_point_ap, map_percentage, voc_ap, ApMethod, VocAp};
pub use precision_recall::build_precision_recall_curve;
