//! Display metadata for a completed load

use crate::bounds::Bounds;
use pointview_core::ErrorKind;
use serde::{Deserialize, Serialize};

/// What the sidebar shows once a file is fully processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub point_count: usize,
    /// `W×H×D` with two decimals
    pub bounding_box_label: String,
}

impl Metadata {
    /// Point count with thousands separators, e.g. `1,234,567`
    pub fn point_count_label(&self) -> String {
        let digits = self.point_count.to_string();
        let mut label = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                label.push(',');
            }
            label.push(ch);
        }
        label
    }
}

/// Build the metadata record for a finished pipeline run
pub fn report_metadata(bounds: &Bounds) -> Metadata {
    Metadata {
        point_count: bounds.point_count,
        bounding_box_label: bounds.bounding_box.label(),
    }
}

/// A load that finished with zero usable points
///
/// Not an error: the bundle is still delivered. `source_rows` lets a caller
/// tell an empty file apart from one whose rows were all invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyPointSet {
    pub source_rows: usize,
}

impl EmptyPointSet {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::EmptyPointSet
    }

    /// The source had no rows at all
    pub fn is_empty_source(&self) -> bool {
        self.source_rows == 0
    }

    /// Message for the placeholder shown in an empty scene
    pub fn message(&self) -> String {
        if self.is_empty_source() {
            "file contains no points".to_string()
        } else {
            format!("no valid points among {} rows", self.source_rows)
        }
    }
}
