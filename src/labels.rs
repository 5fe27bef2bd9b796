//! Class-label lookup table.
//!
//! SSD-head models emit raw class indices that are offset by one against the
//! display table: index 0 of the table is a reserved non-object entry, so raw
//! class 0 maps to `"person"`. `LabelTable::display_name` performs that
//! advance and refuses indices past the end of the table instead of handing
//! back a wild entry.

use crate::error::KernelError;

/// Reserved entry occupying table index 0. Never reported as a detection.
pub const RESERVED_LABEL: &str = "unlabeled";

/// COCO display names, raw-class order (raw class 0 = person).
pub const COCO_DISPLAY_NAMES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Index → display-name table with a reserved zero entry.
pub struct LabelTable {
    entries: Vec<String>,
}

impl LabelTable {
    /// The standard COCO table used by the bundled engines.
    pub fn coco() -> Self {
        let mut entries = Vec::with_capacity(COCO_DISPLAY_NAMES.len() + 1);
        entries.push(RESERVED_LABEL.to_string());
        entries.extend(COCO_DISPLAY_NAMES.iter().map(|name| name.to_string()));
        Self { entries }
    }

    /// Build a table from display names. The reserved zero entry is prepended;
    /// callers pass raw-class-ordered names only.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = vec![RESERVED_LABEL.to_string()];
        entries.extend(names.into_iter().map(Into::into));
        Self { entries }
    }

    /// Number of real classes (the reserved entry excluded).
    pub fn num_classes(&self) -> usize {
        self.entries.len() - 1
    }

    /// Look up the display name for a raw class index.
    ///
    /// The raw index is advanced by one before lookup; an index past the end
    /// of the table is a reportable error, never a silent wild read.
    pub fn display_name(&self, raw_class: usize) -> Result<&str, KernelError> {
        self.entries
            .get(raw_class + 1)
            .map(String::as_str)
            .ok_or(KernelError::OutOfRangeLabel {
                index: raw_class,
                len: self.entries.len(),
            })
    }
}
