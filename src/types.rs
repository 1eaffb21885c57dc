use serde::Deserialize;
use std::path::Path;

use crate::error::ConvertError;

// The Shape struct representing one labeled polygon
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Shape {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

// A LabelMe document; only the shapes matter here, every other field is ignored
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct LabelFile {
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

/// Sequence and frame identity parsed from `<prefix>_<sequenceId>_<frameId>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub stem: String,
    pub sequence_id: String,
    pub frame_id: String,
}

impl FrameKey {
    /// Parse the key from a label file path. The sequence id is the second
    /// underscore-separated field of the stem and the frame id the last one.
    pub fn from_label_path(path: &Path) -> Result<Self, ConvertError> {
        let invalid = || ConvertError::LabelFileName {
            path: path.to_path_buf(),
        };

        let stem = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
            .ok_or_else(invalid)?;

        let fields: Vec<&str> = stem.split('_').collect();
        if fields.len() < 3 || fields.iter().any(|f| f.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            stem: stem.to_string(),
            sequence_id: fields[1].to_string(),
            frame_id: fields[fields.len() - 1].to_string(),
        })
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful_conversions: usize,
    pub skipped_missing_image: usize,
    pub skipped_unreadable_image: usize,
    pub skipped_bad_label_file: usize,
    pub images: usize,
    pub annotations: usize,
    pub categories: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_files_processed += 1;
    }

    pub fn increment_successful(&mut self) {
        self.successful_conversions += 1;
    }

    /// Count a recoverable per-file failure under the matching bucket.
    pub fn record_skip(&mut self, error: &ConvertError) {
        match error {
            ConvertError::ImageNotFound { .. } => self.skipped_missing_image += 1,
            ConvertError::ImageUnreadable { .. } => self.skipped_unreadable_image += 1,
            _ => self.skipped_bad_label_file += 1,
        }
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_missing_image + self.skipped_unreadable_image + self.skipped_bad_label_file
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total label files processed: {}", self.total_files_processed);
        log::info!("Successful conversions: {}", self.successful_conversions);
        log::info!("Skipped (missing image file): {}", self.skipped_missing_image);
        log::info!(
            "Skipped (unreadable image file): {}",
            self.skipped_unreadable_image
        );
        log::info!(
            "Skipped (unreadable label file): {}",
            self.skipped_bad_label_file
        );
        log::info!("Total images: {}", self.images);
        log::info!("Total annotations: {}", self.annotations);
        log::info!("Total categories: {}", self.categories);

        let total_skipped = self.total_skipped();
        if total_skipped > 0 {
            log::warn!(
                "Total skipped label files: {} (missing image: {}, unreadable image: {}, bad label file: {})",
                total_skipped,
                self.skipped_missing_image,
                self.skipped_unreadable_image,
                self.skipped_bad_label_file
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_frame_key_from_label_path() {
        let key = FrameKey::from_label_path(Path::new("VID01_full/ann_dir/t50_VID01_000468.json"))
            .unwrap();
        assert_eq!(key.stem, "t50_VID01_000468");
        assert_eq!(key.sequence_id, "VID01");
        assert_eq!(key.frame_id, "000468");

        // Extra fields between the sequence and frame are tolerated.
        let key = FrameKey::from_label_path(Path::new("t50_VID12_extra_000002.json")).unwrap();
        assert_eq!(key.sequence_id, "VID12");
        assert_eq!(key.frame_id, "000002");
    }

    #[test]
    fn test_frame_key_rejects_short_names() {
        for name in ["VID01_000001.json", "frame.json", "t50__000001.json"] {
            let err = FrameKey::from_label_path(&PathBuf::from(name)).unwrap_err();
            assert!(matches!(err, ConvertError::LabelFileName { .. }), "{}", name);
        }
    }

    #[test]
    fn test_label_file_ignores_extra_fields() {
        let json = r#"{
            "version": "5.2.1",
            "flags": {},
            "shapes": [
                {"label": "grasper", "points": [[1.0, 2.0], [3, 4]], "group_id": null, "shape_type": "polygon"}
            ],
            "imagePath": "000001.png",
            "imageData": null,
            "imageHeight": 480,
            "imageWidth": 854
        }"#;
        let label: LabelFile = serde_json::from_str(json).unwrap();
        assert_eq!(label.shapes.len(), 1);
        assert_eq!(label.shapes[0].points, vec![(1.0, 2.0), (3.0, 4.0)]);

        let empty: LabelFile = serde_json::from_str("{}").unwrap();
        assert!(empty.shapes.is_empty());
    }

    #[test]
    fn test_stats_record_skip() {
        let mut stats = ProcessingStats::new();
        stats.record_skip(&ConvertError::ImageNotFound {
            sequence_id: "VID01".to_string(),
            frame_id: "1".to_string(),
            tried: Vec::new(),
        });
        stats.record_skip(&ConvertError::LabelFileName {
            path: PathBuf::from("x.json"),
        });
        assert_eq!(stats.skipped_missing_image, 1);
        assert_eq!(stats.skipped_bad_label_file, 1);
        assert_eq!(stats.total_skipped(), 2);
    }
}
