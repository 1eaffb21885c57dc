//! Error types for the conversion and split pipeline.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// Everything that can go wrong while building or splitting a corpus.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("shape '{label}' in {} has no points", .path.display())]
    InvalidShape { path: PathBuf, label: String },

    #[error("image not found for frame {frame_id} in sequence {sequence_id} (tried: {})", .tried.join(", "))]
    ImageNotFound {
        sequence_id: String,
        frame_id: String,
        tried: Vec<String>,
    },

    #[error("could not read image {}: {source}", .path.display())]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("label file name {} does not match <prefix>_<sequence>_<frame>.json", .path.display())]
    LabelFileName { path: PathBuf },

    #[error("failed to read label file {}: {message}", .path.display())]
    LabelParse { path: PathBuf, message: String },

    #[error("failed to load corpus {}: {message}", .path.display())]
    CorpusLoad { path: PathBuf, message: String },

    #[error("failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test ratio must be strictly between 0 and 1, got {0}")]
    InvalidRatio(f64),

    #[error("invalid label pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ConvertError {
    /// Whether the builder may skip the offending label file and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConvertError::ImageNotFound { .. }
                | ConvertError::ImageUnreadable { .. }
                | ConvertError::LabelFileName { .. }
                | ConvertError::LabelParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let missing = ConvertError::ImageNotFound {
            sequence_id: "VID01".to_string(),
            frame_id: "000001".to_string(),
            tried: vec!["videos/VID01/000001.png".to_string()],
        };
        assert!(missing.is_recoverable());
        assert!(missing.to_string().contains("videos/VID01/000001.png"));

        let shape = ConvertError::InvalidShape {
            path: PathBuf::from("a.json"),
            label: "grasper".to_string(),
        };
        assert!(!shape.is_recoverable());
        assert!(!ConvertError::InvalidRatio(1.5).is_recoverable());
    }
}
