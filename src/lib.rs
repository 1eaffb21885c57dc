//! LabelMe polygon annotations to COCO corpus converter
//!
//! This library builds a single COCO corpus from per-frame LabelMe JSON files
//! and splits such a corpus into train and test subsets by image.

pub mod coco;
pub mod coco_dataset;
pub mod config;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod split;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use coco::{calculate_shape_geometry, Annotation, Category, CocoFile, Image, ShapeGeometry};
pub use coco_dataset::{build_corpus, convert, BuildReport};
pub use config::{ConvertArgs, ConvertConfig, SplitArgs, SplitConfig};
pub use error::{ConvertError, Result};
pub use registry::IdentityRegistry;
pub use resolver::{ImageResolver, ResolvedImage};
pub use split::{seeded_shuffle, split_coco_file, split_corpus, CorpusSplit, SplitReport};
pub use types::{FrameKey, LabelFile, ProcessingStats, Shape};
pub use utils::{collect_label_files, LabelFileListing};
