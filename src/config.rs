use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Default glob, relative to the label root, for per-sequence label files
pub const DEFAULT_LABEL_PATTERN: &str = "*_full/ann_dir/*.json";

/// Command-line arguments for converting LabelMe polygons into one COCO corpus.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ConvertArgs {
    /// Root directory holding one `<sequence>_full/ann_dir` folder per sequence
    #[arg(short = 'd', long = "label_dir")]
    pub label_dir: PathBuf,

    /// Root directory holding the source images
    #[arg(short = 'i', long = "image_dir")]
    pub image_dir: PathBuf,

    /// Destination of the COCO JSON file
    #[arg(short = 'o', long = "output", default_value = "annotations/train_coco.json")]
    pub output: PathBuf,

    /// Folder under the image root that holds the per-sequence image folders
    #[arg(long = "image_subdir", default_value = "videos")]
    pub image_subdir: String,

    /// Glob, relative to the label root, selecting the label files
    #[arg(long = "label_pattern", default_value = DEFAULT_LABEL_PATTERN)]
    pub label_pattern: String,

    /// Number of threads used to read label files and image headers
    #[arg(long = "workers", value_parser = validate_workers)]
    pub workers: Option<usize>,

    /// Pretty-print the output JSON
    #[arg(long = "pretty")]
    pub pretty: bool,
}

impl ConvertArgs {
    pub fn to_convert_config(&self) -> ConvertConfig {
        ConvertConfig {
            label_dir: self.label_dir.clone(),
            image_dir: self.image_dir.clone(),
            output: self.output.clone(),
            image_subdir: self.image_subdir.clone(),
            label_pattern: self.label_pattern.clone(),
            workers: self.workers,
            pretty: self.pretty,
        }
    }
}

/// Command-line arguments for splitting a COCO corpus into train and test sets.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct SplitArgs {
    /// COCO JSON file to split
    #[arg(short = 'i', long = "input", default_value = "annotations/train_coco.json")]
    pub input: PathBuf,

    /// Directory receiving train_split.json and test_split.json
    #[arg(short = 'o', long = "output_dir", default_value = "annotations")]
    pub output_dir: PathBuf,

    /// Fraction of images assigned to the test split
    #[arg(long = "test_ratio", default_value_t = 0.1, value_parser = validate_ratio)]
    pub test_ratio: f64,

    /// Seed for the image permutation
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Pretty-print the output JSON
    #[arg(long = "pretty")]
    pub pretty: bool,
}

impl SplitArgs {
    pub fn to_split_config(&self) -> SplitConfig {
        SplitConfig {
            output_dir: self.output_dir.clone(),
            test_ratio: self.test_ratio,
            seed: self.seed,
            pretty: self.pretty,
            ..SplitConfig::default()
        }
    }
}

/// Settings for one corpus build
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub label_dir: PathBuf,
    pub image_dir: PathBuf,
    pub output: PathBuf,
    pub image_subdir: String,
    pub label_pattern: String,
    pub workers: Option<usize>,
    pub pretty: bool,
}

impl ConvertConfig {
    pub fn new(
        label_dir: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label_dir: label_dir.into(),
            image_dir: image_dir.into(),
            output: output.into(),
            image_subdir: "videos".to_string(),
            label_pattern: DEFAULT_LABEL_PATTERN.to_string(),
            workers: None,
            pretty: false,
        }
    }
}

/// Settings for one corpus split
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub output_dir: PathBuf,
    pub test_ratio: f64,
    pub seed: u64,
    pub train_file_name: String,
    pub test_file_name: String,
    pub pretty: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("annotations"),
            test_ratio: 0.1,
            seed: 42,
            train_file_name: "train_split.json".to_string(),
            test_file_name: "test_split.json".to_string(),
            pretty: false,
        }
    }
}

// Validate that the ratio is strictly between 0.0 and 1.0
fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if val > 0.0 && val < 1.0 => Ok(val),
        _ => Err("RATIO must be strictly between 0.0 and 1.0".to_string()),
    }
}

fn validate_workers(s: &str) -> Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val > 0 => Ok(val),
        _ => Err("WORKERS must be a positive integer".to_string()),
    }
}
