use glob::{glob, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::types::LabelFile;

/// Read and parse a single LabelMe JSON file from a buffered stream
pub fn read_and_parse_json(path: &Path) -> Result<LabelFile> {
    let parse_error = |message: String| ConvertError::LabelParse {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|e| parse_error(e.to_string()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| parse_error(e.to_string()))
}

/// Label files found under a label root
#[derive(Debug, Default)]
pub struct LabelFileListing {
    /// Matching files, sorted by path
    pub paths: Vec<PathBuf>,
    /// Entries the directory walk could not read, as `LabelParse` errors
    pub unreadable: Vec<ConvertError>,
}

/// Collect label files under `label_dir` matching `pattern`, sorted by path so
/// that id assignment does not depend on directory listing order
pub fn collect_label_files(label_dir: &Path, pattern: &str) -> Result<LabelFileListing> {
    // The root itself may contain glob metacharacters.
    let root = Pattern::escape(&label_dir.to_string_lossy());
    let full_pattern = format!("{}/{}", root.trim_end_matches('/'), pattern);

    let mut paths = Vec::new();
    let mut unreadable = Vec::new();
    for entry in glob(&full_pattern)? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => unreadable.push(ConvertError::LabelParse {
                path: e.path().to_path_buf(),
                message: e.error().to_string(),
            }),
        }
    }

    paths.sort();
    Ok(LabelFileListing { paths, unreadable })
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Thread pool for the file loading stage; `None` uses rayon's default size
pub fn create_io_thread_pool(workers: Option<usize>) -> Result<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(workers) = workers {
        builder = builder.num_threads(workers);
    }
    Ok(builder.build()?)
}
