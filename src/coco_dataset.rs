//! COCO corpus building
//!
//! Label files are read and their images located on a worker pool. Ids are then
//! assigned in a single sequential pass over the results, in label file order,
//! so a parallel build allocates exactly the ids a sequential one would.

use log::{info, warn};
use rayon::prelude::*;
use std::path::Path;

use crate::coco::{calculate_shape_geometry, Annotation, CocoFile, Image};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::registry::IdentityRegistry;
use crate::resolver::{ImageResolver, ResolvedImage};
use crate::types::{FrameKey, LabelFile, ProcessingStats};
use crate::utils::{
    collect_label_files, create_io_thread_pool, create_progress_bar, read_and_parse_json,
    LabelFileListing,
};

/// Outcome of a corpus build
#[derive(Debug)]
pub struct BuildReport {
    pub coco: CocoFile,
    pub stats: ProcessingStats,
}

/// A label file whose image has been found
#[derive(Debug)]
struct LoadedLabelFile {
    label: LabelFile,
    image: ResolvedImage,
}

/// Build a corpus from `config`, write it to `config.output` and report.
pub fn convert(config: &ConvertConfig) -> Result<BuildReport> {
    let listing = collect_label_files(&config.label_dir, &config.label_pattern)?;
    info!(
        "Found {} label files under {}",
        listing.paths.len(),
        config.label_dir.display()
    );

    let resolver = ImageResolver::with_default_candidates(&config.image_dir, &config.image_subdir);
    let mut registry = IdentityRegistry::new();
    let report = build_corpus(&listing, &resolver, &mut registry, config.workers)?;

    report.coco.save(&config.output, config.pretty)?;
    info!("COCO JSON saved at: {}", config.output.display());
    Ok(report)
}

/// Turn the listed label files into one corpus using ids from `registry`.
///
/// Files whose image is missing or unreadable, or which cannot be parsed, are
/// skipped with a warning, as are entries the listing could not read. A shape
/// without points aborts the build.
pub fn build_corpus(
    listing: &LabelFileListing,
    resolver: &ImageResolver,
    registry: &mut IdentityRegistry,
    workers: Option<usize>,
) -> Result<BuildReport> {
    let label_files = &listing.paths;
    let thread_pool = create_io_thread_pool(workers)?;
    let pb = create_progress_bar(label_files.len() as u64, "Converting");

    let loaded: Vec<Result<LoadedLabelFile>> = thread_pool.install(|| {
        label_files
            .par_iter()
            .map(|path| {
                let result = load_label_file(path, resolver);
                pb.inc(1);
                result
            })
            .collect()
    });
    pb.finish_and_clear();

    let mut coco = CocoFile::default();
    let mut stats = ProcessingStats::new();

    for e in &listing.unreadable {
        stats.increment_total();
        warn!("Skipping unreadable entry: {}", e);
        stats.record_skip(e);
    }

    for (path, result) in label_files.iter().zip(loaded) {
        stats.increment_total();
        match result {
            Ok(loaded) => {
                add_label_file(path, &loaded, registry, &mut coco)?;
                stats.increment_successful();
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping {}: {}", path.display(), e);
                stats.record_skip(&e);
            }
            Err(e) => return Err(e),
        }
    }

    coco.categories = registry.categories();
    stats.images = coco.images.len();
    stats.annotations = coco.annotations.len();
    stats.categories = coco.categories.len();

    Ok(BuildReport { coco, stats })
}

fn load_label_file(path: &Path, resolver: &ImageResolver) -> Result<LoadedLabelFile> {
    let key = FrameKey::from_label_path(path)?;
    let label = read_and_parse_json(path)?;
    let image = resolver.resolve(&key)?;
    Ok(LoadedLabelFile { label, image })
}

fn add_label_file(
    path: &Path,
    loaded: &LoadedLabelFile,
    registry: &mut IdentityRegistry,
    coco: &mut CocoFile,
) -> Result<()> {
    let image = &loaded.image;
    let (image_id, is_new) = registry.image_id(&image.relative_path);
    if is_new {
        coco.images.push(Image::new(
            image_id,
            image.relative_path.clone(),
            image.height,
            image.width,
        ));
    }

    for shape in &loaded.label.shapes {
        let geometry =
            calculate_shape_geometry(&shape.points).ok_or_else(|| ConvertError::InvalidShape {
                path: path.to_path_buf(),
                label: shape.label.clone(),
            })?;
        let category_id = registry.category_id(&shape.label);
        let annotation_id = registry.next_annotation_id();
        coco.annotations.push(Annotation::from_geometry(
            annotation_id,
            image_id,
            category_id,
            geometry,
        ));
    }

    Ok(())
}
