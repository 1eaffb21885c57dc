//! Deterministic train/test split of a COCO corpus by image.

use log::{info, warn};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coco::{Annotation, CocoFile, Image};
use crate::config::SplitConfig;
use crate::error::{ConvertError, Result};

/// The two halves of a split corpus
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusSplit {
    pub train: CocoFile,
    pub test: CocoFile,
}

/// Where a split was written and how large each half is
#[derive(Debug, Clone, PartialEq)]
pub struct SplitReport {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub train_images: usize,
    pub train_annotations: usize,
    pub test_images: usize,
    pub test_annotations: usize,
}

/// Shuffle `items` in place with Fisher-Yates driven by ChaCha8 seeded from
/// `seed`.
///
/// For `i` from the last index down to 1, swap `items[i]` with
/// `items[next_u64() % (i + 1)]`. ChaCha8's output stream is fixed for a given
/// seed, so the permutation is reproducible across platforms and releases.
/// The modulo bias is below `len / 2^64` and is accepted.
pub fn seeded_shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for i in (1..items.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

/// Number of test images for `len` images at `test_ratio`, rounded down.
pub fn test_count(len: usize, test_ratio: f64) -> usize {
    ((len as f64 * test_ratio).floor() as usize).min(len)
}

/// Partition `coco` into train and test corpora.
///
/// Image ids are taken in corpus order, permuted with [`seeded_shuffle`], and
/// the first `floor(len * test_ratio)` become the test set. Images and
/// annotations keep their source order within each half; categories are
/// copied to both.
pub fn split_corpus(coco: &CocoFile, test_ratio: f64, seed: u64) -> Result<CorpusSplit> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ConvertError::InvalidRatio(test_ratio));
    }

    let mut image_ids: Vec<u32> = coco.images.iter().map(|image| image.id).collect();
    seeded_shuffle(&mut image_ids, seed);
    let n_test = test_count(image_ids.len(), test_ratio);
    let test_ids: HashSet<u32> = image_ids[..n_test].iter().copied().collect();

    let (test_images, train_images): (Vec<Image>, Vec<Image>) = coco
        .images
        .iter()
        .cloned()
        .partition(|image| test_ids.contains(&image.id));
    let (test_annotations, train_annotations): (Vec<Annotation>, Vec<Annotation>) = coco
        .annotations
        .iter()
        .cloned()
        .partition(|ann| test_ids.contains(&ann.image_id));

    Ok(CorpusSplit {
        train: CocoFile {
            images: train_images,
            annotations: train_annotations,
            categories: coco.categories.clone(),
        },
        test: CocoFile {
            images: test_images,
            annotations: test_annotations,
            categories: coco.categories.clone(),
        },
    })
}

/// Load the corpus at `input`, split it per `config` and write both halves.
/// Nothing is written if the input cannot be loaded, and a failed write
/// leaves neither half behind.
pub fn split_coco_file(input: &Path, config: &SplitConfig) -> Result<SplitReport> {
    let coco = CocoFile::load(input)?;
    info!(
        "Loaded {} images, {} annotations, {} categories from {}",
        coco.images.len(),
        coco.annotations.len(),
        coco.categories.len(),
        input.display()
    );

    let split = split_corpus(&coco, config.test_ratio, config.seed)?;

    let train_path = config.output_dir.join(&config.train_file_name);
    let test_path = config.output_dir.join(&config.test_file_name);
    save_split(&split, &train_path, &test_path, config.pretty)?;

    info!(
        "Wrote {} train images to {}",
        split.train.images.len(),
        train_path.display()
    );
    info!(
        "Wrote {} test images to {}",
        split.test.images.len(),
        test_path.display()
    );

    Ok(SplitReport {
        train_path,
        test_path,
        train_images: split.train.images.len(),
        train_annotations: split.train.annotations.len(),
        test_images: split.test.images.len(),
        test_annotations: split.test.annotations.len(),
    })
}

/// Write both halves so that a failure never leaves one new half next to a
/// missing or stale other half. Each half is staged to `<name>.tmp` first and
/// only renamed into place once both staged files are complete.
fn save_split(
    split: &CorpusSplit,
    train_path: &Path,
    test_path: &Path,
    pretty: bool,
) -> Result<()> {
    let train_tmp = staging_path(train_path);
    let test_tmp = staging_path(test_path);

    let staged = split
        .train
        .save(&train_tmp, pretty)
        .and_then(|_| split.test.save(&test_tmp, pretty));
    if let Err(e) = staged {
        discard(&train_tmp);
        discard(&test_tmp);
        return Err(e);
    }

    if let Err(e) = rename(&train_tmp, train_path) {
        discard(&train_tmp);
        discard(&test_tmp);
        return Err(e);
    }
    if let Err(e) = rename(&test_tmp, test_path) {
        discard(train_path);
        discard(&test_tmp);
        return Err(e);
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    PathBuf::from(staged)
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| ConvertError::OutputWrite {
        path: to.to_path_buf(),
        source,
    })
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
