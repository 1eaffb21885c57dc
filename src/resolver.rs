//! Locate the source image of a label file and read its pixel size.

use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::types::FrameKey;

/// Builds one candidate path, relative to the image root, for a frame.
pub type CandidateFn = Box<dyn Fn(&FrameKey) -> String + Send + Sync>;

/// Extensions tried by the default resolver, in priority order.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg"];

/// An image found on disk for a label file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// `/`-separated path relative to the image root.
    pub relative_path: String,
    pub height: u32,
    pub width: u32,
}

/// Tries an ordered list of candidate paths; the first existing one wins.
pub struct ImageResolver {
    image_root: PathBuf,
    candidates: Vec<CandidateFn>,
}

impl ImageResolver {
    /// Resolver with no candidates; add them with [`ImageResolver::push_candidate`].
    pub fn new(image_root: impl Into<PathBuf>) -> Self {
        Self {
            image_root: image_root.into(),
            candidates: Vec::new(),
        }
    }

    /// `<subdir>/<sequence>/<frame>.png`, then `.jpg`.
    pub fn with_default_candidates(image_root: impl Into<PathBuf>, subdir: &str) -> Self {
        let mut resolver = Self::new(image_root);
        for ext in DEFAULT_EXTENSIONS {
            resolver.push_candidate(frame_in_sequence_dir(subdir, ext));
        }
        resolver
    }

    pub fn push_candidate(&mut self, candidate: CandidateFn) {
        self.candidates.push(candidate);
    }

    pub fn resolve(&self, key: &FrameKey) -> Result<ResolvedImage> {
        let mut tried = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let relative_path = candidate(key);
            let full_path = self.image_root.join(&relative_path);
            if !full_path.is_file() {
                tried.push(relative_path);
                continue;
            }

            let (width, height) = read_image_dimensions(&full_path)?;
            return Ok(ResolvedImage {
                relative_path,
                height,
                width,
            });
        }

        Err(ConvertError::ImageNotFound {
            sequence_id: key.sequence_id.clone(),
            frame_id: key.frame_id.clone(),
            tried,
        })
    }
}

/// Candidate `<subdir>/<sequence>/<frame>.<ext>`; an empty subdir is omitted.
pub fn frame_in_sequence_dir(subdir: &str, ext: &'static str) -> CandidateFn {
    let prefix = subdir.trim_matches('/').to_string();
    Box::new(move |key: &FrameKey| {
        let file = format!("{}/{}.{}", key.sequence_id, key.frame_id, ext);
        if prefix.is_empty() {
            file
        } else {
            format!("{}/{}", prefix, file)
        }
    })
}

/// Read `(width, height)` from the image header.
fn read_image_dimensions(path: &Path) -> Result<(u32, u32)> {
    let unreadable = |source| ConvertError::ImageUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let size = imagesize::size(path).map_err(unreadable)?;
    let width = u32::try_from(size.width)
        .map_err(|_| unreadable(imagesize::ImageError::CorruptedImage))?;
    let height = u32::try_from(size.height)
        .map_err(|_| unreadable(imagesize::ImageError::CorruptedImage))?;
    if width == 0 || height == 0 {
        return Err(unreadable(imagesize::ImageError::CorruptedImage));
    }
    Ok((width, height))
}
