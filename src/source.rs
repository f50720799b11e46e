//! Frame sources.
//!
//! A source yields frames until it signals end-of-stream with `Ok(None)`.
//! An `Err` from `next_frame` is a failure of the source itself; the pipeline
//! stops on it just as it does at end-of-stream. A source that can tell a
//! single bad frame apart skips it instead. Failing to *open* a source is
//! fatal and reported as `PipelineError::FrameSourceOpen`.

use anyhow::{Context, Result};
use image::ImageReader;
use log::warn;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::models::Frame;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Short description for diagnostics
    fn describe(&self) -> String;

    /// True when the source yields exactly one frame, so sampling must not
    /// skip it
    fn single_frame(&self) -> bool {
        false
    }
}

/// Open `path` as a frame source: a directory of frames or a single image.
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>, PipelineError> {
    if path.is_dir() {
        Ok(Box::new(ImageSequenceSource::open(path)?))
    } else {
        Ok(Box::new(SingleImageSource::open(path)?))
    }
}

fn load_frame(path: &Path) -> Result<Frame> {
    let img = ImageReader::open(path)
        .with_context(|| format!("failed to open frame {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode frame {}", path.display()))?;
    Ok(img.to_rgb8())
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Still images from a directory, played back in file-name order.
#[derive(Debug)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self, PipelineError> {
        let open_err = |cause: String| PipelineError::FrameSourceOpen {
            source_name: dir.display().to_string(),
            cause,
        };

        let entries = std::fs::read_dir(dir).map_err(|e| open_err(e.to_string()))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image_file(p))
            .collect();
        if files.is_empty() {
            return Err(open_err("directory contains no image frames".to_string()));
        }
        files.sort();

        Ok(Self {
            dir: dir.to_path_buf(),
            files: files.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        while let Some(path) = self.files.pop_front() {
            let reader = ImageReader::open(&path)
                .with_context(|| format!("failed to open frame {}", path.display()))?;
            match reader.decode() {
                Ok(img) => return Ok(Some(img.to_rgb8())),
                Err(e) => warn!("skipping undecodable frame {}: {}", path.display(), e),
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        format!("image sequence {}", self.dir.display())
    }
}

/// A single image file, yielded once.
#[derive(Debug)]
pub struct SingleImageSource {
    path: PathBuf,
    frame: Option<Frame>,
}

impl SingleImageSource {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let frame = load_frame(path).map_err(|e| PipelineError::FrameSourceOpen {
            source_name: path.display().to_string(),
            cause: format!("{:#}", e),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            frame: Some(frame),
        })
    }
}

impl FrameSource for SingleImageSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frame.take())
    }

    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }

    fn single_frame(&self) -> bool {
        true
    }
}

/// Frames held in memory
#[derive(Debug, Default)]
pub struct VecFrameSource {
    frames: VecDeque<Frame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames: frames.into() }
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn describe(&self) -> String {
        format!("{} in-memory frames", self.frames.len())
    }
}
