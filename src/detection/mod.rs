pub mod annotate;
pub mod contours;
pub mod detector;
pub mod normalize;
pub mod ocr;
pub mod preprocessing;
pub mod reader;

use anyhow::Result;
use log::debug;

use crate::models::{Frame, PlateCandidate};
use contours::PlateShapeFilter;
use detector::DetectorSettings;

pub use normalize::PlateTextNormalizer;
pub use reader::PlateReader;

/// Finds at most one plate region in a frame.
///
/// "No plate" is `Ok(None)`. An `Err` is reserved for genuine failures
/// (inference errors and the like); the pipeline treats it as a skipped frame.
pub trait PlateLocalizer {
    fn locate(&mut self, frame: &Frame) -> Result<Option<PlateCandidate>>;

    /// Human-readable name (used in diagnostics)
    fn name(&self) -> &str;
}

/// Classical localizer: smoothing, Canny edges, contours, rectangle filter.
#[derive(Debug, Clone)]
pub struct ContourLocalizer {
    pub bilateral_diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub shape: PlateShapeFilter,
}

impl Default for ContourLocalizer {
    fn default() -> Self {
        Self {
            bilateral_diameter: 11,
            sigma_color: 17.0,
            sigma_space: 17.0,
            canny_low: 30.0,
            canny_high: 200.0,
            shape: PlateShapeFilter::default(),
        }
    }
}

impl PlateLocalizer for ContourLocalizer {
    fn locate(&mut self, frame: &Frame) -> Result<Option<PlateCandidate>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(None);
        }

        let gray = preprocessing::to_grayscale(frame);
        let smoothed = preprocessing::bilateral_filter(&gray, self.bilateral_diameter, self.sigma_color, self.sigma_space);
        let edges = preprocessing::detect_edges(&smoothed, self.canny_low, self.canny_high);
        let all_contours = contours::find_all_contours(&edges);

        let Some(bbox) = self.shape.select(&all_contours) else {
            debug!("no plate-shaped contour among {} contours", all_contours.len());
            return Ok(None);
        };

        debug!("plate contour at ({}, {}) {}x{}", bbox.x, bbox.y, bbox.width, bbox.height);
        Ok(PlateCandidate::crop(frame, bbox))
    }

    fn name(&self) -> &str {
        "Contour Heuristic"
    }
}

/// Which localization strategy to build
#[derive(Debug, Clone)]
pub enum LocalizerKind {
    Contour(ContourLocalizer),
    Detector(DetectorSettings),
}

/// Build the configured localizer.
pub fn build_localizer(kind: &LocalizerKind) -> Result<Box<dyn PlateLocalizer>> {
    match kind {
        LocalizerKind::Contour(localizer) => Ok(Box::new(localizer.clone())),
        #[cfg(feature = "detector-onnx")]
        LocalizerKind::Detector(settings) => Ok(Box::new(detector::DetectorLocalizer::load(settings)?)),
        #[cfg(not(feature = "detector-onnx"))]
        LocalizerKind::Detector(_) => Err(crate::error::PipelineError::Config(
            "the detector localizer requires building with the `detector-onnx` feature".to_string(),
        )
        .into()),
    }
}
