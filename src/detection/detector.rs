//! Trained-detector plate localization.
//!
//! The model is a single-class YOLOv8-style export: input `1x3xSxS` RGB in
//! `[0, 1]`, output `1x(4+C)xA` where each of the `A` columns holds
//! `cx, cy, w, h` in input pixels followed by `C` class scores. Frames are
//! stretched to `SxS` (no letterboxing), so boxes scale back independently
//! per axis.
//!
//! Output decoding is plain Rust and always available; running the network
//! needs the `detector-onnx` feature.

use std::path::PathBuf;

use crate::models::BoundingBox;

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub model_path: PathBuf,
    /// Square model input side, in pixels
    pub input_size: u32,
    pub confidence_threshold: f32,
}

/// Highest-scoring box from a raw detector output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
}

/// Decode a `(4 + classes) x anchors` row-major output into the single best
/// detection, in frame coordinates.
///
/// Ties on score keep the earliest anchor. Anchors below `threshold` are
/// ignored, and a box that collapses to nothing once clamped to the frame
/// yields `None`.
pub fn decode_best_box(
    output: &[f32],
    anchors: usize,
    input_size: u32,
    frame_width: u32,
    frame_height: u32,
    threshold: f32,
) -> Option<Detection> {
    if anchors == 0 || output.len() < 5 * anchors || output.len() % anchors != 0 {
        return None;
    }
    let rows = output.len() / anchors;
    let at = |row: usize, anchor: usize| output[row * anchors + anchor];

    let mut best: Option<(usize, f32)> = None;
    for anchor in 0..anchors {
        let score = (4..rows)
            .map(|row| at(row, anchor))
            .fold(f32::NEG_INFINITY, f32::max);
        if !score.is_finite() || score < threshold {
            continue;
        }
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((anchor, score));
        }
    }
    let (anchor, score) = best?;

    let scale_x = frame_width as f32 / input_size as f32;
    let scale_y = frame_height as f32 / input_size as f32;
    let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));

    let x1 = ((cx - w / 2.0) * scale_x).clamp(0.0, frame_width as f32);
    let y1 = ((cy - h / 2.0) * scale_y).clamp(0.0, frame_height as f32);
    let x2 = ((cx + w / 2.0) * scale_x).clamp(0.0, frame_width as f32);
    let y2 = ((cy + h / 2.0) * scale_y).clamp(0.0, frame_height as f32);

    let x = x1.floor() as u32;
    let y = y1.floor() as u32;
    let width = (x2.ceil() as u32).saturating_sub(x);
    let height = (y2.ceil() as u32).saturating_sub(y);

    let bbox = BoundingBox { x, y, width, height }.clamp_to(frame_width, frame_height)?;
    Some(Detection { bbox, score })
}

#[cfg(feature = "detector-onnx")]
pub use onnx::DetectorLocalizer;

#[cfg(feature = "detector-onnx")]
mod onnx {
    use anyhow::{Context, Result, anyhow};
    use tract_onnx::prelude::*;

    use super::{DetectorSettings, decode_best_box};
    use crate::detection::PlateLocalizer;
    use crate::error::PipelineError;
    use crate::models::{Frame, PlateCandidate};

    /// Plate localizer backed by an ONNX object detector.
    pub struct DetectorLocalizer {
        model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
        input_size: u32,
        confidence_threshold: f32,
    }

    impl DetectorLocalizer {
        pub fn load(settings: &DetectorSettings) -> Result<Self> {
            let size = settings.input_size as usize;
            let model = tract_onnx::onnx()
                .model_for_path(&settings.model_path)
                .and_then(|m| m.with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size))))
                .and_then(|m| m.into_optimized())
                .and_then(|m| m.into_runnable())
                .map_err(|e| PipelineError::ModelLoad {
                    path: settings.model_path.clone(),
                    cause: e.to_string(),
                })?;

            Ok(Self {
                model,
                input_size: settings.input_size,
                confidence_threshold: settings.confidence_threshold,
            })
        }

        fn build_input(&self, frame: &Frame) -> Tensor {
            let size = self.input_size;
            let resized = image::imageops::resize(frame, size, size, image::imageops::FilterType::Triangle);
            tract_ndarray::Array4::from_shape_fn(
                (1, 3, size as usize, size as usize),
                |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
            )
            .into_tensor()
        }
    }

    impl PlateLocalizer for DetectorLocalizer {
        fn locate(&mut self, frame: &Frame) -> Result<Option<PlateCandidate>> {
            if frame.width() == 0 || frame.height() == 0 {
                return Ok(None);
            }
            let input = self.build_input(frame);
            let outputs = self.model.run(tvec!(input.into())).context("detector inference failed")?;
            let output = outputs.first().ok_or_else(|| anyhow!("detector produced no outputs"))?;
            let view = output.to_array_view::<f32>().context("detector output was not f32")?;

            let shape = view.shape();
            let anchors = *shape.last().ok_or_else(|| anyhow!("detector output has no dimensions"))?;
            let values: Vec<f32> = view.iter().copied().collect();

            let detection = decode_best_box(
                &values,
                anchors,
                self.input_size,
                frame.width(),
                frame.height(),
                self.confidence_threshold,
            );
            Ok(detection.and_then(|d| PlateCandidate::crop(frame, d.bbox)))
        }

        fn name(&self) -> &str {
            "Object Detector"
        }
    }
}
