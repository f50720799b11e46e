use anyhow::Result;
use image::DynamicImage;

use crate::detection::normalize::PlateTextNormalizer;
use crate::detection::ocr::TextRecognizer;
use crate::models::{PlateCandidate, PlateReading};

/// Candidates shorter than this are upscaled before OCR
pub const DEFAULT_MIN_OCR_HEIGHT: u32 = 64;

/// Runs OCR over a plate candidate and returns the normalized plate text.
pub struct PlateReader {
    recognizer: Box<dyn TextRecognizer>,
    normalizer: PlateTextNormalizer,
    min_height: u32,
}

impl PlateReader {
    pub fn new(recognizer: Box<dyn TextRecognizer>, normalizer: PlateTextNormalizer) -> Self {
        Self {
            recognizer,
            normalizer,
            min_height: DEFAULT_MIN_OCR_HEIGHT,
        }
    }

    pub fn with_min_height(mut self, min_height: u32) -> Self {
        self.min_height = min_height;
        self
    }

    pub fn normalizer(&self) -> &PlateTextNormalizer {
        &self.normalizer
    }

    /// `Ok(None)` means nothing usable was read: an empty candidate, no OCR
    /// hypotheses, or a best hypothesis that normalizes to nothing.
    pub fn read(&self, candidate: &PlateCandidate) -> Result<Option<String>> {
        if candidate.is_empty() {
            return Ok(None);
        }

        let prepared = prepare_for_ocr(candidate, self.min_height);
        let readings = self.recognizer.recognize(&prepared)?;

        let Some(best) = best_reading(&readings) else {
            return Ok(None);
        };

        let plate = self.normalizer.normalize(&best.raw_text);
        if plate.is_empty() {
            Ok(None)
        } else {
            Ok(Some(plate))
        }
    }
}

/// The maximum-confidence hypothesis; the earliest one wins a tie.
pub fn best_reading(readings: &[PlateReading]) -> Option<&PlateReading> {
    readings
        .iter()
        .reduce(|best, r| if r.confidence > best.confidence { r } else { best })
}

/// Grayscale and, if the crop is short, upscale while keeping aspect ratio
pub fn prepare_for_ocr(candidate: &PlateCandidate, min_height: u32) -> DynamicImage {
    let gray = image::imageops::grayscale(&candidate.image);
    let (width, height) = gray.dimensions();

    if height >= min_height {
        return DynamicImage::ImageLuma8(gray);
    }

    let scale = min_height as f32 / height as f32;
    let scaled_w = ((width as f32 * scale).round() as u32).max(1);
    let scaled = image::imageops::resize(&gray, scaled_w, min_height, image::imageops::FilterType::CatmullRom);
    DynamicImage::ImageLuma8(scaled)
}
