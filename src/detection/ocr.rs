use anyhow::{Result, anyhow};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::models::PlateReading;

/// Anything that turns an image into zero or more text hypotheses.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<PlateReading>>;
}

/// Standard model cache location used by `ocrs-cli`
pub fn default_models_dir() -> Option<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()?;
    Some(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with the detection and recognition models in `models_dir`
pub fn init_ocr_engine(models_dir: &Path) -> Result<OcrEngine> {
    let detection_model_path = models_dir.join("text-detection.rten");
    let recognition_model_path = models_dir.join("text-recognition.rten");

    for path in [&detection_model_path, &recognition_model_path] {
        if !path.exists() {
            return Err(PipelineError::ModelLoad {
                path: path.clone(),
                cause: "OCR model not found (run `ocrs-cli` once or download the models manually)".to_string(),
            }
            .into());
        }
    }

    let load = |path: &Path| {
        Model::load_file(path).map_err(|e| PipelineError::ModelLoad {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
    };
    let detection_model = load(detection_model_path.as_path())?;
    let recognition_model = load(recognition_model_path.as_path())?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    Ok(engine)
}

/// `TextRecognizer` backed by the `ocrs` engine.
///
/// `ocrs` reports no per-line score, so each recognized line is scored by the
/// share of its visible characters that are ASCII letters or digits. A clean
/// plate line scores 1.0; a line of stray punctuation or noise scores low.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    pub fn new(models_dir: &Path) -> Result<Self> {
        Ok(Self {
            engine: init_ocr_engine(models_dir)?,
        })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<PlateReading>> {
        let img = image.to_rgb8();
        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| anyhow!("invalid OCR input: {:?}", e))?;
        let ocr_input = self.engine.prepare_input(img_source)?;

        let word_rects = self.engine.detect_words(&ocr_input)?;
        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);
        let lines = self.engine.recognize_text(&ocr_input, &line_rects)?;

        Ok(lines
            .into_iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string().trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    let confidence = line_confidence(&text);
                    Some(PlateReading::new(text, confidence))
                }
            })
            .collect())
    }
}

fn line_confidence(text: &str) -> f32 {
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    if visible == 0 {
        return 0.0;
    }
    let alnum = text.chars().filter(|c| c.is_ascii_alphanumeric()).count();
    alnum as f32 / visible as f32
}
