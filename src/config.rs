use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use time::Duration;

use crate::detection::detector::DetectorSettings;
use crate::detection::{ContourLocalizer, LocalizerKind, PlateTextNormalizer};
use crate::error::PipelineError;
use crate::pipeline::{DEFAULT_SAMPLE_EVERY, PipelineSettings};

const DEFAULT_WHITELIST_PATH: &str = "authorized_plates.csv";
const DEFAULT_LOG_PATH: &str = "access_log.csv";
const DEFAULT_COOLDOWN_SECS: u64 = 10;
const DEFAULT_DETECTOR_INPUT_SIZE: u32 = 640;
const DEFAULT_DETECTOR_THRESHOLD: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LocalizerChoice {
    #[default]
    Contour,
    Detector,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    whitelist: Option<PathBuf>,
    log: Option<PathBuf>,
    sample_every: Option<u32>,
    cooldown_secs: Option<u64>,
    ocr_corrections: Option<bool>,
    localizer: Option<LocalizerChoice>,
    snapshot_dir: Option<PathBuf>,
    contour: Option<ContourConfigFile>,
    detector: Option<DetectorConfigFile>,
    ocr: Option<OcrConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ContourConfigFile {
    bilateral_diameter: Option<u32>,
    sigma_color: Option<f32>,
    sigma_space: Option<f32>,
    canny_low: Option<f32>,
    canny_high: Option<f32>,
    max_candidates: Option<usize>,
    min_aspect: Option<f32>,
    max_aspect: Option<f32>,
    min_area: Option<f64>,
    approx_epsilon: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OcrConfigFile {
    models_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence_threshold: f32,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub whitelist_path: PathBuf,
    pub log_path: PathBuf,
    pub sample_every: u32,
    pub cooldown_secs: u64,
    /// Apply the `O→0, I→1, S→5` substitutions during normalization
    pub ocr_corrections: bool,
    pub localizer: LocalizerChoice,
    pub contour: ContourLocalizer,
    pub detector: DetectorConfig,
    /// `None` means the standard `ocrs` cache directory
    pub ocr_models_dir: Option<PathBuf>,
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whitelist_path: PathBuf::from(DEFAULT_WHITELIST_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            sample_every: DEFAULT_SAMPLE_EVERY,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            ocr_corrections: false,
            localizer: LocalizerChoice::Contour,
            contour: ContourLocalizer::default(),
            detector: DetectorConfig {
                model_path: None,
                input_size: DEFAULT_DETECTOR_INPUT_SIZE,
                confidence_threshold: DEFAULT_DETECTOR_THRESHOLD,
            },
            ocr_models_dir: None,
            snapshot_dir: None,
        }
    }
}

impl Config {
    /// Defaults, overlaid with the TOML file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                Self::from_toml_str(&contents)
                    .with_context(|| format!("failed to parse config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        let mut cfg = Self::default();

        if let Some(v) = file.whitelist {
            cfg.whitelist_path = v;
        }
        if let Some(v) = file.log {
            cfg.log_path = v;
        }
        if let Some(v) = file.sample_every {
            cfg.sample_every = v;
        }
        if let Some(v) = file.cooldown_secs {
            cfg.cooldown_secs = v;
        }
        if let Some(v) = file.ocr_corrections {
            cfg.ocr_corrections = v;
        }
        if let Some(v) = file.localizer {
            cfg.localizer = v;
        }
        cfg.snapshot_dir = file.snapshot_dir;

        if let Some(c) = file.contour {
            let loc = &mut cfg.contour;
            let shape = &mut loc.shape;
            loc.bilateral_diameter = c.bilateral_diameter.unwrap_or(loc.bilateral_diameter);
            loc.sigma_color = c.sigma_color.unwrap_or(loc.sigma_color);
            loc.sigma_space = c.sigma_space.unwrap_or(loc.sigma_space);
            loc.canny_low = c.canny_low.unwrap_or(loc.canny_low);
            loc.canny_high = c.canny_high.unwrap_or(loc.canny_high);
            shape.max_candidates = c.max_candidates.unwrap_or(shape.max_candidates);
            shape.min_aspect = c.min_aspect.unwrap_or(shape.min_aspect);
            shape.max_aspect = c.max_aspect.unwrap_or(shape.max_aspect);
            shape.min_area = c.min_area.unwrap_or(shape.min_area);
            shape.approx_epsilon = c.approx_epsilon.unwrap_or(shape.approx_epsilon);
        }
        if let Some(d) = file.detector {
            cfg.detector.model_path = d.model_path;
            cfg.detector.input_size = d.input_size.unwrap_or(cfg.detector.input_size);
            cfg.detector.confidence_threshold = d.confidence_threshold.unwrap_or(cfg.detector.confidence_threshold);
        }
        if let Some(o) = file.ocr {
            cfg.ocr_models_dir = o.models_dir;
        }

        Ok(cfg)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: &str| Err(PipelineError::Config(msg.to_string()));
        if self.sample_every == 0 {
            return invalid("sample_every must be at least 1");
        }
        if self.localizer == LocalizerChoice::Detector && self.detector.model_path.is_none() {
            return invalid("the detector localizer needs a model path");
        }
        if self.detector.input_size == 0 {
            return invalid("detector input_size must be positive");
        }
        let shape = &self.contour.shape;
        if shape.min_aspect > shape.max_aspect {
            return invalid("contour min_aspect is larger than max_aspect");
        }
        if shape.approx_epsilon <= 0.0 {
            return invalid("contour approx_epsilon must be positive");
        }
        Ok(())
    }

    pub fn localizer_kind(&self) -> Result<LocalizerKind, PipelineError> {
        match self.localizer {
            LocalizerChoice::Contour => Ok(LocalizerKind::Contour(self.contour.clone())),
            LocalizerChoice::Detector => {
                let model_path = self
                    .detector
                    .model_path
                    .clone()
                    .ok_or_else(|| PipelineError::Config("the detector localizer needs a model path".to_string()))?;
                Ok(LocalizerKind::Detector(DetectorSettings {
                    model_path,
                    input_size: self.detector.input_size,
                    confidence_threshold: self.detector.confidence_threshold,
                }))
            }
        }
    }

    pub fn normalizer(&self) -> PlateTextNormalizer {
        PlateTextNormalizer::new(self.ocr_corrections)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            sample_every: self.sample_every,
            cooldown: Duration::seconds(self.cooldown_secs.min(i64::MAX as u64) as i64),
            snapshot_dir: self.snapshot_dir.clone(),
        }
    }
}
