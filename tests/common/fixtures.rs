#![allow(dead_code)]

use gatewatch::access::{AccessDecisionLog, AuthorizedSet, GateActuator};
use gatewatch::detection::ocr::TextRecognizer;
use gatewatch::detection::{PlateLocalizer, PlateReader, PlateTextNormalizer};
use gatewatch::models::{BoundingBox, Frame, PlateCandidate, PlateReading};
use gatewatch::pipeline::{FramePipeline, PipelineSettings};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use time::OffsetDateTime;
use time::macros::datetime;

/// Fixed reference instant for cooldown arithmetic
pub fn t0() -> OffsetDateTime {
    datetime!(2025-03-01 08:00:00 UTC)
}

pub fn secs(n: i64) -> time::Duration {
    time::Duration::seconds(n)
}

/// Writes a whitelist CSV with the `plate_number` header.
pub fn write_whitelist(dir: &Path, plates: &[&str]) -> PathBuf {
    let path = dir.join("authorized_plates.csv");
    let mut contents = String::from("plate_number\n");
    for plate in plates {
        contents.push_str(plate);
        contents.push('\n');
    }
    std::fs::write(&path, contents).expect("Failed to write whitelist");
    path
}

/// Solid black frame
pub fn blank_frame(width: u32, height: u32) -> Frame {
    RgbImage::from_pixel(width, height, Rgb([0, 0, 0]))
}

/// Black frame with one white filled rectangle at the given place.
pub fn frame_with_rect(width: u32, height: u32, rect: BoundingBox) -> Frame {
    let mut frame = blank_frame(width, height);
    draw_filled_rect_mut(
        &mut frame,
        Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height),
        Rgb([255, 255, 255]),
    );
    frame
}

/// Recognizer that returns the same hypotheses for every image.
pub struct FixedRecognizer(pub Vec<PlateReading>);

impl TextRecognizer for FixedRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> anyhow::Result<Vec<PlateReading>> {
        Ok(self.0.clone())
    }
}

/// Recognizer that returns one scripted hypothesis per call, in order.
pub struct ScriptedRecognizer {
    texts: RefCell<Vec<String>>,
}

impl ScriptedRecognizer {
    pub fn new(texts: &[&str]) -> Self {
        let mut texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        texts.reverse();
        Self { texts: RefCell::new(texts) }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> anyhow::Result<Vec<PlateReading>> {
        Ok(self
            .texts
            .borrow_mut()
            .pop()
            .map(|t| vec![PlateReading::new(t, 0.9)])
            .unwrap_or_default())
    }
}

pub struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> anyhow::Result<Vec<PlateReading>> {
        anyhow::bail!("recognition model exploded")
    }
}

/// Localizer that treats the whole frame as the plate.
pub struct WholeFrameLocalizer;

impl PlateLocalizer for WholeFrameLocalizer {
    fn locate(&mut self, frame: &Frame) -> anyhow::Result<Option<PlateCandidate>> {
        let bbox = BoundingBox { x: 0, y: 0, width: frame.width(), height: frame.height() };
        Ok(PlateCandidate::crop(frame, bbox))
    }

    fn name(&self) -> &str {
        "Whole Frame"
    }
}

pub struct NoPlateLocalizer;

impl PlateLocalizer for NoPlateLocalizer {
    fn locate(&mut self, _frame: &Frame) -> anyhow::Result<Option<PlateCandidate>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "Never Finds"
    }
}

/// Fails on every call, as a broken detector would.
pub struct FailingLocalizer;

impl PlateLocalizer for FailingLocalizer {
    fn locate(&mut self, _frame: &Frame) -> anyhow::Result<Option<PlateCandidate>> {
        anyhow::bail!("inference backend unavailable")
    }

    fn name(&self) -> &str {
        "Failing"
    }
}

/// Actuator that records which callbacks fired.
#[derive(Clone, Default)]
pub struct RecordingActuator {
    pub calls: Rc<RefCell<Vec<&'static str>>>,
}

impl GateActuator for RecordingActuator {
    fn on_allow(&mut self) {
        self.calls.borrow_mut().push("allow");
    }

    fn on_deny(&mut self) {
        self.calls.borrow_mut().push("deny");
    }
}

pub fn settings(sample_every: u32, cooldown_secs: i64) -> PipelineSettings {
    PipelineSettings {
        sample_every,
        cooldown: secs(cooldown_secs),
        snapshot_dir: None,
    }
}

/// Pipeline over a fresh log in `dir`, with the given parts.
pub fn make_pipeline(
    dir: &Path,
    plates: &[&str],
    localizer: Box<dyn PlateLocalizer>,
    recognizer: Box<dyn TextRecognizer>,
    settings: PipelineSettings,
) -> (FramePipeline, PathBuf) {
    let whitelist = write_whitelist(dir, plates);
    let log_path = dir.join("access_log.csv");
    let log = AccessDecisionLog::initialize(&log_path).expect("Failed to initialize log");
    let reader = PlateReader::new(recognizer, PlateTextNormalizer::default());
    let pipeline = FramePipeline::new(localizer, reader, AuthorizedSet::load(&whitelist), log, settings);
    (pipeline, log_path)
}

/// Pipeline for tests that only drive `process_plate`.
pub fn decision_pipeline(dir: &Path, plates: &[&str], cooldown_secs: i64) -> (FramePipeline, PathBuf) {
    make_pipeline(
        dir,
        plates,
        Box::new(NoPlateLocalizer),
        Box::new(FixedRecognizer(Vec::new())),
        settings(1, cooldown_secs),
    )
}
