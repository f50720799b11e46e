use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use time::{Duration, OffsetDateTime};
use time::macros::format_description;

use crate::access::{AccessDecisionLog, AuthorizedSet, GateActuator, LoggingActuator};
use crate::detection::annotate::annotate;
use crate::detection::{PlateLocalizer, PlateReader};
use crate::error::PipelineError;
use crate::models::{AccessStatus, DecisionRecord, Frame, PlateCandidate};
use crate::source::FrameSource;

pub const DEFAULT_SAMPLE_EVERY: u32 = 10;
pub const DEFAULT_COOLDOWN: Duration = Duration::seconds(10);

/// Current wall-clock time, local offset when it can be determined.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Only every Nth frame goes through localization and OCR
    pub sample_every: u32,
    /// How long a decided plate is ignored before it can be decided again
    pub cooldown: Duration,
    /// Save an annotated frame for every decision
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sample_every: DEFAULT_SAMPLE_EVERY,
            cooldown: DEFAULT_COOLDOWN,
            snapshot_dir: None,
        }
    }
}

/// Last decision time per plate.
///
/// A plate is "cooling" while `now - last <= window`; after that it is
/// treated as unseen again. Entries are never removed, only superseded.
#[derive(Debug, Clone)]
pub struct CooldownTable {
    window: Duration,
    last_seen: HashMap<String, OffsetDateTime>,
}

impl CooldownTable {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    pub fn is_cooling(&self, plate: &str, now: OffsetDateTime) -> bool {
        self.last_seen
            .get(plate)
            .is_some_and(|last| now - *last <= self.window)
    }

    pub fn mark(&mut self, plate: &str, now: OffsetDateTime) {
        self.last_seen.insert(plate.to_string(), now);
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

/// What happened to one frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Between sampling points; passed through untouched
    NotSampled,
    NoPlate,
    /// A plate region was found but no usable text came out of it
    Unreadable,
    /// Localization or OCR failed for this frame
    Skipped,
    /// Plate already decided within the cooldown window
    Cooling { plate: String },
    Decided(DecisionRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_sampled: u64,
    pub plates_read: u64,
    pub decisions: u64,
    pub allowed: u64,
    pub denied: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &FrameOutcome) {
        self.frames_read += 1;
        if *outcome != FrameOutcome::NotSampled {
            self.frames_sampled += 1;
        }
        match outcome {
            FrameOutcome::Cooling { .. } => self.plates_read += 1,
            FrameOutcome::Decided(record) => {
                self.plates_read += 1;
                self.decisions += 1;
                match record.status {
                    AccessStatus::Allow => self.allowed += 1,
                    AccessStatus::Deny => self.denied += 1,
                }
            }
            _ => {}
        }
    }
}

/// Frame-to-decision pipeline.
///
/// Owns all of its state (whitelist, cooldown table, log handle), so several
/// pipelines can run side by side without interfering.
pub struct FramePipeline {
    localizer: Box<dyn PlateLocalizer>,
    reader: PlateReader,
    authorized: AuthorizedSet,
    log: AccessDecisionLog,
    actuator: Box<dyn GateActuator>,
    cooldown: CooldownTable,
    settings: PipelineSettings,
    frame_count: u64,
}

impl FramePipeline {
    pub fn new(
        localizer: Box<dyn PlateLocalizer>,
        reader: PlateReader,
        authorized: AuthorizedSet,
        log: AccessDecisionLog,
        settings: PipelineSettings,
    ) -> Self {
        let sample_every = settings.sample_every.max(1);
        Self {
            localizer,
            reader,
            authorized,
            log,
            actuator: Box::new(LoggingActuator),
            cooldown: CooldownTable::new(settings.cooldown),
            settings: PipelineSettings { sample_every, ..settings },
            frame_count: 0,
        }
    }

    /// Replace the default (logging-only) actuator
    pub fn with_actuator(mut self, actuator: Box<dyn GateActuator>) -> Self {
        self.actuator = actuator;
        self
    }

    pub fn authorized(&self) -> &AuthorizedSet {
        &self.authorized
    }

    pub fn cooldown(&self) -> &CooldownTable {
        &self.cooldown
    }

    /// Process one frame from the source.
    ///
    /// Only a decision-log failure is returned as an error; everything that
    /// goes wrong in localization or OCR just skips the frame.
    pub fn process_frame(&mut self, frame: &Frame, now: OffsetDateTime) -> Result<FrameOutcome, PipelineError> {
        self.frame_count += 1;
        if self.frame_count % self.settings.sample_every as u64 != 0 {
            return Ok(FrameOutcome::NotSampled);
        }

        let candidate = match self.localizer.locate(frame) {
            Ok(Some(candidate)) => candidate,
            Ok(None) => return Ok(FrameOutcome::NoPlate),
            Err(e) => {
                debug!("frame {}: {} failed: {:#}", self.frame_count, self.localizer.name(), e);
                return Ok(FrameOutcome::Skipped);
            }
        };

        let plate = match self.reader.read(&candidate) {
            Ok(Some(plate)) => plate,
            Ok(None) => {
                debug!("frame {}: plate region found but no readable text", self.frame_count);
                return Ok(FrameOutcome::Unreadable);
            }
            Err(e) => {
                debug!("frame {}: OCR failed: {:#}", self.frame_count, e);
                return Ok(FrameOutcome::Skipped);
            }
        };

        match self.process_plate(&plate, now)? {
            Some(record) => {
                self.save_snapshot(frame, &candidate, &record);
                Ok(FrameOutcome::Decided(record))
            }
            None => Ok(FrameOutcome::Cooling { plate }),
        }
    }

    /// Decide, act on and log a normalized plate.
    ///
    /// Returns `None` without side effects when the plate was already decided
    /// within the cooldown window (or is empty).
    pub fn process_plate(&mut self, plate: &str, now: OffsetDateTime) -> Result<Option<DecisionRecord>, PipelineError> {
        if plate.is_empty() {
            return Ok(None);
        }
        if self.cooldown.is_cooling(plate, now) {
            debug!("{} seen within the last {}s, skipping", plate, self.cooldown.window().whole_seconds());
            return Ok(None);
        }

        let status = if self.authorized.is_authorized(plate) {
            AccessStatus::Allow
        } else {
            AccessStatus::Deny
        };
        info!("plate {} -> {}", plate, status);

        match status {
            AccessStatus::Allow => self.actuator.on_allow(),
            AccessStatus::Deny => self.actuator.on_deny(),
        }

        let record = DecisionRecord {
            timestamp: now,
            plate: plate.to_string(),
            status,
        };
        self.log.append(&record)?;
        self.cooldown.mark(plate, now);

        Ok(Some(record))
    }

    /// Pull frames from `source` until end-of-stream, a read failure, or
    /// `stop` is set.
    ///
    /// A single-frame source switches sampling off for the rest of the run.
    pub fn run(&mut self, source: &mut dyn FrameSource, stop: &AtomicBool) -> Result<RunSummary, PipelineError> {
        info!("reading frames from {}", source.describe());
        if source.single_frame() && self.settings.sample_every > 1 {
            info!("single-frame source, analysing it regardless of sample_every = {}", self.settings.sample_every);
            self.settings.sample_every = 1;
        }
        let mut summary = RunSummary::default();

        loop {
            if stop.load(Ordering::Relaxed) {
                info!("stop requested");
                break;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("end of stream");
                    break;
                }
                Err(e) => {
                    warn!("frame read failed, stopping: {:#}", e);
                    break;
                }
            };

            let outcome = self.process_frame(&frame, now())?;
            summary.record(&outcome);
        }

        Ok(summary)
    }

    fn save_snapshot(&self, frame: &Frame, candidate: &PlateCandidate, record: &DecisionRecord) {
        let Some(dir) = &self.settings.snapshot_dir else {
            return;
        };

        let format = format_description!("[year][month][day]_[hour][minute][second]");
        let stamp = record.timestamp.format(format).unwrap_or_default();
        let path = dir.join(format!("{}_{}_{}.png", stamp, record.plate, record.status));

        let annotated = annotate(frame, &candidate.bbox, record.status);
        let result = std::fs::create_dir_all(dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| annotated.save(&path).map_err(anyhow::Error::from));
        if let Err(e) = result {
            warn!("failed to save snapshot {}: {:#}", path.display(), e);
        }
    }
}
