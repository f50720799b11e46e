pub mod access;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod source;

pub use access::{AccessDecisionLog, AuthorizedSet, GateActuator};
pub use config::Config;
pub use detection::{PlateLocalizer, PlateReader, PlateTextNormalizer};
pub use error::PipelineError;
pub use models::{AccessStatus, BoundingBox, DecisionRecord, Frame, PlateCandidate, PlateReading};
pub use pipeline::{CooldownTable, FrameOutcome, FramePipeline, PipelineSettings, RunSummary};
pub use source::FrameSource;
