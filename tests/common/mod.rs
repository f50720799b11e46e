mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from gatewatch for tests
#[allow(unused_imports)]
pub use gatewatch::{
    AccessDecisionLog, AccessStatus, AuthorizedSet, BoundingBox, DecisionRecord, Frame, FrameOutcome,
    FramePipeline, GateActuator, PipelineSettings, PlateCandidate, PlateLocalizer, PlateReader, PlateReading,
    PlateTextNormalizer,
};
