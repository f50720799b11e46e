use std::path::PathBuf;

/// Failures that stop the pipeline (or keep it from starting).
///
/// Per-frame problems never surface as a `PipelineError`; they are logged and
/// the frame is skipped.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cannot open frame source {source_name}: {cause}")]
    FrameSourceOpen { source_name: String, cause: String },

    #[error("cannot create decision log at {}", path.display())]
    LogCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot append to decision log at {}", path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot load model from {}: {cause}", path.display())]
    ModelLoad { path: PathBuf, cause: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}
