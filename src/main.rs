use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gatewatch::config::LocalizerChoice;
use gatewatch::detection::ocr::{OcrsRecognizer, default_models_dir};
use gatewatch::detection::{PlateReader, build_localizer};
use gatewatch::{AccessDecisionLog, AuthorizedSet, Config, FramePipeline, PipelineError};

#[derive(Parser)]
#[command(name = "gatewatch")]
#[command(about = "Read license plates from video frames and log ALLOW/DENY decisions")]
struct Cli {
    /// Image file or directory of frames
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "GATEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Whitelist CSV (header `plate_number`)
    #[arg(long, value_name = "FILE")]
    whitelist: Option<PathBuf>,

    /// Decision log CSV
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Seconds before the same plate is decided again
    #[arg(long, value_name = "SECS")]
    cooldown: Option<u64>,

    /// Only analyse every Nth frame
    #[arg(long, value_name = "N")]
    sample_every: Option<u32>,

    /// Map O→0, I→1, S→5 when normalizing OCR text
    #[arg(long)]
    ocr_corrections: bool,

    /// Plate localization strategy
    #[arg(long, value_enum)]
    localizer: Option<LocalizerChoice>,

    /// ONNX plate detector model (for `--localizer detector`)
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Directory with the ocrs text-detection/text-recognition models
    #[arg(long, value_name = "DIR")]
    ocr_models: Option<PathBuf>,

    /// Save an annotated frame for every decision
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, cfg: &mut Config) {
        if let Some(v) = self.whitelist {
            cfg.whitelist_path = v;
        }
        if let Some(v) = self.log {
            cfg.log_path = v;
        }
        if let Some(v) = self.cooldown {
            cfg.cooldown_secs = v;
        }
        if let Some(v) = self.sample_every {
            cfg.sample_every = v;
        }
        if self.ocr_corrections {
            cfg.ocr_corrections = true;
        }
        if let Some(v) = self.localizer {
            cfg.localizer = v;
        }
        if let Some(v) = self.model {
            cfg.detector.model_path = Some(v);
        }
        if let Some(v) = self.ocr_models {
            cfg.ocr_models_dir = Some(v);
        }
        if let Some(v) = self.snapshot_dir {
            cfg.snapshot_dir = Some(v);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut cfg = Config::load(args.config.as_deref())?;
    let source_path = args.source.clone();
    args.apply(&mut cfg);
    cfg.validate()?;

    let mut source = gatewatch::source::open_source(&source_path)?;

    let authorized = AuthorizedSet::load(&cfg.whitelist_path);
    let log = AccessDecisionLog::initialize(&cfg.log_path)?;

    let localizer = build_localizer(&cfg.localizer_kind()?)?;
    let models_dir = cfg
        .ocr_models_dir
        .clone()
        .or_else(default_models_dir)
        .ok_or_else(|| PipelineError::Config("cannot locate the OCR model directory; pass --ocr-models".to_string()))?;
    let recognizer = OcrsRecognizer::new(&models_dir).context("failed to initialize OCR engine")?;
    let reader = PlateReader::new(Box::new(recognizer), cfg.normalizer());

    info!(
        "localizer: {}, cooldown: {}s, sampling every {} frames, OCR corrections {}",
        localizer.name(),
        cfg.cooldown_secs,
        cfg.sample_every,
        if cfg.ocr_corrections { "on" } else { "off" }
    );

    let mut pipeline = FramePipeline::new(localizer, reader, authorized, log, cfg.pipeline_settings());

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("failed to install Ctrl-C handler")?;
    }

    let summary = pipeline.run(source.as_mut(), &stop)?;

    println!("\n=== Access Control Summary ===");
    println!("Frames read:     {}", summary.frames_read);
    println!("Frames analysed: {}", summary.frames_sampled);
    println!("Plates read:     {}", summary.plates_read);
    println!("Decisions:       {} ({} allowed, {} denied)", summary.decisions, summary.allowed, summary.denied);
    println!("Log:             {}", cfg.log_path.display());

    Ok(())
}
