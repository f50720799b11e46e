//! Tests for configuration defaults, TOML layering and validation.

use gatewatch::Config;
use gatewatch::config::LocalizerChoice;
use gatewatch::detection::LocalizerKind;
use std::path::PathBuf;

#[test]
fn test_defaults() -> anyhow::Result<()> {
    let cfg = Config::load(None)?;
    assert_eq!(cfg.whitelist_path, PathBuf::from("authorized_plates.csv"));
    assert_eq!(cfg.log_path, PathBuf::from("access_log.csv"));
    assert_eq!(cfg.sample_every, 10);
    assert_eq!(cfg.cooldown_secs, 10);
    assert!(!cfg.ocr_corrections);
    assert_eq!(cfg.localizer, LocalizerChoice::Contour);
    assert_eq!(cfg.contour.shape.max_candidates, 10);
    assert_eq!(cfg.contour.canny_low, 30.0);
    assert_eq!(cfg.contour.canny_high, 200.0);

    let settings = cfg.pipeline_settings();
    assert_eq!(settings.cooldown, time::Duration::seconds(10));
    assert!(cfg.validate().is_ok());

    Ok(())
}

#[test]
fn test_toml_overrides_only_given_fields() -> anyhow::Result<()> {
    let cfg = Config::from_toml_str(
        r#"
        whitelist = "/etc/gate/plates.csv"
        cooldown_secs = 5
        ocr_corrections = true

        [contour]
        min_area = 800.0

        [ocr]
        models_dir = "/opt/ocrs"
        "#,
    )?;

    assert_eq!(cfg.whitelist_path, PathBuf::from("/etc/gate/plates.csv"));
    assert_eq!(cfg.log_path, PathBuf::from("access_log.csv"));
    assert_eq!(cfg.cooldown_secs, 5);
    assert!(cfg.ocr_corrections);
    assert!(cfg.normalizer().ocr_corrections);
    assert_eq!(cfg.contour.shape.min_area, 800.0);
    assert_eq!(cfg.contour.shape.min_aspect, 2.0);
    assert_eq!(cfg.ocr_models_dir, Some(PathBuf::from("/opt/ocrs")));

    Ok(())
}

#[test]
fn test_config_file_on_disk() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("gatewatch.toml");
    std::fs::write(&path, "sample_every = 4\nlog = \"decisions.csv\"\n")?;

    let cfg = Config::load(Some(path.as_path()))?;
    assert_eq!(cfg.sample_every, 4);
    assert_eq!(cfg.log_path, PathBuf::from("decisions.csv"));

    assert!(Config::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    Ok(())
}

#[test]
fn test_rejects_unknown_keys_and_bad_values() {
    assert!(Config::from_toml_str("colldown_secs = 3").is_err());
    assert!(Config::from_toml_str("localizer = \"neural\"").is_err());

    let zero_sampling = Config::from_toml_str("sample_every = 0").expect("parses");
    assert!(zero_sampling.validate().is_err());
}

#[test]
fn test_detector_requires_model_path() -> anyhow::Result<()> {
    let cfg = Config::from_toml_str("localizer = \"detector\"")?;
    assert!(cfg.validate().is_err());
    assert!(cfg.localizer_kind().is_err());

    let cfg = Config::from_toml_str(
        r#"
        localizer = "detector"

        [detector]
        model_path = "plates.onnx"
        confidence_threshold = 0.5
        "#,
    )?;
    assert!(cfg.validate().is_ok());
    match cfg.localizer_kind()? {
        LocalizerKind::Detector(settings) => {
            assert_eq!(settings.model_path, PathBuf::from("plates.onnx"));
            assert_eq!(settings.input_size, 640);
            assert_eq!(settings.confidence_threshold, 0.5);
        }
        other => panic!("expected detector settings, got {:?}", other),
    }

    Ok(())
}

#[cfg(not(feature = "detector-onnx"))]
#[test]
fn test_detector_unavailable_without_feature() {
    let kind = LocalizerKind::Detector(gatewatch::detection::detector::DetectorSettings {
        model_path: PathBuf::from("plates.onnx"),
        input_size: 640,
        confidence_threshold: 0.25,
    });
    let err = gatewatch::detection::build_localizer(&kind).err().expect("detector needs the feature");
    assert!(err.to_string().contains("detector-onnx"));
}
