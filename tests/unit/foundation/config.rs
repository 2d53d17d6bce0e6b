use std::collections::HashMap;

use super::*;

#[test]
fn defaults_match_reference_behavior() {
    let cfg = MemeConfig::default();
    assert_eq!(cfg.canvas, Canvas::default());
    assert_eq!(cfg.text.max_width, 900);
    assert_eq!(cfg.text.max_font_size, 80);
    assert_eq!(cfg.text.min_font_size, 30);
    assert_eq!(cfg.layout.size_step, 2);
    assert_eq!(cfg.layout.medium_len, 50);
    assert_eq!(cfg.layout.long_len, 100);
    assert_eq!(cfg.animation.frame_count, 40);
    assert_eq!(cfg.topics.window_ms(), 24 * 60 * 60 * 1000);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_keeps_defaults_for_missing_fields() {
    let cfg: MemeConfig = serde_json::from_str(
        r##"{ "uppercase": false, "text": { "fill": "#ffff00" }, "animation": { "format": "mp4" } }"##,
    )
    .unwrap();
    assert!(!cfg.uppercase);
    assert_eq!(cfg.text.fill, Rgba8::opaque(255, 255, 0));
    assert_eq!(cfg.text.stroke, Rgba8::BLACK);
    assert_eq!(cfg.animation.format, AnimationFormat::Mp4);
    assert_eq!(cfg.animation.frame_count, 40);
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(serde_json::from_str::<MemeConfig>(r#"{ "colour": "red" }"#).is_err());
}

#[test]
fn from_path_reads_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memeloop.json");
    std::fs::write(&path, r#"{ "out_dir": "out/memes" }"#).unwrap();

    let cfg = MemeConfig::from_path(&path).unwrap();
    assert_eq!(cfg.out_dir, PathBuf::from("out/memes"));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        MemeConfig::from_path(&path),
        Err(MemeError::Serde(_))
    ));
}

#[test]
fn env_overrides_apply_on_top_of_file_values() {
    let env: HashMap<&str, &str> = [
        ("MEMELOOP_FONT_PATH", "/fonts/impact.ttf"),
        ("MEMELOOP_LEDGER_PATH", "/var/lib/memeloop/used.json"),
        ("MEMELOOP_FRAME_COUNT", "12"),
    ]
    .into_iter()
    .collect();

    let mut cfg = MemeConfig::default();
    cfg.apply_env_from(|k| env.get(k).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(cfg.font_path, Some(PathBuf::from("/fonts/impact.ttf")));
    assert_eq!(
        cfg.topics.ledger_path,
        PathBuf::from("/var/lib/memeloop/used.json")
    );
    assert_eq!(cfg.animation.frame_count, 12);
    assert_eq!(cfg.animation.frame_delay_ms, 100);
}

#[test]
fn env_override_with_bad_number_is_a_validation_error() {
    let mut cfg = MemeConfig::default();
    let err = cfg
        .apply_env_from(|k| (k == "MEMELOOP_FRAME_DELAY_MS").then(|| "soon".to_string()))
        .unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}

#[test]
fn validation_catches_bad_values() {
    let mut cfg = MemeConfig::default();
    cfg.text.min_font_size = 90;
    assert!(cfg.validate().is_err());

    let mut cfg = MemeConfig::default();
    cfg.animation.frame_count = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = MemeConfig::default();
    cfg.canvas.width = 1023;
    cfg.validate().unwrap();
    cfg.animation.format = AnimationFormat::Mp4;
    assert!(cfg.validate().is_err());

    let mut cfg = MemeConfig::default();
    cfg.layout.size_step = 0;
    assert!(cfg.validate().is_err());
}
