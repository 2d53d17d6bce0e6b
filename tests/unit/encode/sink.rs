use super::*;

fn cfg(format: AnimationFormat, w: u32, h: u32) -> SinkConfig {
    SinkConfig::new(format, Canvas::new(w, h).unwrap(), "assets/out.gif")
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(cfg(AnimationFormat::Mp4, 11, 10).validate().is_err());
    assert!(cfg(AnimationFormat::Gif, 11, 10).validate().is_ok());
    assert!(
        cfg(AnimationFormat::Gif, 10, 10)
            .with_frame_delay_ms(0)
            .validate()
            .is_err()
    );
    assert!(cfg(AnimationFormat::Mp4, 10, 10).validate().is_ok());
}

#[test]
fn format_parses_and_names_extensions() {
    assert_eq!("GIF".parse::<AnimationFormat>().unwrap(), AnimationFormat::Gif);
    assert_eq!(" mp4 ".parse::<AnimationFormat>().unwrap(), AnimationFormat::Mp4);
    assert!("webm".parse::<AnimationFormat>().is_err());
    assert_eq!(AnimationFormat::Mp4.extension(), "mp4");
    assert_eq!(AnimationFormat::default().to_string(), "gif");
    assert_eq!(
        serde_json::to_string(&AnimationFormat::Mp4).unwrap(),
        "\"mp4\""
    );
}

#[test]
fn frame_checks_reject_wrong_sizes() {
    let c = cfg(AnimationFormat::Gif, 2, 2);
    let good = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(c.check_frame(&good).is_ok());

    let wrong_dims = FrameRGBA {
        width: 3,
        ..good.clone()
    };
    assert!(c.check_frame(&wrong_dims).is_err());

    let short = FrameRGBA {
        data: vec![0; 12],
        ..good
    };
    assert!(c.check_frame(&short).is_err());
}

#[test]
fn existing_output_is_kept_without_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.gif");
    let mut c = cfg(AnimationFormat::Gif, 2, 2);
    c.out_path = path.clone();
    c.overwrite = false;

    c.prepare_output().unwrap();
    assert!(path.parent().unwrap().is_dir());

    std::fs::write(&path, b"x").unwrap();
    let err = c.prepare_output().unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}
