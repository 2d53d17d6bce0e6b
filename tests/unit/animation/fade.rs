use proptest::prelude::*;

use super::*;
use crate::{
    assets::decode::PreparedImage,
    encode::sink::{AnimationFormat, FrameSink},
    foundation::{config::TextConfig, core::Canvas},
    layout::engine::TextMeasure,
    render::surface::FrameRGBA,
};

fn layout() -> Layout {
    Layout {
        font_size: 60,
        lines: vec!["HELLO".into()],
        line_spacing: 70,
        start_y: 920,
    }
}

#[test]
fn forty_frames_fade_in_and_out() {
    let layout = layout();
    let frames: Vec<Frame> = render_frames(&layout, 40).collect();
    assert_eq!(frames.len(), 40);
    assert!(frames.iter().enumerate().all(|(i, f)| f.index == i as u32));
    assert!(frames[0].opacity.abs() < 1e-6);
    assert!((frames[20].opacity - 1.0).abs() < 1e-6);
    assert!((frames[39].opacity - frames[0].opacity).abs() < 0.1);
    assert!((frames[10].opacity - frames[30].opacity).abs() < 1e-6);
}

#[test]
fn sequence_is_exact_sized_and_fused() {
    let layout = layout();
    let mut frames = render_frames(&layout, 3);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames.layout().font_size, 60);
    frames.next();
    assert_eq!(frames.len(), 2);
    frames.by_ref().for_each(drop);
    assert_eq!(frames.next(), None);
    assert_eq!(frames.next(), None);
    assert_eq!(render_frames(&layout, 0).count(), 0);
}

proptest! {
    #[test]
    fn opacity_stays_in_unit_range(n in 1u32..500, i in 0u32..500) {
        let o = fade_opacity(i % n, n);
        prop_assert!((0.0..=1.0).contains(&o));
    }

    #[test]
    fn cycle_starts_and_ends_below_its_peak(n in 4u32..500) {
        let mid = fade_opacity(n / 2, n);
        prop_assert!(fade_opacity(0, n) < mid);
        prop_assert!(fade_opacity(n - 1, n) < mid);
    }
}

#[derive(Default)]
struct FakeSurface {
    text_draws: usize,
    base_draws: usize,
    opacities: Vec<f32>,
}

impl TextMeasure for FakeSurface {
    fn measure_width(&mut self, text: &str, font_size: u32) -> MemeResult<f32> {
        Ok(text.len() as f32 * font_size as f32 * 0.5)
    }
}

impl CaptionSurface for FakeSurface {
    fn canvas(&self) -> Canvas {
        Canvas::new(2, 2).unwrap()
    }

    fn draw_image(&mut self, _image: &PreparedImage) -> MemeResult<()> {
        self.base_draws += 1;
        Ok(())
    }

    fn draw_stroked_text(&mut self, _: &str, _: f32, _: f32, _: u32, _: &TextStyle) -> MemeResult<()> {
        self.text_draws += 1;
        Ok(())
    }

    fn draw_filled_text(&mut self, _: &str, _: f32, _: f32, _: u32, _: &TextStyle) -> MemeResult<()> {
        self.text_draws += 1;
        Ok(())
    }

    fn clear_text(&mut self) {}

    fn compose(&mut self, opacity: f32) -> MemeResult<FrameRGBA> {
        self.opacities.push(opacity);
        Ok(FrameRGBA {
            width: 2,
            height: 2,
            data: vec![0; 16],
            premultiplied: true,
        })
    }
}

struct CountingSink {
    frames: std::rc::Rc<std::cell::Cell<u32>>,
    fail_at: Option<u32>,
}

impl FrameSink for CountingSink {
    fn encode_frame(&mut self, _frame: &FrameRGBA) -> MemeResult<()> {
        if Some(self.frames.get()) == self.fail_at {
            return Err(MemeError::validation("disk full"));
        }
        self.frames.set(self.frames.get() + 1);
        Ok(())
    }

    fn finish(self: Box<Self>) -> MemeResult<()> {
        Ok(())
    }
}

struct Factory {
    frames: std::rc::Rc<std::cell::Cell<u32>>,
    fail_open: bool,
    fail_at: Option<u32>,
}

impl Factory {
    fn new() -> Self {
        Self {
            frames: Default::default(),
            fail_open: false,
            fail_at: None,
        }
    }
}

impl SinkFactory for Factory {
    fn open(&mut self, _cfg: &SinkConfig) -> MemeResult<Box<dyn FrameSink>> {
        if self.fail_open {
            return Err(MemeError::validation("cannot open"));
        }
        Ok(Box::new(CountingSink {
            frames: self.frames.clone(),
            fail_at: self.fail_at,
        }))
    }
}

fn sink_cfg() -> SinkConfig {
    SinkConfig::new(AnimationFormat::Gif, Canvas::new(2, 2).unwrap(), "out.gif")
}

#[test]
fn animate_draws_text_once_and_composites_every_frame() {
    let mut surface = FakeSurface::default();
    let mut factory = Factory::new();
    let style = TextStyle::from(&TextConfig::default());

    let summary = animate(&mut surface, &layout(), &style, 40, &mut factory, &sink_cfg()).unwrap();

    assert_eq!(summary.frames, 40);
    assert_eq!(factory.frames.get(), 40);
    assert_eq!(surface.text_draws, 2);
    assert_eq!(surface.base_draws, 0);
    assert_eq!(surface.opacities.len(), 40);
    assert!((surface.opacities[20] - 1.0).abs() < 1e-6);
}

#[test]
fn sink_failures_surface_as_encoding_errors() {
    let style = TextStyle::from(&TextConfig::default());

    let mut factory = Factory::new();
    factory.fail_open = true;
    let err = animate(&mut FakeSurface::default(), &layout(), &style, 4, &mut factory, &sink_cfg())
        .unwrap_err();
    assert!(matches!(err, MemeError::Encoding(_)), "{err}");

    let mut factory = Factory::new();
    factory.fail_at = Some(2);
    let err = animate(&mut FakeSurface::default(), &layout(), &style, 4, &mut factory, &sink_cfg())
        .unwrap_err();
    assert!(matches!(err, MemeError::Encoding(_)), "{err}");
    assert!(err.to_string().contains("frame 2"));
}

#[test]
fn zero_frames_is_rejected() {
    let style = TextStyle::from(&TextConfig::default());
    let err = animate(
        &mut FakeSurface::default(),
        &layout(),
        &style,
        0,
        &mut Factory::new(),
        &sink_cfg(),
    )
    .unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}
