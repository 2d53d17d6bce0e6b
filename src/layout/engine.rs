use crate::foundation::{
    core::TextPosition,
    error::{MemeError, MemeResult},
};

/// Width measurement supplied by a rendering surface.
pub trait TextMeasure {
    /// Pixel width of `text` rendered on a single line at `font_size`.
    fn measure_width(&mut self, text: &str, font_size: u32) -> MemeResult<f32>;
}

/// Fixed-advance estimate: every char is `advance_ratio * font_size` wide.
///
/// Used when no font is configured (layout previews) and as a deterministic measurer in tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    pub advance_ratio: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance_ratio: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure_width(&mut self, text: &str, font_size: u32) -> MemeResult<f32> {
        Ok(text.chars().count() as f32 * font_size as f32 * self.advance_ratio)
    }
}

/// Numeric knobs of the sizing/placement heuristics.
///
/// The values have no derivation beyond matching the established look; they are kept
/// configurable rather than meaningful.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutTuning {
    /// Decrement of the font-size search.
    pub size_step: u32,
    /// Captions longer than this many chars get `medium_size`.
    pub medium_len: usize,
    /// Captions longer than this many chars get `long_size`.
    pub long_len: usize,
    pub medium_size: u32,
    pub long_size: u32,
    /// Distance of the top/bottom anchor from the canvas edge.
    pub anchor_margin: u32,
    /// Added to the font size to get the line spacing.
    pub line_gap: u32,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            size_step: 2,
            medium_len: 50,
            long_len: 100,
            medium_size: 60,
            long_size: 40,
            anchor_margin: 80,
            line_gap: 10,
        }
    }
}

impl LayoutTuning {
    pub fn validate(&self) -> MemeResult<()> {
        if self.size_step == 0 {
            return Err(MemeError::validation("layout size_step must be >= 1"));
        }
        if self.medium_len >= self.long_len {
            return Err(MemeError::validation(
                "layout medium_len must be < long_len",
            ));
        }
        if self.medium_size == 0 || self.long_size == 0 {
            return Err(MemeError::validation("layout hint sizes must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LayoutRequest<'a> {
    pub text: &'a str,
    pub max_width: u32,
    pub max_font_size: u32,
    pub min_font_size: u32,
    pub canvas_height: u32,
    pub position: TextPosition,
}

/// Resolved caption placement for one canvas.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Layout {
    pub font_size: u32,
    pub lines: Vec<String>,
    pub line_spacing: u32,
    /// Baseline of the first line.
    pub start_y: i32,
}

impl Layout {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Baseline of line `index`.
    pub fn line_y(&self, index: usize) -> i32 {
        self.start_y + (index as i32) * self.line_spacing as i32
    }

    pub fn positioned_lines(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| (line.as_str(), self.line_y(i)))
    }
}

/// Which pass decided the font size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSource {
    LengthHint,
    Search,
}

/// Length hint for long captions, clamped into `[min_font_size, max_font_size]`.
pub fn length_hint(
    text: &str,
    max_font_size: u32,
    min_font_size: u32,
    tuning: &LayoutTuning,
) -> Option<u32> {
    let len = text.chars().count();
    let hint = if len > tuning.long_len {
        tuning.long_size
    } else if len > tuning.medium_len {
        tuning.medium_size
    } else {
        return None;
    };
    Some(hint.clamp(min_font_size, max_font_size))
}

/// Bounded search from `max_font_size` down to `min_font_size`.
///
/// Probes the whole unwrapped string; falls back to `min_font_size` when nothing fits.
pub fn search_font_size(
    measure: &mut dyn TextMeasure,
    text: &str,
    max_width: u32,
    max_font_size: u32,
    min_font_size: u32,
    step: u32,
) -> MemeResult<u32> {
    let step = step.max(1);
    let mut size = max_font_size.max(min_font_size);
    loop {
        if measure.measure_width(text, size)? <= max_width as f32 {
            return Ok(size);
        }
        if size <= min_font_size {
            return Ok(min_font_size);
        }
        size = size.saturating_sub(step).max(min_font_size);
    }
}

/// The hint pass runs first; the search only runs when no hint applies.
pub fn resolve_font_size(
    measure: &mut dyn TextMeasure,
    req: &LayoutRequest<'_>,
    tuning: &LayoutTuning,
) -> MemeResult<(u32, SizeSource)> {
    if let Some(size) = length_hint(req.text, req.max_font_size, req.min_font_size, tuning) {
        return Ok((size, SizeSource::LengthHint));
    }
    let size = search_font_size(
        measure,
        req.text,
        req.max_width,
        req.max_font_size,
        req.min_font_size,
        tuning.size_step,
    )?;
    Ok((size, SizeSource::Search))
}

/// Greedy word wrap. Words are never split; an over-long word gets a line of its own.
pub fn wrap_words(
    measure: &mut dyn TextMeasure,
    text: &str,
    max_width: u32,
    font_size: u32,
) -> MemeResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure.measure_width(&candidate, font_size)? > max_width as f32 {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        } else {
            line = candidate;
        }
    }
    lines.push(line.trim_end().to_string());

    Ok(lines)
}

fn anchor_y(position: TextPosition, canvas_height: u32, margin: u32) -> i64 {
    match position {
        TextPosition::Top => i64::from(margin),
        TextPosition::Center => i64::from(canvas_height / 2),
        TextPosition::Bottom => i64::from(canvas_height) - i64::from(margin),
    }
}

/// Fit `req.text` into the box described by `req`.
///
/// Only a failing measurement is an error; oversized text degrades visually.
pub fn compute_layout(
    measure: &mut dyn TextMeasure,
    req: &LayoutRequest<'_>,
    tuning: &LayoutTuning,
) -> MemeResult<Layout> {
    let (font_size, source) = resolve_font_size(measure, req, tuning)?;
    let lines = wrap_words(measure, req.text, req.max_width, font_size)?;

    let line_spacing = font_size + tuning.line_gap;
    let shift = (lines.len() as i64 - 1) * i64::from(line_spacing) / 2;
    let start_y = anchor_y(req.position, req.canvas_height, tuning.anchor_margin) - shift;

    tracing::debug!(
        font_size,
        ?source,
        lines = lines.len(),
        start_y,
        "caption layout resolved"
    );

    Ok(Layout {
        font_size,
        lines,
        line_spacing,
        start_y: start_y as i32,
    })
}

/// Strip one pair of surrounding double quotes and trim, as language models tend to quote
/// their one-liners.
pub fn clean_caption(raw: &str) -> String {
    let s = raw.trim();
    let s = s.strip_prefix('"').unwrap_or(s);
    let s = s.strip_suffix('"').unwrap_or(s);
    s.trim().to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/layout/engine.rs"]
mod tests;
