//! Caption layout: greedy word wrapping and on-frame placement.
//!
//! Widths are estimated from character counts (`0.6 * font_size` per char)
//! instead of real glyph metrics, so no font rendering is needed. Rendered
//! clips depend on these exact numbers; keep the heuristic as is.

use serde::{Deserialize, Serialize};

use super::styles::{Anchor, StyleProfile};

const AVERAGE_GLYPH_WIDTH: f64 = 0.6;
const PADDING_FRACTION: f64 = 0.05;

/// Pixel canvas of one source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    pub const FALLBACK: FrameDimensions = FrameDimensions::new(1920, 1080);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// How the width of a multi-line block is estimated when positioning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockWidth {
    /// Whole block measured as one line, line breaks included.
    /// Matches clips rendered by earlier versions of the sheet.
    #[default]
    Joined,
    /// Width of the longest wrapped line.
    LongestLine,
}

pub struct CaptionRequest<'a> {
    pub text: &'a str,
    pub style: &'a StyleProfile,
    pub frame: FrameDimensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutResult {
    pub lines: Vec<String>,
    pub x: i64,
    pub y: i64,
}

impl LayoutResult {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayout {
    block_width: BlockWidth,
}

impl TextLayout {
    pub fn new(block_width: BlockWidth) -> Self {
        Self { block_width }
    }

    pub fn layout(&self, request: &CaptionRequest<'_>) -> LayoutResult {
        let max_width = max_line_width(request.frame.width);
        let lines = wrap(request.text, request.style.font_size, max_width);
        let (x, y) = position(&lines, request.style, request.frame, self.block_width);
        LayoutResult { lines, x, y }
    }
}

/// JavaScript-style `Math.round`: halves round towards positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn estimate_width(char_count: usize, font_size: u32) -> f64 {
    char_count as f64 * f64::from(font_size) * AVERAGE_GLYPH_WIDTH
}

pub fn padding(frame_width: u32) -> i64 {
    round_half_up(f64::from(frame_width) * PADDING_FRACTION)
}

pub fn max_line_width(frame_width: u32) -> f64 {
    (i64::from(frame_width) - 2 * padding(frame_width)) as f64
}

/// Greedily packs whitespace-separated words into lines no wider than `max_width`.
///
/// A word that is too wide on its own is never split; it gets an overflowing
/// line to itself. Re-wrapping the joined output is not guaranteed to give
/// back the same lines.
pub fn wrap(text: &str, font_size: u32, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate_chars = current.chars().count() + 1 + word.chars().count();
        if estimate_width(candidate_chars, font_size) > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}

fn block_width(lines: &[String], font_size: u32, mode: BlockWidth) -> f64 {
    let chars = match mode {
        BlockWidth::Joined => {
            let text_chars: usize = lines.iter().map(|line| line.chars().count()).sum();
            text_chars + lines.len().saturating_sub(1)
        }
        BlockWidth::LongestLine => lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0),
    };
    estimate_width(chars, font_size)
}

/// Top-left corner of the block. `y` is the top edge; multi-line blocks are not re-centered.
pub fn position(
    lines: &[String],
    style: &StyleProfile,
    frame: FrameDimensions,
    mode: BlockWidth,
) -> (i64, i64) {
    let y = round_half_up(f64::from(frame.height) * style.vertical_fraction);
    let estimated = block_width(lines, style.font_size, mode);
    let frame_width = f64::from(frame.width);
    let pad = padding(frame.width);

    let x = match style.anchor {
        Anchor::Left => pad,
        Anchor::Right => round_half_up(frame_width - estimated - pad as f64),
        Anchor::Center => round_half_up((frame_width - estimated) / 2.0),
    };

    (x, y)
}
