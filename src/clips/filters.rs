use std::path::Path;

use super::layout::LayoutResult;
use super::styles::StyleProfile;

/// Time range (seconds, inclusive) during which an overlay is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjectionWindow {
    pub start: f64,
    pub end: f64,
}

impl InjectionWindow {
    pub fn new(inject_time: f64, duration: f64) -> Self {
        Self {
            start: inject_time,
            end: inject_time + duration,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// ffmpeg `between()` is inclusive at both ends, same as [`Self::contains`].
    pub fn enable_expression(&self) -> String {
        format!("between(t,{},{})", self.start, self.end)
    }
}

// Values sit inside single quotes at filtergraph level, so only the
// option-level separators and quotes need escaping. Quotes close the
// quoted run, emit an escaped quote and reopen.
fn escape_quoted_value(raw: &str) -> String {
    raw.replace('\\', r"\\")
        .replace(':', r"\:")
        .replace('\'', r"'\\\''")
}

// drawtext expands `%{...}` and consumes one more level of backslashes.
fn escape_drawtext_text(raw: &str) -> String {
    raw.replace('\\', r"\\\\")
        .replace('%', r"\\%")
        .replace(':', r"\:")
        .replace('\'', r"'\\\''")
}

fn font_path(path: &Path) -> String {
    escape_quoted_value(&path.to_string_lossy())
}

/// One `drawtext` overlay: laid-out text plus the style it is drawn with.
pub struct DrawText<'a> {
    pub layout: &'a LayoutResult,
    pub style: &'a StyleProfile,
    pub window: Option<InjectionWindow>,
}

impl DrawText<'_> {
    pub fn to_filter_string(&self) -> String {
        let style = self.style;
        let mut filter = format!(
            "drawtext=fontfile='{font}':text='{text}':fontsize={size}:fontcolor={color}:x={x}:y={y}\
             :shadowcolor={shadow}:shadowx={sx}:shadowy={sy}\
             :borderw={stroke}:bordercolor={stroke_color}\
             :box={boxed}:boxcolor={box_color}",
            font = font_path(&style.font_file),
            text = escape_drawtext_text(&self.layout.text()),
            size = style.font_size,
            color = style.font_color,
            x = self.layout.x,
            y = self.layout.y,
            shadow = style.shadow.color,
            sx = style.shadow.dx,
            sy = style.shadow.dy,
            stroke = style.stroke.width,
            stroke_color = style.stroke.color,
            boxed = u8::from(style.text_box.enabled),
            box_color = style.text_box.color,
        );

        if let Some(window) = &self.window {
            filter.push_str(&format!(":enable='{}'", window.enable_expression()));
        }

        filter
    }
}
