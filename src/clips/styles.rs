use std::fmt;
use std::path::{Path, PathBuf};

/// Horizontal alignment rule for a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    Left,
    #[default]
    Center,
    Right,
}

impl Anchor {
    /// Anything other than `left` or `right` centers the block.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Anchor::Left,
            "right" => Anchor::Right,
            _ => Anchor::Center,
        }
    }
}

/// The three overlays drawn on every clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum OverlayRole {
    Title,
    Primary,
    Secondary,
}

impl OverlayRole {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayRole::Title => "title",
            OverlayRole::Primary => "primary",
            OverlayRole::Secondary => "secondary",
        }
    }
}

impl fmt::Display for OverlayRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub color: String,
    pub dx: i32,
    pub dy: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub width: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub enabled: bool,
    pub color: String,
}

/// Visual configuration for one overlay role.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleProfile {
    pub font_file: PathBuf,
    pub font_size: u32,
    pub font_color: String,
    pub shadow: Shadow,
    pub stroke: Stroke,
    pub text_box: TextBox,
    /// Top edge of the block as a fraction of frame height.
    pub vertical_fraction: f64,
    pub anchor: Anchor,
}

impl StyleProfile {
    fn caption(
        font_file: &Path,
        font_size: u32,
        shadow_offset: i32,
        box_color: &str,
        vertical_fraction: f64,
        anchor: Anchor,
    ) -> Self {
        Self {
            font_file: font_file.to_path_buf(),
            font_size,
            font_color: "white".to_string(),
            shadow: Shadow {
                color: "black".to_string(),
                dx: shadow_offset,
                dy: shadow_offset,
            },
            stroke: Stroke {
                width: 1,
                color: "black".to_string(),
            },
            text_box: TextBox {
                enabled: true,
                color: box_color.to_string(),
            },
            vertical_fraction,
            anchor,
        }
    }
}

/// Immutable role -> style table, built once per process and handed to whoever needs it.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    title: StyleProfile,
    primary: StyleProfile,
    secondary: StyleProfile,
}

impl StyleRegistry {
    pub const DEFAULT_FONT_FILE: &'static str = "./KaiseiHarunoUmi-Regular.ttf";

    pub fn new(font_file: &Path) -> Self {
        Self {
            title: StyleProfile::caption(font_file, 56, 2, "black@0.5", 0.1, Anchor::Center),
            primary: StyleProfile::caption(font_file, 48, 1, "black@0.7", 0.4, Anchor::Center),
            secondary: StyleProfile::caption(font_file, 48, 2, "black@0.7", 0.5, Anchor::Left),
        }
    }

    pub fn get(&self, role: OverlayRole) -> &StyleProfile {
        match role {
            OverlayRole::Title => &self.title,
            OverlayRole::Primary => &self.primary,
            OverlayRole::Secondary => &self.secondary,
        }
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new(Path::new(Self::DEFAULT_FONT_FILE))
    }
}
