use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

use super::styles::OverlayRole;

pub const DEFAULT_SHEET: &str = "data.csv";

#[derive(Subcommand, Debug, Clone)]
pub enum ClipsCommands {
    /// Render one captioned clip per sheet row
    Render(RenderArgs),
    /// Validate a sheet and its media without rendering
    Check(CheckArgs),
    /// Show where a caption would be wrapped and placed
    Layout(LayoutArgs),
}

/// Where the sheet and the media directories live
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// CSV sheet with Title, Part_1, Part_2 and optional media/timing columns; defaults to <root>/data.csv
    #[arg(value_hint = ValueHint::FilePath)]
    pub sheet: Option<PathBuf>,

    /// Project root containing the video/, audio/ and output/ directories
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub root: PathBuf,

    /// Config file; defaults to <root>/bulkclip.toml, then the user config directory
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

impl ProjectArgs {
    pub fn sheet_path(&self) -> PathBuf {
        self.sheet
            .clone()
            .unwrap_or_else(|| self.root.join(DEFAULT_SHEET))
    }
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Show the ffmpeg command for each row without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Show raw ffmpeg output instead of a progress bar
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Caption text to lay out
    pub text: String,

    /// Overlay role whose style is used
    #[arg(long, value_enum, default_value_t = OverlayRole::Title)]
    pub role: OverlayRole,

    /// Override the role's anchor (left, center, right)
    #[arg(long)]
    pub anchor: Option<String>,

    /// Frame width in pixels; defaults to the configured fallback width
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// Frame height in pixels; defaults to the configured fallback height
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    /// Project root used to find bulkclip.toml
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub root: PathBuf,

    /// Config file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}
