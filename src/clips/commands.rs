use std::sync::Arc;

use anyhow::{Result, bail};
use serde_json::json;

use super::batch::{BatchDriver, BatchOptions};
use super::cli::{CheckArgs, ClipsCommands, LayoutArgs, RenderArgs};
use super::config::{ClipsConfig, ProjectPaths};
use super::ffmpeg::{FfmpegRunner, SystemFfmpegRunner};
use super::filters::InjectionWindow;
use super::layout::{CaptionRequest, FrameDimensions, TextLayout};
use super::logging::{log_event, log_event_with};
use super::probe::FfprobeDimensions;
use super::processor::{RowProcessor, resolve_media};
use super::rows::read_rows;
use super::styles::Anchor;
use crate::ui::prelude::{Level, OutputFormat, get_output_format};

pub async fn handle_clips_command(command: ClipsCommands) -> Result<()> {
    match command {
        ClipsCommands::Render(args) => handle_render(args).await,
        ClipsCommands::Check(args) => handle_check(args),
        ClipsCommands::Layout(args) => handle_layout(args),
    }
}

async fn handle_render(args: RenderArgs) -> Result<()> {
    let project = &args.project;
    let config = ClipsConfig::load(project.config.as_deref(), &project.root)?;
    let styles = config.style_registry();
    let paths = ProjectPaths::new(&project.root, &config);
    let sheet = project.sheet_path();

    if !args.dry_run && which::which("ffmpeg").is_err() {
        log_event(
            Level::Warn,
            "clips.render.ffmpeg",
            "ffmpeg was not found in PATH; rows will fail to render",
        );
    }

    let probe = FfprobeDimensions;
    let processor = RowProcessor::new(&config, &styles, &paths, &probe);
    let runner: Arc<dyn FfmpegRunner> = Arc::new(SystemFfmpegRunner::new(args.verbose));
    let options = BatchOptions {
        dry_run: args.dry_run,
        show_progress: !args.dry_run
            && !args.verbose
            && get_output_format() == OutputFormat::Text,
    };

    log_event(
        Level::Info,
        "clips.render.start",
        format!("Rendering clips from {}", sheet.display()),
    );
    BatchDriver::new(&config, &paths, processor, runner, options)
        .run(&sheet)
        .await?;
    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<()> {
    let project = &args.project;
    let config = ClipsConfig::load(project.config.as_deref(), &project.root)?;
    let paths = ProjectPaths::new(&project.root, &config);
    let sheet = project.sheet_path();
    let mut problems = 0usize;

    for tool in ["ffmpeg", "ffprobe"] {
        match which::which(tool) {
            Ok(path) => log_event(
                Level::Success,
                "clips.check.tool",
                format!("{tool}: {}", path.display()),
            ),
            Err(_) => {
                problems += 1;
                log_event(
                    Level::Warn,
                    "clips.check.tool",
                    format!("{tool} was not found in PATH"),
                );
            }
        }
    }

    for row in read_rows(&sheet, &config)? {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                problems += 1;
                log_event(Level::Error, "clips.check.row", format!("Invalid row: {err}"));
                continue;
            }
        };

        let window = InjectionWindow::new(row.inject_time, config.injection_window);
        let shown = window.contains(row.start_time)
            || (row.start_time..=row.end_time).contains(&window.start);
        if !shown {
            log_event(
                Level::Warn,
                "clips.check.window",
                format!(
                    "line {}: secondary caption ({}s-{}s) is outside the clip ({}s-{}s)",
                    row.line, window.start, window.end, row.start_time, row.end_time
                ),
            );
        }

        match resolve_media(&paths, &row) {
            Ok(_) => log_event(
                Level::Info,
                "clips.check.row",
                format!("line {}: ok -> {}", row.line, row.output_file_name()),
            ),
            Err(err) => {
                problems += 1;
                log_event(
                    Level::Warn,
                    "clips.check.row",
                    format!("line {}: {err}", row.line),
                );
            }
        }
    }

    if problems > 0 {
        bail!("{problems} problem(s) found in {}", sheet.display());
    }

    log_event(
        Level::Success,
        "clips.check.done",
        format!("{} is ready to render", sheet.display()),
    );
    Ok(())
}

fn handle_layout(args: LayoutArgs) -> Result<()> {
    let config = ClipsConfig::load(args.config.as_deref(), &args.root)?;
    let styles = config.style_registry();
    let fallback = config.fallback_dimensions();
    let frame = FrameDimensions::new(
        args.width.unwrap_or(fallback.width),
        args.height.unwrap_or(fallback.height),
    );

    let mut style = styles.get(args.role).clone();
    if let Some(anchor) = &args.anchor {
        style.anchor = Anchor::parse_lenient(anchor);
    }

    let result = TextLayout::new(config.block_width).layout(&CaptionRequest {
        text: &args.text,
        style: &style,
        frame,
    });

    let mut message = format!(
        "{} on {}x{}: x={} y={}",
        args.role, frame.width, frame.height, result.x, result.y
    );
    for line in &result.lines {
        message.push_str(&format!("\n  | {line}"));
    }

    log_event_with(
        Level::Info,
        "clips.layout",
        message,
        json!({
            "role": args.role.as_str(),
            "width": frame.width,
            "height": frame.height,
            "x": result.x,
            "y": result.y,
            "lines": result.lines,
        }),
    );
    Ok(())
}
