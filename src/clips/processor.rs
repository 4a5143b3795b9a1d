use std::path::PathBuf;

use super::config::{ClipsConfig, ProjectPaths};
use super::ffmpeg::RenderJob;
use super::filters::{DrawText, InjectionWindow};
use super::layout::{CaptionRequest, TextLayout};
use super::logging::log_event;
use super::probe::{DimensionProbe, probe_or_fallback};
use super::rows::{Row, RowError};
use super::styles::{OverlayRole, StyleRegistry};
use crate::ui::prelude::Level;

/// Video and audio paths for a row; the video is checked first.
pub fn resolve_media(paths: &ProjectPaths, row: &Row) -> Result<(PathBuf, PathBuf), RowError> {
    let video = paths.video(&row.video);
    if !video.exists() {
        return Err(RowError::MissingVideo(video));
    }
    let audio = paths.audio(&row.audio);
    if !audio.exists() {
        return Err(RowError::MissingAudio(audio));
    }
    Ok((video, audio))
}

/// Turns a sheet row into a render job. Holds no per-row state.
pub struct RowProcessor<'a> {
    config: &'a ClipsConfig,
    styles: &'a StyleRegistry,
    paths: &'a ProjectPaths,
    probe: &'a dyn DimensionProbe,
    layout: TextLayout,
}

impl<'a> RowProcessor<'a> {
    pub fn new(
        config: &'a ClipsConfig,
        styles: &'a StyleRegistry,
        paths: &'a ProjectPaths,
        probe: &'a dyn DimensionProbe,
    ) -> Self {
        Self {
            config,
            styles,
            paths,
            probe,
            layout: TextLayout::new(config.block_width),
        }
    }

    pub async fn prepare(&self, row: &Row) -> Result<RenderJob, RowError> {
        let (video, audio) = resolve_media(self.paths, row)?;

        let frame = probe_or_fallback(self.probe, &video, self.config.fallback_dimensions()).await;

        let window = InjectionWindow::new(row.inject_time, self.config.injection_window);
        let overlays = [
            (OverlayRole::Title, row.title.as_str(), None),
            (OverlayRole::Primary, row.part_1.as_str(), None),
            (OverlayRole::Secondary, row.part_2.as_str(), Some(window)),
        ];

        let filters = overlays
            .into_iter()
            .map(|(role, text, window)| {
                let style = self.styles.get(role);
                let result = self.layout.layout(&CaptionRequest { text, style, frame });
                log_event(
                    Level::Debug,
                    "clips.layout",
                    format!(
                        "line {}: {role} at ({}, {}) in {} line(s) on {}x{}",
                        row.line,
                        result.x,
                        result.y,
                        result.lines.len(),
                        frame.width,
                        frame.height
                    ),
                );
                DrawText {
                    layout: &result,
                    style,
                    window,
                }
                .to_filter_string()
            })
            .collect();

        Ok(RenderJob {
            video,
            audio,
            output: self.paths.output_dir().join(row.output_file_name()),
            start_time: row.start_time,
            end_time: row.end_time,
            filters,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use async_trait::async_trait;

    use super::*;
    use crate::clips::layout::FrameDimensions;
    use crate::clips::probe::ProbeError;

    struct FixedProbe(FrameDimensions);

    #[async_trait]
    impl DimensionProbe for FixedProbe {
        async fn dimensions(&self, _video: &Path) -> Result<FrameDimensions, ProbeError> {
            Ok(self.0)
        }
    }

    fn row(video: &str, audio: &str) -> Row {
        Row {
            line: 2,
            title: "Hello".to_string(),
            part_1: "First caption".to_string(),
            part_2: "Second caption".to_string(),
            audio: audio.to_string(),
            video: video.to_string(),
            start_time: 1.0,
            end_time: 9.0,
            inject_time: 6.0,
        }
    }

    fn project() -> (tempfile::TempDir, ProjectPaths) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("video")).unwrap();
        fs::create_dir_all(dir.path().join("audio")).unwrap();
        fs::write(dir.path().join("video/clip.mp4"), b"").unwrap();
        fs::write(dir.path().join("audio/track.mp3"), b"").unwrap();
        let paths = ProjectPaths::new(dir.path(), &ClipsConfig::default());
        (dir, paths)
    }

    #[tokio::test]
    async fn builds_three_overlays_with_window_on_secondary() {
        let (dir, paths) = project();
        let config = ClipsConfig::default();
        let styles = config.style_registry();
        let probe = FixedProbe(FrameDimensions::new(1920, 1080));
        let processor = RowProcessor::new(&config, &styles, &paths, &probe);

        let job = processor.prepare(&row("clip.mp4", "track.mp3")).await.unwrap();

        assert_eq!(job.video, dir.path().join("video/clip.mp4"));
        assert_eq!(job.audio, dir.path().join("audio/track.mp3"));
        assert_eq!(job.output, dir.path().join("output/Hello.mp4"));
        assert_eq!(job.start_time, 1.0);
        assert_eq!(job.end_time, 9.0);
        assert_eq!(job.filters.len(), 3);

        // title: 5 chars * 56 * 0.6 = 168 -> (1920 - 168) / 2 = 876, y = 108
        assert!(job.filters[0].contains("text='Hello'"));
        assert!(job.filters[0].contains(":x=876:y=108:"));
        assert!(!job.filters[0].contains("enable="));
        assert!(!job.filters[1].contains("enable="));
        assert!(job.filters[2].contains(":x=96:y=540:"));
        assert!(job.filters[2].ends_with(":enable='between(t,6,11)'"));
    }

    #[tokio::test]
    async fn missing_video_is_reported_before_audio() {
        let (_dir, paths) = project();
        let config = ClipsConfig::default();
        let styles = config.style_registry();
        let probe = FixedProbe(FrameDimensions::FALLBACK);
        let processor = RowProcessor::new(&config, &styles, &paths, &probe);

        let err = processor
            .prepare(&row("absent.mp4", "absent.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, RowError::MissingVideo(_)));
        assert!(err.to_string().starts_with("Video file not found: "));

        let err = processor
            .prepare(&row("clip.mp4", "absent.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, RowError::MissingAudio(_)));
    }

    #[tokio::test]
    async fn portrait_frame_moves_captions() {
        let (_dir, paths) = project();
        let config = ClipsConfig::default();
        let styles = config.style_registry();
        let probe = FixedProbe(FrameDimensions::new(1080, 1920));
        let processor = RowProcessor::new(&config, &styles, &paths, &probe);

        let job = processor.prepare(&row("clip.mp4", "track.mp3")).await.unwrap();
        // padding = 54, title y = 192, secondary y = 960
        assert!(job.filters[0].contains(":y=192:"));
        assert!(job.filters[2].contains(":x=54:y=960:"));
    }
}
