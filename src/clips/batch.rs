use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use super::config::{ClipsConfig, ProjectPaths};
use super::ffmpeg::{FfmpegRunner, RenderJob};
use super::logging::{log_event, log_event_with};
use super::processor::RowProcessor;
use super::rows::{Row, RowError, read_rows};
use crate::ui::prelude::Level;

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Rendered(PathBuf),
    /// Dry run: the job was built and printed but not executed.
    Planned(RenderJob),
    Skipped { line: u64, reason: String },
    Failed { output: PathBuf, error: String },
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<RowOutcome>,
}

impl BatchSummary {
    fn count(&self, predicate: impl Fn(&RowOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|&o| predicate(o)).count()
    }

    pub fn rendered(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Rendered(_)))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Planned(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed { .. }))
    }

    fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                RowOutcome::Rendered(output) => {
                    json!({ "status": "rendered", "output": output })
                }
                RowOutcome::Planned(job) => {
                    json!({ "status": "planned", "output": job.output, "args": job.compile() })
                }
                RowOutcome::Skipped { line, reason } => {
                    json!({ "status": "skipped", "line": line, "reason": reason })
                }
                RowOutcome::Failed { output, error } => {
                    json!({ "status": "failed", "output": output, "error": error })
                }
            })
            .collect();

        json!({
            "rendered": self.rendered(),
            "planned": self.planned(),
            "skipped": self.skipped(),
            "failed": self.failed(),
            "rows": rows,
        })
    }
}

pub struct BatchOptions {
    pub dry_run: bool,
    pub show_progress: bool,
}

pub struct BatchDriver<'a> {
    config: &'a ClipsConfig,
    paths: &'a ProjectPaths,
    processor: RowProcessor<'a>,
    runner: Arc<dyn FfmpegRunner>,
    options: BatchOptions,
}

impl<'a> BatchDriver<'a> {
    pub fn new(
        config: &'a ClipsConfig,
        paths: &'a ProjectPaths,
        processor: RowProcessor<'a>,
        runner: Arc<dyn FfmpegRunner>,
        options: BatchOptions,
    ) -> Self {
        Self {
            config,
            paths,
            processor,
            runner,
            options,
        }
    }

    pub async fn run(&self, sheet: &Path) -> Result<BatchSummary> {
        self.paths.ensure_output_dir()?;
        let rows = read_rows(sheet, self.config)?;
        log_event(
            Level::Debug,
            "clips.batch.rows",
            format!("Read {} row(s) from {}", rows.len(), sheet.display()),
        );
        Ok(self.run_rows(rows).await)
    }

    /// Prepares rows one after another and hands each job to ffmpeg without
    /// waiting for earlier jobs. Returns once every submitted job has finished.
    pub async fn run_rows(&self, rows: Vec<Result<Row, RowError>>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut pending = FuturesUnordered::new();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    log_event(Level::Error, "clips.row.invalid", format!("Skipping row: {err}"));
                    summary.outcomes.push(RowOutcome::Skipped {
                        line: row_line(&err),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let job = match self.processor.prepare(&row).await {
                Ok(job) => job,
                Err(err) => {
                    log_event(Level::Warn, "clips.row.missing", err.to_string());
                    summary.outcomes.push(RowOutcome::Skipped {
                        line: row.line,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if self.options.dry_run {
                log_event(Level::Info, "clips.row.plan", job.display_command());
                summary.outcomes.push(RowOutcome::Planned(job));
                continue;
            }

            let output = job.output.clone();
            let handle = submit(Arc::clone(&self.runner), job);
            pending.push(async move { (output, handle.await) });
        }

        let progress = self.progress_bar(pending.len());

        while let Some((output, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(Ok(())) => {
                    progress.suspend(|| {
                        log_event(
                            Level::Success,
                            "clips.row.processed",
                            format!("Processed: {}", output.display()),
                        )
                    });
                    RowOutcome::Rendered(output)
                }
                Ok(Err(err)) => {
                    let error = format!("{err:#}");
                    progress.suspend(|| {
                        log_event(
                            Level::Error,
                            "clips.row.failed",
                            format!("Error processing {}: {error}", output.display()),
                        )
                    });
                    RowOutcome::Failed { output, error }
                }
                Err(join_err) => {
                    let error = join_err.to_string();
                    progress.suspend(|| {
                        log_event(
                            Level::Error,
                            "clips.row.failed",
                            format!("Error processing {}: {error}", output.display()),
                        )
                    });
                    RowOutcome::Failed { output, error }
                }
            };
            progress.inc(1);
            summary.outcomes.push(outcome);
        }
        progress.finish_and_clear();

        log_event_with(
            Level::Info,
            "clips.batch.summary",
            format!(
                "{} rendered, {} planned, {} skipped, {} failed",
                summary.rendered(),
                summary.planned(),
                summary.skipped(),
                summary.failed()
            ),
            summary.to_json(),
        );

        summary
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress || len == 0 {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} clips")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

fn submit(runner: Arc<dyn FfmpegRunner>, job: RenderJob) -> tokio::task::JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let args = job.compile();
        runner.run(&args).await
    })
}

fn row_line(err: &RowError) -> u64 {
    match err {
        RowError::Parse { line, .. } | RowError::InvalidTime { line, .. } => *line,
        RowError::MissingVideo(_) | RowError::MissingAudio(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::clips::layout::FrameDimensions;
    use crate::clips::probe::{DimensionProbe, ProbeError};

    struct NoProbe;

    #[async_trait]
    impl DimensionProbe for NoProbe {
        async fn dimensions(&self, video: &Path) -> Result<FrameDimensions, ProbeError> {
            Err(ProbeError::Malformed {
                path: video.to_path_buf(),
                output: String::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<Vec<String>>>,
        fail_when_output_contains: Option<&'static str>,
    }

    #[async_trait]
    impl FfmpegRunner for RecordingRunner {
        async fn run(&self, args: &[String]) -> Result<()> {
            self.calls.lock().unwrap().push(args.to_vec());
            if let Some(marker) = self.fail_when_output_contains
                && args.last().is_some_and(|out| out.contains(marker))
            {
                anyhow::bail!("ffmpeg exited with status Some(1): boom");
            }
            Ok(())
        }
    }

    impl RecordingRunner {
        fn outputs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter_map(|args| args.last().cloned())
                .collect()
        }
    }

    fn project(sheet: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("video")).unwrap();
        fs::create_dir_all(dir.path().join("audio")).unwrap();
        fs::write(dir.path().join("video/waterfall1.mp4"), b"").unwrap();
        fs::write(dir.path().join("audio/lds.mp3"), b"").unwrap();
        fs::write(dir.path().join("data.csv"), sheet).unwrap();
        dir
    }

    async fn run_batch(
        dir: &Path,
        runner: Arc<RecordingRunner>,
        dry_run: bool,
    ) -> BatchSummary {
        let config = ClipsConfig::default();
        let styles = config.style_registry();
        let paths = ProjectPaths::new(dir, &config);
        let processor = RowProcessor::new(&config, &styles, &paths, &NoProbe);
        let driver = BatchDriver::new(
            &config,
            &paths,
            processor,
            runner,
            BatchOptions {
                dry_run,
                show_progress: false,
            },
        );
        driver.run(&dir.join("data.csv")).await.unwrap()
    }

    #[tokio::test]
    async fn missing_video_skips_row_and_batch_continues() {
        let dir = project(
            "Title,Part_1,Part_2,Video\n\
             First One,a,b,gone.mp4\n\
             Second One,c,d,\n",
        );
        let runner = Arc::new(RecordingRunner::default());

        let summary = run_batch(dir.path(), Arc::clone(&runner), false).await;

        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.rendered(), 1);
        let outputs = runner.outputs();
        assert_eq!(outputs.len(), 1);
        assert!(outputs[0].ends_with("Second_One.mp4"));
        assert!(dir.path().join("output").is_dir());
    }

    #[tokio::test]
    async fn transcoder_failure_does_not_abort_batch() {
        let dir = project(
            "Title,Part_1,Part_2\n\
             Bad Clip,a,b\n\
             Good Clip,c,d\n\
             Other Clip,e,f\n",
        );
        let runner = Arc::new(RecordingRunner {
            fail_when_output_contains: Some("Bad_Clip"),
            ..Default::default()
        });

        let summary = run_batch(dir.path(), Arc::clone(&runner), false).await;

        assert_eq!(runner.outputs().len(), 3);
        assert_eq!(summary.rendered(), 2);
        assert_eq!(summary.failed(), 1);
        let failed = summary
            .outcomes
            .iter()
            .find_map(|o| match o {
                RowOutcome::Failed { output, error } => Some((output.clone(), error.clone())),
                _ => None,
            })
            .unwrap();
        assert!(failed.0.ends_with("Bad_Clip.mp4"));
        assert!(failed.1.contains("boom"));
    }

    #[tokio::test]
    async fn dry_run_never_invokes_runner() {
        let dir = project("Title,Part_1,Part_2\nPlan Me,a,b\n");
        let runner = Arc::new(RecordingRunner::default());

        let summary = run_batch(dir.path(), Arc::clone(&runner), true).await;

        assert!(runner.outputs().is_empty());
        assert_eq!(summary.planned(), 1);
        let RowOutcome::Planned(job) = &summary.outcomes[0] else {
            panic!("expected a planned job");
        };
        assert!(job.output.ends_with("Plan_Me.mp4"));
    }

    #[tokio::test]
    async fn probe_failure_falls_back_and_still_renders() {
        let dir = project("Title,Part_1,Part_2,Inject_Time\nHello,x,y,6\n");
        let runner = Arc::new(RecordingRunner::default());

        let summary = run_batch(dir.path(), Arc::clone(&runner), false).await;

        assert_eq!(summary.rendered(), 1);
        let calls = runner.calls.lock().unwrap();
        let vf_idx = calls[0].iter().position(|a| a == "-vf").unwrap();
        let vf = &calls[0][vf_idx + 1];
        // 1920x1080 fallback: title centered at (1920 - 168) / 2
        assert!(vf.contains("text='Hello':fontsize=56:fontcolor=white:x=876:y=108"));
        assert!(vf.contains("enable='between(t,6,11)'"));
    }

    #[tokio::test]
    async fn invalid_rows_are_skipped() {
        let dir = project(
            "Title,Part_1,Part_2,End_Time\n\
             Broken,a,b,later\n\
             Fine,a,b,12\n",
        );
        let runner = Arc::new(RecordingRunner::default());

        let summary = run_batch(dir.path(), Arc::clone(&runner), false).await;

        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.rendered(), 1);
        assert!(matches!(
            summary.outcomes[0],
            RowOutcome::Skipped { line: 2, .. }
        ));
        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].windows(2).any(|w| w[0] == "-to" && w[1] == "12"));
    }
}
