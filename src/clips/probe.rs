use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command as TokioCommand;

use super::layout::FrameDimensions;
use super::logging::log_event;
use crate::ui::prelude::Level;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run ffprobe for {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ffprobe exited with status {code:?} while probing {}: {stderr}", .path.display())]
    Status {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("unexpected ffprobe output '{output}' for {}", .path.display())]
    Malformed { path: PathBuf, output: String },
}

#[async_trait]
pub trait DimensionProbe: Send + Sync {
    async fn dimensions(&self, video: &Path) -> Result<FrameDimensions, ProbeError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeDimensions;

#[async_trait]
impl DimensionProbe for FfprobeDimensions {
    async fn dimensions(&self, video: &Path) -> Result<FrameDimensions, ProbeError> {
        let output = TokioCommand::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=p=0",
            ])
            .arg(video)
            .output()
            .await
            .map_err(|source| ProbeError::Spawn {
                path: video.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Status {
                path: video.to_path_buf(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_dimensions(&stdout).ok_or_else(|| ProbeError::Malformed {
            path: video.to_path_buf(),
            output: stdout.trim().to_string(),
        })
    }
}

/// Parses `W,H` as printed by `-of csv=p=0`. Both values must be positive.
fn parse_dimensions(output: &str) -> Option<FrameDimensions> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let mut parts = line.split(',').map(str::trim);
    let width: u32 = parts.next()?.parse().ok()?;
    let height: u32 = parts.next()?.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(FrameDimensions::new(width, height))
}

/// Never fails: any probe error is logged and replaced by `fallback`.
pub async fn probe_or_fallback(
    probe: &dyn DimensionProbe,
    video: &Path,
    fallback: FrameDimensions,
) -> FrameDimensions {
    match probe.dimensions(video).await {
        Ok(dimensions) => dimensions,
        Err(err) => {
            log_event(
                Level::Warn,
                "clips.probe.fallback",
                format!(
                    "Error getting video dimensions: {err}; using {}x{}",
                    fallback.width, fallback.height
                ),
            );
            fallback
        }
    }
}
