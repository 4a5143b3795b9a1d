use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;

#[async_trait]
pub trait FfmpegRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<()>;
}

/// Everything ffmpeg needs to render one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub start_time: f64,
    pub end_time: f64,
    pub filters: Vec<String>,
}

impl RenderJob {
    /// Trim, take video from the first input and audio from the second,
    /// stop at the shorter stream and draw every overlay in order.
    pub fn compile(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            self.video.to_string_lossy().into_owned(),
            "-i".to_string(),
            self.audio.to_string_lossy().into_owned(),
            "-ss".to_string(),
            self.start_time.to_string(),
            "-to".to_string(),
            self.end_time.to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-shortest".to_string(),
        ];

        if !self.filters.is_empty() {
            args.push("-vf".to_string());
            args.push(self.filters.join(","));
        }

        args.push(self.output.to_string_lossy().into_owned());
        args
    }

    /// The command as it could be pasted into a POSIX shell.
    pub fn display_command(&self) -> String {
        let args: Vec<String> = self.compile().iter().map(|arg| shell_quote(arg)).collect();
        format!("ffmpeg {}", args.join(" "))
    }
}

/// Single-quotes anything outside a small safe set, so `$`, backslashes and
/// backticks reach ffmpeg untouched.
fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    if arg
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ','))
    {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFfmpegRunner {
    verbose: bool,
}

impl SystemFfmpegRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl FfmpegRunner for SystemFfmpegRunner {
    async fn run(&self, args: &[String]) -> Result<()> {
        let mut child = TokioCommand::new("ffmpeg")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg")?;

        let stderr = child
            .stderr
            .take()
            .context("Failed to capture ffmpeg stderr")?;

        let mut last_line = String::new();
        let mut error_lines: Vec<String> = Vec::new();
        let result =
            read_ffmpeg_stderr(stderr, self.verbose, &mut last_line, &mut error_lines).await;

        let status = child.wait().await.context("Failed to wait for ffmpeg")?;
        result?;

        if !status.success() {
            let error_msg = if !error_lines.is_empty() {
                error_lines.join("\n")
            } else {
                last_line
            };
            bail!(
                "ffmpeg exited with status {:?}: {}",
                status.code(),
                error_msg.trim()
            );
        }

        Ok(())
    }
}

async fn read_ffmpeg_stderr<R: AsyncRead + Unpin>(
    mut stderr: R,
    verbose: bool,
    last_line: &mut String,
    error_lines: &mut Vec<String>,
) -> Result<()> {
    let mut buffer = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let bytes_read = stderr
            .read(&mut buffer)
            .await
            .context("Failed to read ffmpeg stderr")?;
        if bytes_read == 0 {
            break;
        }

        pending.extend_from_slice(&buffer[..bytes_read]);

        // Decode whole lines only; a read can end inside a multi-byte character.
        while let Some(pos) = pending.iter().position(|&b| b == b'\r' || b == b'\n') {
            let line = String::from_utf8_lossy(&pending[..pos]).into_owned();
            pending.drain(..=pos);
            record_line(line, verbose, last_line, error_lines);
        }
    }

    if !pending.is_empty() {
        let line = String::from_utf8_lossy(&pending).into_owned();
        record_line(line, verbose, last_line, error_lines);
    }

    Ok(())
}

fn record_line(line: String, verbose: bool, last_line: &mut String, error_lines: &mut Vec<String>) {
    if line.is_empty() {
        return;
    }

    if verbose {
        eprintln!("{}", line);
    }

    if line.to_ascii_lowercase().contains("error") {
        error_lines.push(line.clone());
    }

    *last_line = line;
}
