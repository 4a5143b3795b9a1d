use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::config::ClipsConfig;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
}

#[derive(Debug, Error)]
pub enum RowError {
    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },
    #[error("line {line}: {column} must be a non-negative number of seconds, got '{value}'")]
    InvalidTime {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("Video file not found: {}", .0.display())]
    MissingVideo(PathBuf),
    #[error("Audio file not found: {}", .0.display())]
    MissingAudio(PathBuf),
}

/// One sheet row as it appears in the CSV.
#[derive(Debug, Deserialize)]
struct SheetRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Part_1")]
    part_1: String,
    #[serde(rename = "Part_2")]
    part_2: String,
    #[serde(rename = "Audio", default)]
    audio: Option<String>,
    #[serde(rename = "Video", default)]
    video: Option<String>,
    #[serde(rename = "Start_Time", default)]
    start_time: Option<String>,
    #[serde(rename = "End_Time", default)]
    end_time: Option<String>,
    #[serde(rename = "Inject_Time", default)]
    inject_time: Option<String>,
}

/// A sheet row with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: u64,
    pub title: String,
    pub part_1: String,
    pub part_2: String,
    pub audio: String,
    pub video: String,
    pub start_time: f64,
    pub end_time: f64,
    pub inject_time: f64,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn seconds(
    line: u64,
    column: &'static str,
    value: Option<String>,
    default: f64,
) -> Result<f64, RowError> {
    let Some(raw) = present(value) else {
        return Ok(default);
    };
    match raw.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => Ok(parsed),
        _ => Err(RowError::InvalidTime {
            line,
            column,
            value: raw,
        }),
    }
}

impl Row {
    fn from_sheet(line: u64, sheet: SheetRow, config: &ClipsConfig) -> Result<Self, RowError> {
        Ok(Self {
            line,
            start_time: seconds(line, "Start_Time", sheet.start_time, config.default_start_time)?,
            end_time: seconds(line, "End_Time", sheet.end_time, config.default_end_time)?,
            inject_time: seconds(
                line,
                "Inject_Time",
                sheet.inject_time,
                config.default_inject_time,
            )?,
            audio: present(sheet.audio).unwrap_or_else(|| config.default_audio.clone()),
            video: present(sheet.video).unwrap_or_else(|| config.default_video.clone()),
            title: sheet.title,
            part_1: sheet.part_1,
            part_2: sheet.part_2,
        })
    }

    /// `<Title>.mp4` with every whitespace run replaced by `_`.
    pub fn output_file_name(&self) -> String {
        format!("{}.mp4", WHITESPACE_RUN.replace_all(&self.title, "_"))
    }
}

pub fn read_rows(path: &Path, config: &ClipsConfig) -> Result<Vec<Result<Row, RowError>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open sheet {}", path.display()))?;
    parse_rows(file, config).with_context(|| format!("Failed to read sheet {}", path.display()))
}

/// Parses every row; a broken row becomes an `Err` entry instead of failing the sheet.
pub fn parse_rows<R: Read>(reader: R, config: &ClipsConfig) -> Result<Vec<Result<Row, RowError>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().context("Failed to read header row")?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or_default();
                rows.push(Err(RowError::Parse {
                    line,
                    message: err.to_string(),
                }));
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = record
            .deserialize::<SheetRow>(Some(&headers))
            .map_err(|err| RowError::Parse {
                line,
                message: err.to_string(),
            })
            .and_then(|sheet| Row::from_sheet(line, sheet, config));
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sheet: &str) -> Vec<Result<Row, RowError>> {
        parse_rows(sheet.as_bytes(), &ClipsConfig::default()).unwrap()
    }

    #[test]
    fn fills_defaults_for_missing_columns() {
        let rows = parse("Title,Part_1,Part_2\nMorning Rain,First line,Second line\n");
        let row = rows.into_iter().next().unwrap().unwrap();
        assert_eq!(row.title, "Morning Rain");
        assert_eq!(row.audio, "lds.mp3");
        assert_eq!(row.video, "waterfall1.mp4");
        assert_eq!(row.start_time, 0.0);
        assert_eq!(row.end_time, 15.0);
        assert_eq!(row.inject_time, 6.0);
        assert_eq!(row.line, 2);
    }

    #[test]
    fn empty_cells_count_as_missing() {
        let rows = parse(
            "Title, Part_1 ,Part_2,Audio,Video,Start_Time,End_Time,Inject_Time\n\
             A,b,c,,clip.mp4,2,,7.5\n",
        );
        let row = rows.into_iter().next().unwrap().unwrap();
        assert_eq!(row.part_1, "b");
        assert_eq!(row.audio, "lds.mp3");
        assert_eq!(row.video, "clip.mp4");
        assert_eq!(row.start_time, 2.0);
        assert_eq!(row.end_time, 15.0);
        assert_eq!(row.inject_time, 7.5);
    }

    #[test]
    fn bad_time_rejects_only_that_row() {
        let rows = parse(
            "Title,Part_1,Part_2,Start_Time\n\
             One,a,b,soon\n\
             Two,a,b,-1\n\
             Three,a,b,1\n",
        );
        assert_eq!(rows.len(), 3);
        assert!(matches!(
            rows[0],
            Err(RowError::InvalidTime { column: "Start_Time", .. })
        ));
        assert!(matches!(rows[1], Err(RowError::InvalidTime { .. })));
        assert_eq!(rows[2].as_ref().unwrap().title, "Three");
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let rows = parse("Title,Part_1,Part_2\nOnly title\n");
        assert!(matches!(rows[0], Err(RowError::Parse { line: 2, .. })));
    }

    #[test]
    fn output_name_replaces_whitespace_runs() {
        let rows = parse("Title,Part_1,Part_2\n\"My  Great\tTitle\",a,b\n");
        let row = rows.into_iter().next().unwrap().unwrap();
        assert_eq!(row.output_file_name(), "My_Great_Title.mp4");
    }
}
