//! Metadata probe output parsing
//!
//! The tool prints one JSON document describing the media, but may emit
//! warning lines before it. Parsing extracts the first balanced JSON
//! object from the raw output and maps the tool's field names onto
//! [`MediaMetadata`].

use crate::error::{Error, Result};
use crate::types::{FormatInfo, MediaMetadata};
use serde::Deserialize;

/// Metadata document as emitted by the tool (snake_case field names)
#[derive(Debug, Deserialize)]
struct RawMetadata {
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    upload_date: Option<String>,
    thumbnail: Option<String>,
    view_count: Option<u64>,
    like_count: Option<u64>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    quality: Option<serde_json::Value>,
    format_note: Option<String>,
    filesize: Option<u64>,
    resolution: Option<String>,
    fps: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

impl From<RawFormat> for FormatInfo {
    fn from(raw: RawFormat) -> Self {
        FormatInfo {
            format_id: raw.format_id,
            ext: raw.ext,
            quality: raw.quality,
            format_note: raw.format_note,
            filesize: raw.filesize,
            resolution: raw.resolution,
            fps: raw.fps,
            vcodec: raw.vcodec,
            acodec: raw.acodec,
        }
    }
}

/// Extract the first balanced JSON object from mixed tool output.
///
/// Scans for the first `{` and returns the slice up to its matching
/// closing brace, tracking string literals and escapes so braces inside
/// strings don't confuse the balance count.
pub fn extract_json_object(output: &str) -> Result<&str> {
    let start = output
        .find('{')
        .ok_or_else(|| Error::Parse("no JSON object found in tool output".to_string()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in output[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&output[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Err(Error::Parse(
        "unterminated JSON object in tool output".to_string(),
    ))
}

/// Parse probe stdout into the public metadata shape.
pub fn parse_metadata(stdout: &str) -> Result<MediaMetadata> {
    let json = extract_json_object(stdout)?;
    let raw: RawMetadata = serde_json::from_str(json)
        .map_err(|e| Error::Parse(format!("metadata document is not valid JSON: {e}")))?;

    Ok(MediaMetadata {
        title: raw.title,
        description: raw.description,
        duration: raw.duration,
        uploader: raw.uploader,
        upload_date: raw.upload_date,
        thumbnail: raw.thumbnail,
        view_count: raw.view_count,
        like_count: raw.like_count,
        formats: raw.formats.into_iter().map(FormatInfo::from).collect(),
    })
}
