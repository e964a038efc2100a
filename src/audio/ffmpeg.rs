//! ffmpeg/ffprobe helpers.

use crate::error::{Result, SigmaError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Extracts the audio track of a media file into an MP3 at `dest`.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn extract_audio(source: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting audio to {:?}", dest);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SigmaError::ToolFailed(format!("ffmpeg audio extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SigmaError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SigmaError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Splits an audio file into pieces of roughly `chunk_seconds`.
///
/// Returns `(piece_path, offset_seconds)` in timeline order. Audio no longer
/// than one piece is returned as-is with offset zero.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let windows = plan_windows(total_duration, chunk_seconds as f64);
    if windows.len() <= 1 {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut pieces = Vec::with_capacity(windows.len());
    for (idx, (offset, length)) in windows.into_iter().enumerate() {
        let piece_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        extract_segment(source, &piece_path, offset, length).await?;

        debug!("Created piece {} at offset {:.1}s", idx, offset);
        pieces.push((piece_path, offset));
    }

    info!("Created {} audio pieces", pieces.len());
    Ok(pieces)
}

/// `(offset, length)` windows covering `total` seconds.
fn plan_windows(total: f64, chunk_len: f64) -> Vec<(f64, f64)> {
    if chunk_len <= 0.0 || total <= chunk_len {
        return vec![(0.0, total.max(0.0))];
    }

    let mut windows = Vec::new();
    let mut offset = 0.0;
    while offset < total {
        windows.push((offset, chunk_len.min(total - offset)));
        offset += chunk_len;
    }
    windows
}

/// Extracts a time window from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding piece");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SigmaError::ToolFailed(format!("Piece extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SigmaError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SigmaError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SigmaError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(SigmaError::ToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(SigmaError::ToolFailed("ffprobe returned error".into()));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(json: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|_| SigmaError::ToolFailed("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| SigmaError::ToolFailed("Could not determine media duration".into()))
}
