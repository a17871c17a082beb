//! JSON Lines replay of recorded landmark frames.
//!
//! Each input line is a [`FrameInput`] with an optional `track` field.
//! Every distinct track gets its own tracker thread, so recordings that
//! interleave several subjects or cameras keep their state apart. Each frame
//! produces one output line: the frame output, or the reason it was rejected.

use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strabo_core::{FrameInput, FrameOutput, PipelineConfig};

use crate::tracker::{spawn_tracker, TrackerError, TrackerHandle, TrackerSummary};

const DEFAULT_TRACK: &str = "default";

#[derive(Deserialize)]
struct FrameRecord {
    #[serde(default)]
    track: Option<String>,
    #[serde(flatten)]
    frame: FrameInput,
}

#[derive(Serialize)]
struct OutputRecord<'a> {
    track: &'a str,
    timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a FrameOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Totals for a finished replay.
#[derive(Debug, Default, Serialize)]
pub struct ReplayStats {
    pub frames: usize,
    pub rejected: usize,
    pub tracks: BTreeMap<String, TrackerSummary>,
}

/// Replay every frame in `input`, writing one JSON line per frame to `output`.
pub async fn run<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    config: &PipelineConfig,
) -> Result<ReplayStats> {
    let mut trackers: HashMap<String, TrackerHandle> = HashMap::new();
    let mut stats = ReplayStats::default();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read input line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("invalid frame record on line {line_no}"))?;
        let track = record
            .track
            .unwrap_or_else(|| DEFAULT_TRACK.to_string());
        let timestamp = record.frame.timestamp;

        let handle = match trackers.get(&track) {
            Some(h) => h.clone(),
            None => {
                let h = spawn_tracker(&track, config.clone())?;
                trackers.insert(track.clone(), h.clone());
                h
            }
        };

        stats.frames += 1;
        let (frame_output, error) = match handle.process(record.frame).await {
            Ok(out) => (Some(out), None),
            Err(TrackerError::Frame(e)) => {
                tracing::warn!(track = %track, line = line_no, timestamp, error = %e, "frame rejected");
                stats.rejected += 1;
                (None, Some(e.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let out = OutputRecord {
            track: &track,
            timestamp,
            output: frame_output.as_ref(),
            error,
        };
        serde_json::to_writer(&mut output, &out).context("failed to write output record")?;
        writeln!(output).context("failed to write output record")?;
    }
    output.flush().context("failed to flush output")?;

    for (track, handle) in &trackers {
        stats.tracks.insert(track.clone(), handle.summary().await?);
    }

    tracing::info!(
        frames = stats.frames,
        rejected = stats.rejected,
        tracks = stats.tracks.len(),
        "replay finished"
    );
    Ok(stats)
}
