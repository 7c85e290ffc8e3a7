//! Parse raw event logs into per-frame timelines.
//!
//! A capture is one CSV row per pipeline event:
//! ```text
//! event,frame,timestamp,stream
//! wake_up,0,1470739182,255
//! encode_begin,0,1471082182,0
//! display,0,1489102357,1,reprojected
//! ```
//!
//! `timestamp` is in nanoseconds; `stream` is the sub-stream id with 255
//! meaning "global, not tied to a sub-stream". Anything after the fourth
//! field is a flag token attached to that stream for the frame. The leading
//! header row is optional.
//!
//! All stored timestamps are re-based against the origin (the first valid
//! timestamp in the log). A literal zero timestamp means "event not recorded
//! this frame" and is discarded before it can disturb the origin or any
//! later query.

use log::debug;

use super::error::TimelineError;
use super::frame::FrameSet;

const NANOS_PER_MS: i64 = 1_000_000;

/// Row filters applied while reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Drop frames below this index and shift the survivors down.
    pub skip: i64,
    /// Drop events more than this many milliseconds past the origin.
    /// Non-positive disables the filter.
    pub duration_ms: i64,
}

/// Read a whole capture into a [`FrameSet`].
///
/// Malformed rows (fewer than four fields, non-integer frame, timestamp or
/// stream) fail the entire read; there is no row skipping.
pub fn read_str(input: &str, options: &ReadOptions) -> Result<FrameSet, TimelineError> {
    let mut origin: Option<i64> = None;
    let mut frames = FrameSet::default();
    let mut first_row = true;
    let mut rows = 0usize;
    let mut dropped = 0usize;

    for (index, raw_line) in input.lines().enumerate() {
        let line = index + 1;
        let row = raw_line.trim();
        if row.is_empty() {
            continue;
        }

        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        let event = fields[0].trim_matches('"');

        if first_row {
            first_row = false;
            if event == "event" {
                // Leading header row
                continue;
            }
        }

        if fields.len() < 4 {
            return Err(TimelineError::TruncatedRow {
                line,
                fields: fields.len(),
            });
        }

        let frame: i64 = fields[1].parse().map_err(|_| TimelineError::InvalidField {
            line,
            field: "frame",
            value: fields[1].to_string(),
        })?;
        let timestamp: i64 = fields[2].parse().map_err(|_| TimelineError::InvalidField {
            line,
            field: "timestamp",
            value: fields[2].to_string(),
        })?;
        let stream: u8 = fields[3].parse().map_err(|_| TimelineError::InvalidField {
            line,
            field: "stream",
            value: fields[3].to_string(),
        })?;

        rows += 1;

        let frame = frame - options.skip;
        if frame < 0 {
            dropped += 1;
            continue;
        }

        // Zero is the "event not recorded" sentinel: it must not be stored
        // and must not become the origin.
        if timestamp == 0 {
            dropped += 1;
            continue;
        }

        let origin = *origin.get_or_insert(timestamp);
        let timestamp = timestamp - origin;

        if options.duration_ms > 0 && timestamp > options.duration_ms * NANOS_PER_MS {
            dropped += 1;
            continue;
        }

        let frame = frames.ensure(frame as usize);
        frame.record(event, timestamp, stream);
        for &flag in &fields[4..] {
            if !flag.is_empty() {
                frame.add_flag(stream, flag);
            }
        }
    }

    debug!(
        "read {} frames from {} rows ({} dropped, origin {:?})",
        frames.len(),
        rows,
        dropped,
        origin
    );

    Ok(frames)
}
