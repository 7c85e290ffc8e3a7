//! Flatten a frame collection into a row-oriented table.
//!
//! The pivot is the hand-off artifact for statistical tooling (pandas, R):
//! every declared column is present in every row, row order is ascending by
//! frame (and repetition within a frame), and missing values stay explicit
//! (empty CSV field, JSON `null`).
//!
//! Column layout: `frame` (plus `repeat` in the repetition-aware variant),
//! the global events, one cross-stream-aggregated column per tracked stage,
//! then the same stages scoped to each observed stream as `s{id}_{stage}`.

use indexmap::IndexMap;

use super::frame::{EventValue, Frame, FrameSet};
use super::stage::{GLOBAL_EVENTS, STREAM_STAGES, StageColumn};

/// A materialized pivot: column names plus one value vector per row.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<i64>>>,
}

impl PivotTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<i64>>] {
        &self.rows
    }

    /// CSV rendering; undefined values become empty fields.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.join(","));
        out.push('\n');
        for row in &self.rows {
            let fields: Vec<String> = row
                .iter()
                .map(|value| value.map(|v| v.to_string()).unwrap_or_default())
                .collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// JSON rendering: an array of objects, one per row, keys in column
    /// order; undefined values become `null`.
    pub fn to_json(&self) -> String {
        let objects: Vec<IndexMap<&str, Option<i64>>> = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().copied())
                    .collect()
            })
            .collect();
        serde_json::to_string_pretty(&objects).expect("Failed to serialize pivot to JSON")
    }
}

/// Flatten `frames` into a [`PivotTable`].
///
/// With `per_repeat` one row is emitted per `(frame, repetition)` where the
/// repetition index ranges over the frame's maximum repeat-count (at least
/// one row per frame); repeatable stage columns carry the repetition's
/// occurrence and pad with undefined where a stream reported fewer. Without
/// it, one row per frame, repeatable stages aggregated like any other.
pub fn pivot(frames: &FrameSet, per_repeat: bool) -> PivotTable {
    let stream_count = frames.max_stream().map(|max| max as usize + 1).unwrap_or(0);

    let mut columns = Vec::new();
    columns.push("frame".to_string());
    if per_repeat {
        columns.push("repeat".to_string());
    }
    columns.extend(GLOBAL_EVENTS.iter().map(|name| name.to_string()));
    columns.extend(STREAM_STAGES.iter().map(|stage| stage.name.to_string()));
    for id in 0..stream_count {
        columns.extend(
            STREAM_STAGES
                .iter()
                .map(|stage| format!("s{id}_{}", stage.name)),
        );
    }

    let mut rows = Vec::new();
    for frame in frames {
        let repetitions = if per_repeat {
            frame.max_repeats().max(1)
        } else {
            1
        };
        for rep in 0..repetitions {
            let rep = per_repeat.then_some(rep);
            let mut row = Vec::with_capacity(columns.len());
            row.push(Some(frame.index() as i64));
            if let Some(rep) = rep {
                row.push(Some(rep as i64));
            }
            for name in GLOBAL_EVENTS {
                row.push(frame.global(name));
            }
            for stage in &STREAM_STAGES {
                row.push(aggregated(frame, stage, rep));
            }
            for id in 0..stream_count {
                for stage in &STREAM_STAGES {
                    row.push(scoped(frame, id as u8, stage, rep));
                }
            }
            rows.push(row);
        }
    }

    PivotTable { columns, rows }
}

/// Cross-stream value of one stage column: reduce over whichever streams
/// reported it, undefined when none did.
fn aggregated(frame: &Frame, stage: &StageColumn, rep: Option<usize>) -> Option<i64> {
    let samples: Vec<i64> = frame
        .streams()
        .filter_map(|(_, events)| events.get(stage.name))
        .flat_map(|value| occurrences(value, stage, rep))
        .collect();
    stage.aggregate.reduce(samples)
}

/// The stage column scoped to exactly one stream.
fn scoped(frame: &Frame, id: u8, stage: &StageColumn, rep: Option<usize>) -> Option<i64> {
    let value = frame.stream(id)?.get(stage.name)?;
    stage.aggregate.reduce(occurrences(value, stage, rep))
}

/// The samples one stored value contributes to a cell: the `rep`-th
/// occurrence for repeatable stages in the repetition-aware variant, every
/// occurrence otherwise.
fn occurrences(value: &EventValue, stage: &StageColumn, rep: Option<usize>) -> Vec<i64> {
    match rep {
        Some(rep) if stage.repeatable => value.nth(rep).into_iter().collect(),
        _ => value.samples().to_vec(),
    }
}
