//! The static stage table: known pipeline event names and their semantics.
//!
//! The reader's overwrite-vs-append dispatch and the pivot's aggregation
//! direction are both table-driven from here, so per-event behavior is
//! exhaustively checkable instead of inferred from string identity at each
//! call site.

use super::frame::Aggregate;

/// Stream id sentinel meaning "global, not tied to a sub-stream".
pub const GLOBAL_STREAM: u8 = 255;

/// How the reader stores an occurrence of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Single timestamp, last write wins.
    Instant,
    /// Opens an interval (pairs with the matching `_end` event).
    IntervalBegin,
    /// Closes an interval (pairs with the matching `_begin` event).
    IntervalEnd,
    /// May fire several times per frame; occurrences are collected in
    /// arrival order (e.g. one display refresh per reprojection).
    RepeatableInstant,
}

impl EventKind {
    pub fn is_repeatable(self) -> bool {
        matches!(self, EventKind::RepeatableInstant)
    }
}

/// Classify an event name. Unknown names fall back to plain instant
/// semantics so logs from newer pipelines with extra probes still load.
pub fn event_kind(name: &str) -> EventKind {
    match name {
        "blit" | "display" => EventKind::RepeatableInstant,
        n if n.ends_with("_begin") => EventKind::IntervalBegin,
        n if n.ends_with("_end") => EventKind::IntervalEnd,
        _ => EventKind::Instant,
    }
}

/// Global events that get their own pivot columns, in column order.
pub const GLOBAL_EVENTS: [&str; 3] = ["wake_up", "begin", "submit"];

/// One tracked per-stream stage column in the pivot.
#[derive(Debug, Clone, Copy)]
pub struct StageColumn {
    pub name: &'static str,
    /// Cross-stream reduction: earliest for interval begins, latest for
    /// everything else.
    pub aggregate: Aggregate,
    pub repeatable: bool,
}

const fn begin(name: &'static str) -> StageColumn {
    StageColumn {
        name,
        aggregate: Aggregate::Min,
        repeatable: false,
    }
}

const fn end(name: &'static str) -> StageColumn {
    StageColumn {
        name,
        aggregate: Aggregate::Max,
        repeatable: false,
    }
}

const fn repeatable(name: &'static str) -> StageColumn {
    StageColumn {
        name,
        aggregate: Aggregate::Max,
        repeatable: true,
    }
}

/// Tracked per-stream stages, in pipeline (and pivot column) order.
pub const STREAM_STAGES: [StageColumn; 11] = [
    begin("encode_begin"),
    end("encode_end"),
    begin("send_begin"),
    end("send_end"),
    begin("receive_begin"),
    end("receive_end"),
    end("reconstructed"),
    begin("decode_begin"),
    end("decode_end"),
    repeatable("blit"),
    repeatable("display"),
];

/// Fixed palette indexed by stage identity.
/// https://www.heavy.ai/blog/12-color-palettes-for-telling-better-stories-with-your-data
pub const PALETTE: [&str; 9] = [
    "#ea5545", "#f46a9b", "#ef9b20", "#edbf33", "#ede15b", "#bdcf32", "#87bc45", "#27aeef",
    "#b33dc6",
];
