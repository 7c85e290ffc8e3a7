//! Frame timeline reconstruction and projection.
//!
//! This module turns a captured event log into per-frame timelines and
//! projects them three ways:
//!
//! - **Duration queries**: begin/end event pairs with cross-stream min/max
//!   aggregation ([`DurationQuery`], [`durations`])
//! - **Tabular pivot**: one row per frame (or per frame repetition) for
//!   statistical tooling ([`pivot`])
//! - **SVG timeline**: one lane per pipeline stage per stream ([`render`])
//!
//! # Usage
//!
//! ```bash
//! # Motion-to-photon durations with summary statistics
//! frametrace durations timings.csv --stats
//!
//! # Pivot for pandas/R, one row per display repetition
//! frametrace pivot timings.csv --per-repeat > timings-flat.csv
//!
//! # Timeline diagram
//! frametrace render timings.csv -o timeline.svg
//! ```

pub mod error;
pub mod frame;
pub mod parse;
pub mod pivot;
pub mod stage;
pub mod stats;
pub mod svg;

// Re-export main types for convenience
pub use error::TimelineError;
pub use frame::{Aggregate, DurationQuery, EventValue, Frame, FrameSet, durations};
pub use parse::{ReadOptions, read_str};
pub use pivot::{PivotTable, pivot};
pub use stage::{EventKind, GLOBAL_STREAM, event_kind};
pub use stats::{DurationStats, summarize};
pub use svg::{DrawOrder, RenderOptions, render};
