//! Per-frame event storage and duration queries.

use std::collections::{BTreeMap, BTreeSet};

use super::stage::{GLOBAL_STREAM, event_kind};

pub const NANOS_PER_MS: f64 = 1_000_000.0;

/// Cross-stream reduction for a duration endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Aggregate {
    /// Earliest timestamp across the selected streams
    Min,
    /// Latest timestamp across the selected streams
    Max,
}

impl Aggregate {
    pub fn reduce(self, samples: impl IntoIterator<Item = i64>) -> Option<i64> {
        match self {
            Aggregate::Min => samples.into_iter().min(),
            Aggregate::Max => samples.into_iter().max(),
        }
    }
}

/// Stored value of one event slot on a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValue {
    /// Single timestamp, last write wins.
    Instant(i64),
    /// Occurrences of a repeatable event, in arrival order.
    Repeated(Vec<i64>),
}

impl EventValue {
    /// Every recorded occurrence.
    pub fn samples(&self) -> &[i64] {
        match self {
            EventValue::Instant(ts) => std::slice::from_ref(ts),
            EventValue::Repeated(samples) => samples,
        }
    }

    /// The `rep`-th occurrence, if recorded.
    pub fn nth(&self, rep: usize) -> Option<i64> {
        self.samples().get(rep).copied()
    }

    pub fn repeat_count(&self) -> usize {
        self.samples().len()
    }
}

/// A duration query: begin/end event names, the stream scope, and the
/// cross-stream reduction for each endpoint.
///
/// Defaults measure motion-to-photon: earliest `wake_up` to latest
/// `display` across all streams.
#[derive(Debug, Clone)]
pub struct DurationQuery {
    pub begin: String,
    pub end: String,
    /// `None` selects every stream in the frame.
    pub stream: Option<u8>,
    pub begin_aggregate: Aggregate,
    pub end_aggregate: Aggregate,
}

impl Default for DurationQuery {
    fn default() -> Self {
        Self {
            begin: "wake_up".to_string(),
            end: "display".to_string(),
            stream: None,
            begin_aggregate: Aggregate::Min,
            end_aggregate: Aggregate::Max,
        }
    }
}

/// One rendered frame's events, populated by the reader and immutable
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    index: usize,
    events: BTreeMap<String, i64>,
    streams: BTreeMap<u8, BTreeMap<String, EventValue>>,
    flags: BTreeMap<Option<u8>, BTreeSet<String>>,
    max_repeats: usize,
}

impl Frame {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Record one event occurrence. Global events (stream 255) overwrite;
    /// stream events overwrite unless the stage table marks the event
    /// repeatable, in which case occurrences accumulate in arrival order.
    pub fn record(&mut self, event: &str, timestamp: i64, stream: u8) {
        if stream == GLOBAL_STREAM {
            self.events.insert(event.to_string(), timestamp);
            return;
        }
        let slot = self.streams.entry(stream).or_default();
        if event_kind(event).is_repeatable() {
            let value = slot
                .entry(event.to_string())
                .or_insert_with(|| EventValue::Repeated(Vec::new()));
            if let EventValue::Repeated(samples) = value {
                samples.push(timestamp);
                self.max_repeats = self.max_repeats.max(samples.len());
            }
        } else {
            slot.insert(event.to_string(), EventValue::Instant(timestamp));
        }
    }

    /// Attach a flag token to a stream's flag set (global slot for 255).
    /// Duplicates are idempotent.
    pub fn add_flag(&mut self, stream: u8, flag: &str) {
        let slot = (stream != GLOBAL_STREAM).then_some(stream);
        self.flags.entry(slot).or_default().insert(flag.to_string());
    }

    pub fn has_flag(&self, stream: Option<u8>, flag: &str) -> bool {
        self.flags
            .get(&stream)
            .is_some_and(|flags| flags.contains(flag))
    }

    /// Global (stream-independent) event timestamp.
    pub fn global(&self, event: &str) -> Option<i64> {
        self.events.get(event).copied()
    }

    pub fn streams(&self) -> impl Iterator<Item = (u8, &BTreeMap<String, EventValue>)> {
        self.streams.iter().map(|(id, events)| (*id, events))
    }

    pub fn stream(&self, id: u8) -> Option<&BTreeMap<String, EventValue>> {
        self.streams.get(&id)
    }

    /// Largest repeat-count recorded across all streams (0 when no
    /// repeatable event was seen). The pivot uses this to size its
    /// repetition rows.
    pub fn max_repeats(&self) -> usize {
        self.max_repeats
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.streams.is_empty()
    }

    /// Earliest timestamp recorded anywhere in the frame.
    pub fn earliest(&self) -> Option<i64> {
        self.timestamps().min()
    }

    /// Latest timestamp recorded anywhere in the frame.
    pub fn latest(&self) -> Option<i64> {
        self.timestamps().max()
    }

    fn timestamps(&self) -> impl Iterator<Item = i64> {
        let globals = self.events.values().copied();
        let streamed = self
            .streams
            .values()
            .flat_map(|events| events.values())
            .flat_map(|value| value.samples().iter().copied());
        globals.chain(streamed)
    }

    /// Resolve one endpoint of a duration query: a global event is used
    /// directly; otherwise the event is gathered from every selected stream
    /// and reduced. Every selected stream must carry the event: a frame
    /// where only some streams reported it yields `None`, as does an empty
    /// or missing stream selection.
    pub fn resolve(&self, event: &str, stream: Option<u8>, aggregate: Aggregate) -> Option<i64> {
        if let Some(ts) = self.global(event) {
            return Some(ts);
        }
        let selected: Vec<&BTreeMap<String, EventValue>> = match stream {
            Some(id) => vec![self.streams.get(&id)?],
            None => {
                if self.streams.is_empty() {
                    return None;
                }
                self.streams.values().collect()
            }
        };
        let mut samples = Vec::new();
        for events in selected {
            samples.extend_from_slice(events.get(event)?.samples());
        }
        aggregate.reduce(samples)
    }

    /// Duration in milliseconds, or `None` when either endpoint cannot be
    /// resolved. Callers treat `None` as "exclude this frame".
    pub fn duration(&self, query: &DurationQuery) -> Option<f64> {
        let t0 = self.resolve(&query.begin, query.stream, query.begin_aggregate)?;
        let t1 = self.resolve(&query.end, query.stream, query.end_aggregate)?;
        Some((t1 - t0) as f64 / NANOS_PER_MS)
    }
}

/// The frame collection: a grow-to-index arena, indexed from 0
/// contiguously. Referencing frame `k` allocates empty placeholder frames
/// up to `k` so random access stays O(1) without a pre-known frame count.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    /// Access frame `index`, growing the arena with default-constructed
    /// frames as needed.
    pub fn ensure(&mut self, index: usize) -> &mut Frame {
        while self.frames.len() <= index {
            let next = self.frames.len();
            self.frames.push(Frame::new(next));
        }
        &mut self.frames[index]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Largest stream id observed across all frames.
    pub fn max_stream(&self) -> Option<u8> {
        self.frames
            .iter()
            .flat_map(|frame| frame.streams().map(|(id, _)| id))
            .max()
    }
}

impl<'a> IntoIterator for &'a FrameSet {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Batch form: durations for every frame that passes the flag filter and
/// resolves the query. The flag is looked up against the query's stream
/// selector (global slot when the selector is "all streams"). Frames
/// failing either filter are silently excluded.
pub fn durations(frames: &FrameSet, query: &DurationQuery, flag: Option<&str>) -> Vec<f64> {
    frames
        .iter()
        .filter(|frame| match flag {
            None => true,
            Some(flag) => frame.has_flag(query.stream, flag),
        })
        .filter_map(|frame| frame.duration(query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(begin: &str, end: &str, stream: Option<u8>) -> DurationQuery {
        DurationQuery {
            begin: begin.to_string(),
            end: end.to_string(),
            stream,
            ..DurationQuery::default()
        }
    }

    #[test]
    fn test_global_duration_exact() {
        let mut frame = Frame::new(0);
        frame.record("wake_up", 1000, GLOBAL_STREAM);
        frame.record("submit", 5000, GLOBAL_STREAM);
        frame.record("display", 9000, GLOBAL_STREAM);

        let d = frame.duration(&DurationQuery::default()).unwrap();
        assert_eq!(d, (9000.0 - 1000.0) / 1_000_000.0);
    }

    #[test]
    fn test_cross_stream_min_aggregation() {
        // No global wake_up: the begin endpoint reduces across streams.
        let mut frame = Frame::new(0);
        frame.record("wake_up", 1000, 0);
        frame.record("wake_up", 1500, 1);
        frame.record("display", 9000, GLOBAL_STREAM);

        let t0 = frame
            .resolve("wake_up", None, Aggregate::Min)
            .expect("both streams report wake_up");
        assert_eq!(t0, 1000);

        let d = frame.duration(&DurationQuery::default()).unwrap();
        assert_eq!(d, (9000.0 - 1000.0) / 1_000_000.0);
    }

    #[test]
    fn test_missing_end_is_undefined() {
        let mut frame = Frame::new(0);
        frame.record("encode_begin", 2000, 0);

        assert_eq!(frame.duration(&query("encode_begin", "encode_end", Some(0))), None);
    }

    #[test]
    fn test_missing_named_stream_is_undefined() {
        let mut frame = Frame::new(0);
        frame.record("encode_begin", 2000, 0);
        frame.record("encode_end", 4000, 0);

        assert!(frame.duration(&query("encode_begin", "encode_end", Some(3))).is_none());
    }

    #[test]
    fn test_empty_stream_selection_is_undefined() {
        let mut frame = Frame::new(0);
        frame.record("submit", 5000, GLOBAL_STREAM);

        // begin only exists per-stream, and there are no streams
        assert!(frame.duration(&query("wake_up", "submit", None)).is_none());
    }

    #[test]
    fn test_partial_stream_coverage_is_undefined() {
        // Stream 1 never reported encode_begin: the all-streams gather
        // cannot resolve the endpoint.
        let mut frame = Frame::new(0);
        frame.record("encode_begin", 2000, 0);
        frame.record("encode_end", 4000, 0);
        frame.record("encode_end", 4500, 1);

        assert!(frame.resolve("encode_begin", None, Aggregate::Min).is_none());
    }

    #[test]
    fn test_global_event_shadows_streams() {
        let mut frame = Frame::new(0);
        frame.record("wake_up", 7777, GLOBAL_STREAM);
        frame.record("wake_up", 1000, 0);

        assert_eq!(frame.resolve("wake_up", None, Aggregate::Min), Some(7777));
    }

    #[test]
    fn test_repeatable_event_appends() {
        let mut frame = Frame::new(0);
        frame.record("display", 1000, 0);
        frame.record("display", 2000, 0);
        frame.record("display", 3000, 0);

        let value = frame.stream(0).unwrap().get("display").unwrap();
        assert_eq!(value.samples(), &[1000, 2000, 3000]);
        assert_eq!(frame.max_repeats(), 3);
    }

    #[test]
    fn test_repeatable_occurrences_feed_the_aggregator() {
        let mut frame = Frame::new(0);
        frame.record("wake_up", 100, GLOBAL_STREAM);
        frame.record("display", 5000, 0);
        frame.record("display", 9000, 0);
        frame.record("display", 7000, 1);

        // Latest display across streams and repetitions.
        let d = frame.duration(&DurationQuery::default()).unwrap();
        assert_eq!(d, (9000.0 - 100.0) / 1_000_000.0);
    }

    #[test]
    fn test_instant_overwrites() {
        let mut frame = Frame::new(0);
        frame.record("encode_begin", 2000, 0);
        frame.record("encode_begin", 2500, 0);

        let value = frame.stream(0).unwrap().get("encode_begin").unwrap();
        assert_eq!(value.samples(), &[2500]);
    }

    #[test]
    fn test_flags_union_idempotent() {
        let mut frame = Frame::new(0);
        frame.add_flag(0, "dropped");
        frame.add_flag(0, "dropped");
        frame.add_flag(0, "resent");
        frame.add_flag(GLOBAL_STREAM, "reprojected");

        assert!(frame.has_flag(Some(0), "dropped"));
        assert!(frame.has_flag(Some(0), "resent"));
        assert!(frame.has_flag(None, "reprojected"));
        assert!(!frame.has_flag(Some(1), "dropped"));
    }

    #[test]
    fn test_frame_set_grows_to_index() {
        let mut frames = FrameSet::default();
        frames.ensure(3).record("wake_up", 100, GLOBAL_STREAM);

        assert_eq!(frames.len(), 4);
        assert!(frames.frames()[0].is_empty());
        assert!(frames.frames()[2].is_empty());
        assert_eq!(frames.frames()[3].global("wake_up"), Some(100));
        // Placeholders carry their own index
        assert_eq!(frames.frames()[2].index(), 2);
    }

    #[test]
    fn test_batch_durations_exclude_undefined() {
        let mut frames = FrameSet::default();
        frames.ensure(0).record("encode_begin", 2000, 0);
        let f1 = frames.ensure(1);
        f1.record("encode_begin", 1000, 0);
        f1.record("encode_end", 4000, 0);

        let q = query("encode_begin", "encode_end", Some(0));
        let result = durations(&frames, &q, None);
        assert_eq!(result, vec![(4000.0 - 1000.0) / 1_000_000.0]);
    }

    #[test]
    fn test_batch_durations_flag_filter() {
        let mut frames = FrameSet::default();
        let f0 = frames.ensure(0);
        f0.record("wake_up", 1000, GLOBAL_STREAM);
        f0.record("display", 2000, GLOBAL_STREAM);
        f0.add_flag(GLOBAL_STREAM, "reprojected");
        let f1 = frames.ensure(1);
        f1.record("wake_up", 3000, GLOBAL_STREAM);
        f1.record("display", 5000, GLOBAL_STREAM);

        let all = durations(&frames, &DurationQuery::default(), None);
        assert_eq!(all.len(), 2);

        let flagged = durations(&frames, &DurationQuery::default(), Some("reprojected"));
        assert_eq!(flagged, vec![(2000.0 - 1000.0) / 1_000_000.0]);
    }

    #[test]
    fn test_max_stream() {
        let mut frames = FrameSet::default();
        frames.ensure(0).record("encode_begin", 100, 2);
        frames.ensure(1).record("encode_begin", 200, 5);
        assert_eq!(frames.max_stream(), Some(5));
        assert_eq!(FrameSet::default().max_stream(), None);
    }
}
