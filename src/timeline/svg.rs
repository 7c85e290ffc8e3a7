//! SVG timeline rendering.
//!
//! One drawing fragment per frame inside a fixed envelope: interval stages
//! become filled rectangles sized by duration, instantaneous stages become
//! vertical ticks, and each stream's lanes sit at a fixed vertical offset so
//! streams never overlap. Purely presentational; frames with incomplete
//! stage data get partial fragments rather than errors.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::frame::{EventValue, Frame, FrameSet, NANOS_PER_MS};
use super::stage::PALETTE;

/// Lane height in pixels.
const LINE_HEIGHT: f64 = 70.0;
/// Vertical gap between lanes.
const LINE_MARGIN: f64 = 50.0;
/// Lanes per stream: encode/send, receive/decode, blit, display.
const LANES_PER_STREAM: f64 = 4.0;

/// Which end of the capture is emitted first (and therefore painted under
/// the other). A presentation choice, not a correctness requirement.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DrawOrder {
    /// Later frames first, so earlier frames paint on top
    #[default]
    NewestFirst,
    /// Capture order
    OldestFirst,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub draw_order: DrawOrder,
    /// Horizontal scale in pixels per millisecond.
    pub pixels_per_ms: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            draw_order: DrawOrder::default(),
            pixels_per_ms: 20.0,
        }
    }
}

/// Render the whole frame collection as a standalone SVG document.
pub fn render(frames: &FrameSet, options: &RenderOptions) -> String {
    let scale = options.pixels_per_ms;
    let advance = LINE_HEIGHT + LINE_MARGIN;

    let stream_count = frames.max_stream().map(|max| max as f64 + 1.0).unwrap_or(0.0);
    let height = (1.0 + LANES_PER_STREAM * stream_count) * advance;
    let width = frames
        .iter()
        .filter_map(Frame::latest)
        .max()
        .map(|ts| (ts as f64 / NANOS_PER_MS * scale).ceil())
        .unwrap_or(0.0);

    debug!(
        "rendering {} frames, {} streams, {}x{} px ({})",
        frames.len(),
        stream_count,
        width,
        height,
        options.draw_order
    );

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\">\n"
    ));

    let emit = |out: &mut String, frame: &Frame| {
        if let Some(fragment) = frame_fragment(frame, scale) {
            out.push_str(&fragment);
        }
    };
    match options.draw_order {
        DrawOrder::NewestFirst => frames.iter().rev().for_each(|frame| emit(&mut out, frame)),
        DrawOrder::OldestFirst => frames.iter().for_each(|frame| emit(&mut out, frame)),
    }

    out.push_str("</svg>\n");
    out
}

/// One frame's `<g>` fragment, positioned at its earliest timestamp.
/// Frames without the global wake_up/submit pair are omitted entirely.
fn frame_fragment(frame: &Frame, scale: f64) -> Option<String> {
    let wake_up = frame.global("wake_up")?;
    let submit = frame.global("submit")?;
    let t0 = frame.earliest()?;
    let advance = LINE_HEIGHT + LINE_MARGIN;
    let rel = |ts: i64| (ts - t0) as f64 / NANOS_PER_MS * scale;

    let mut g = String::new();
    g.push_str(&format!(
        "  <g class=\"frame\" id=\"frame-{}\" transform=\"translate({:.2} 0)\">\n",
        frame.index(),
        t0 as f64 / NANOS_PER_MS * scale,
    ));

    // Compositor lane
    g.push_str(&rect(
        rel(wake_up),
        0.0,
        rel(submit) - rel(wake_up),
        LINE_HEIGHT,
        PALETTE[0],
        "compositor",
    ));
    g.push_str(&format!(
        "    <text x=\"{:.2}\" y=\"{:.2}\" dominant-baseline=\"middle\">Frame {}</text>\n",
        rel(wake_up),
        LINE_HEIGHT / 2.0,
        frame.index(),
    ));

    for (id, events) in frame.streams() {
        let y0 = advance * (1.0 + LANES_PER_STREAM * id as f64);

        if let (Some(begin), Some(end)) =
            (scalar(events, "encode_begin"), scalar(events, "encode_end"))
        {
            g.push_str(&rect(
                rel(begin),
                y0,
                rel(end) - rel(begin),
                LINE_HEIGHT,
                PALETTE[1],
                "encode",
            ));
        }
        if let (Some(begin), Some(end)) = (scalar(events, "send_begin"), scalar(events, "send_end"))
        {
            g.push_str(&rect(
                rel(begin),
                y0 + LINE_HEIGHT * 0.2,
                rel(end) - rel(begin),
                LINE_HEIGHT * 0.6,
                PALETTE[2],
                "send",
            ));
        }
        if let (Some(begin), Some(end)) =
            (scalar(events, "receive_begin"), scalar(events, "receive_end"))
        {
            g.push_str(&rect(
                rel(begin),
                y0 + advance,
                (rel(end) - rel(begin)).max(1.0),
                LINE_HEIGHT,
                PALETTE[3],
                "receive",
            ));
        }
        if let (Some(begin), Some(end)) =
            (scalar(events, "decode_begin"), scalar(events, "decode_end"))
        {
            g.push_str(&rect(
                rel(begin),
                y0 + advance,
                rel(end) - rel(begin),
                LINE_HEIGHT,
                PALETTE[5],
                "decode",
            ));
        }
        for &ts in ticks(events, "blit") {
            g.push_str(&tick(rel(ts), y0 + 2.0 * advance, PALETTE[6], "blit"));
        }
        for &ts in ticks(events, "display") {
            g.push_str(&tick(rel(ts), y0 + 3.0 * advance, PALETTE[6], "display"));
        }
    }

    g.push_str("  </g>\n");
    Some(g)
}

/// Last-written timestamp of a non-repeatable stream event.
fn scalar(events: &BTreeMap<String, EventValue>, name: &str) -> Option<i64> {
    events
        .get(name)
        .and_then(|value| value.samples().last().copied())
}

/// All occurrences of a repeatable stream event.
fn ticks<'a>(events: &'a BTreeMap<String, EventValue>, name: &str) -> &'a [i64] {
    events.get(name).map(EventValue::samples).unwrap_or(&[])
}

fn rect(x: f64, y: f64, width: f64, height: f64, fill: &str, class: &str) -> String {
    format!(
        "    <rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{fill}\" class=\"{class}\"/>\n"
    )
}

fn tick(x: f64, y: f64, stroke: &str, class: &str) -> String {
    let bottom = y + LINE_HEIGHT;
    format!(
        "    <line x1=\"{x:.2}\" y1=\"{y:.2}\" x2=\"{x:.2}\" y2=\"{bottom:.2}\" stroke=\"{stroke}\" class=\"{class}\"/>\n"
    )
}
