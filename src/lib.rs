//! Frame-timing analysis for VR streaming pipeline logs.
//!
//! A streaming session emits one CSV row per pipeline event (wake-up, encode,
//! network send/receive, decode, blit, display), tagged with a frame index
//! and a sub-stream id. This crate reconstructs per-frame timelines from such
//! a log and projects them into duration queries, a tabular pivot for
//! statistical tooling, and an SVG timeline diagram.
//!
//! The [`timeline`] module holds the whole engine; [`config`] layers the
//! config file and environment on top of built-in defaults; [`styling`]
//! provides terminal output helpers for the CLI.

pub mod config;
pub mod styling;
pub mod timeline;
