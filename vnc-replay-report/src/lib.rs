//! Renders a decoded [`vnc_replay_core::Session`] to a single self-contained
//! HTML document: a human-readable event log plus an embedded JS player that
//! can scrub the framebuffer, cursor and clipboard state back and forth.

mod payload;
mod writer;

pub use writer::ReplayWriter;
