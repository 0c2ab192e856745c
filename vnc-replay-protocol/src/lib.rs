//! RFB wire message definitions.
//!
//! This crate holds only the byte layout of the protocol: pixel formats,
//! rectangle headers, and client/server message bodies. It has no I/O of its
//! own - everything here parses from an in-memory `&[u8]` slice, since the
//! replay tool works from an already fully reassembled capture rather than a
//! live socket. Session-level concerns (the handshake walk, dispatching a
//! byte stream into a sequence of messages, decoding rectangle payloads)
//! live in `vnc-replay-core`, which depends on this crate rather than the
//! other way around.

pub mod messages;
