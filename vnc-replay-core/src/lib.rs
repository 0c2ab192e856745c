//! Stateful RFB session decoding: timed reassembly of both directions of a
//! captured TCP stream, a one-shot handshake walk, and a merged-timeline
//! message dispatcher that drives the rectangle decoders in
//! `vnc-replay-encodings` to build the ordered [`event::Event`] log a
//! `ReplayWriter` renders.

pub mod config;
pub mod error;
pub mod event;
pub mod handshake;
pub mod packet;
pub mod session;
pub mod timed_buffer;

pub use config::Config;
pub use error::{Direction, ReplayError};
pub use event::{Diagnostic, Event, EventPayload, RenderedRect};
pub use handshake::HandshakeResult;
pub use packet::{demux, Packet};
pub use session::Session;
pub use timed_buffer::TimedBuffer;
