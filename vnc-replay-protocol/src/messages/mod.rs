//! RFB protocol message types.
//!
//! Messages are grouped the way the wire groups them:
//!
//! - [`types`] - shared wire types: `PixelFormat`, `Rectangle`, encoding and
//!   security-type constants.
//! - [`server`] - messages sent from server to client.
//! - [`client`] - messages sent from client to server.
//!
//! Every message here is parsed from an already-buffered `&[u8]` slice rather
//! than a live socket - this crate has no I/O of its own. Dispatch (reading
//! the leading message-type byte and picking which parser to call, then
//! decoding the rectangle payloads that follow a `FramebufferUpdateHeader`)
//! is `vnc-replay-core`'s job, since that needs the session's `TimedBuffer`
//! and `Canvas`, which this crate does not depend on.

pub mod client;
pub mod server;
pub mod types;

pub use types::{
    PixelFormat, Rectangle, ENCODING_COPYRECT, ENCODING_CURSOR, ENCODING_POINTER_POS,
    ENCODING_RAW, ENCODING_TIGHT, SECURITY_TYPE_NONE, SECURITY_TYPE_VNC_AUTH,
};

pub use server::{
    Bell, ColorMapEntry, FramebufferUpdateHeader, ServerCutText, ServerInit, SetColorMapEntries,
};

pub use client::{
    ClientCutText, ClientInit, FramebufferUpdateRequest, KeyEvent, PointerEvent, SetEncodings,
    SetPixelFormat,
};

/// All client-to-server RFB message types this decoder recognizes.
///
/// `FramebufferUpdateRequest`s appear in client traces but carry no
/// information relevant to a replay (the server ignores what the client
/// asked for and sends what it sends); they are still a distinct variant so
/// the dispatcher can account for every byte of the trace.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    SetPixelFormat(SetPixelFormat),
    SetEncodings(SetEncodings),
    FramebufferUpdateRequest(FramebufferUpdateRequest),
    KeyEvent(KeyEvent),
    PointerEvent(PointerEvent),
    ClientCutText(ClientCutText),
}

/// All server-to-client RFB message types this decoder recognizes.
///
/// `FramebufferUpdate`'s rectangles are decoded incrementally against the
/// session canvas rather than collected eagerly, so this variant carries
/// nothing - the dispatcher streams rectangles out as individual
/// `DecodedRect` events as it parses them.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    FramebufferUpdate,
    SetColorMapEntries(SetColorMapEntries),
    Bell,
    ServerCutText(ServerCutText),
}
