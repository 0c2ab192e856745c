//! RFB rectangle decoders.
//!
//! Each decoder here handles one encoding tag from a `FramebufferUpdate` body.
//! Unlike the teacher crate, there is no `AsyncRead`-backed stream: a
//! rectangle's payload has already fully arrived (the replay tool operates on
//! a captured, reassembled trace), so every `decode` takes a plain `&[u8]`
//! slice starting right after the 12-byte rectangle header and returns how
//! many bytes of it the encoding consumed.
//!
//! Decoders composite directly into a [`vnc_replay_pixelbuffer::Canvas`]
//! rather than a generic `MutablePixelBuffer`, since every decoder already
//! converts pixels to RGBA8888 before writing - there is exactly one pixel
//! format downstream of a decoder, so the buffer abstraction the teacher used
//! to support swappable native formats is unnecessary here.

pub mod copyrect;
pub mod cursor;
pub mod pointerpos;
pub mod raw;
pub mod tight;
pub mod zlib_streams;

pub use vnc_replay_pixelbuffer::{Canvas, PixelFormat};
pub use vnc_replay_protocol::messages::types::Rectangle;
pub use zlib_streams::ZlibStreamSet;

pub use copyrect::CopyRectDecoder;
pub use cursor::CursorDecoder;
pub use pointerpos::PointerPosDecoder;
pub use raw::RawDecoder;
pub use tight::TightDecoder;

/// Raw encoding: uncompressed pixel data.
pub const ENCODING_RAW: i32 = 0;
/// CopyRect encoding: copy a block already present in the framebuffer.
pub const ENCODING_COPY_RECT: i32 = 1;
/// Tight encoding: JPEG, zlib, or solid-fill sub-types.
pub const ENCODING_TIGHT: i32 = 7;
/// PointerPos pseudo-encoding: cursor position, no pixel payload.
pub const ENCODING_POINTER_POS: i32 = -232;
/// Cursor pseudo-encoding: cursor shape plus an alpha bitmask.
pub const ENCODING_CURSOR: i32 = -239;

/// Errors a decoder can report. These are local to this crate; the
/// dispatcher in `vnc-replay-core` maps them onto the richer `ReplayError`
/// taxonomy (zlib truncation and unknown sub-types are recoverable there,
/// everything else bubbles up).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("zlib stream {0} truncated")]
    ZlibTruncated(usize),
    #[error("unknown Tight sub-type, comp_ctl={0:#04x}")]
    UnknownTightSubtype(u8),
    #[error("buffer too short decoding {0}")]
    Truncated(&'static str),
}

/// What a decoder produced for one rectangle.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A visible rectangle was composited into the canvas (or, for Tight
    /// JPEG, rendered standalone); `payload` is ready to embed as-is under
    /// `mime` (`"image/png"` for every decoder except Tight's JPEG sub-type,
    /// which emits the original JPEG bytes verbatim rather than re-encoding).
    Rect { payload: Vec<u8>, mime: &'static str },
    /// A cursor shape update (RFB Cursor pseudo-encoding): not part of the
    /// framebuffer, rendered as its own image with a hotspot.
    Cursor { png: Vec<u8>, hot_x: u16, hot_y: u16 },
    /// No visible output (zero-area rectangle, pointer position update, or a
    /// degenerate single-colour Tight palette).
    None,
}

/// Common shape every rectangle decoder in this crate follows: consume bytes
/// from `payload`, update `canvas` in place, and report what was produced.
///
/// This isn't a generic `dyn`-safe trait the way the teacher's `Decoder` is
/// (return types differ too much across encodings, the CopyRect and Tight
/// decoders need different extra state) - it documents the shared contract
/// that each concrete decoder's own `decode` function honors.
pub trait RectDecoder {
    fn encoding_type(&self) -> i32;
}
