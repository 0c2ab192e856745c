//! PointerPos pseudo-encoding decoder.
//!
//! PointerPos (pseudo-encoding -232) carries no payload at all - the rectangle
//! header's `(x, y)` is itself the new pointer position, and `width`/`height`
//! are always zero. It never touches the canvas and never produces a visible
//! rectangle; the dispatcher reads `rect.x`/`rect.y` directly off the header.

use crate::{DecodeError, DecodeOutcome, ENCODING_POINTER_POS};
use vnc_replay_protocol::messages::types::Rectangle;

pub struct PointerPosDecoder;

impl PointerPosDecoder {
    pub fn encoding_type(&self) -> i32 {
        ENCODING_POINTER_POS
    }

    /// Decodes a PointerPos pseudo-rectangle. Always consumes zero bytes and
    /// produces no visible output.
    pub fn decode(
        &self,
        _payload: &[u8],
        _rect: &Rectangle,
    ) -> (usize, Result<DecodeOutcome, DecodeError>) {
        (0, Ok(DecodeOutcome::None))
    }
}
