//! CopyRect encoding decoder - copy a block already present in the canvas.
//!
//! CopyRect (type 1) transmits only the source coordinates (4 bytes); the
//! destination rectangle comes from the 12-byte rectangle header. The source
//! pixels are read back from whatever the session canvas currently holds at
//! that position, since that's what the client would actually be displaying
//! at replay time.

use crate::{DecodeError, DecodeOutcome, ENCODING_COPY_RECT};
use vnc_replay_pixelbuffer::Canvas;
use vnc_replay_protocol::messages::types::Rectangle;

pub struct CopyRectDecoder;

impl CopyRectDecoder {
    pub fn encoding_type(&self) -> i32 {
        ENCODING_COPY_RECT
    }

    /// Decodes a CopyRect rectangle. Returns `(bytes_consumed, outcome)`.
    pub fn decode(
        &self,
        payload: &[u8],
        rect: &Rectangle,
        canvas: &mut Canvas,
    ) -> (usize, Result<DecodeOutcome, DecodeError>) {
        if rect.width == 0 || rect.height == 0 {
            return (0, Ok(DecodeOutcome::None));
        }
        if payload.len() < 4 {
            return (payload.len(), Err(DecodeError::Truncated("CopyRect src coords")));
        }

        let src_x = u16::from_be_bytes([payload[0], payload[1]]);
        let src_y = u16::from_be_bytes([payload[2], payload[3]]);

        let dest = vnc_replay_common::Rect::new(
            rect.x as i32,
            rect.y as i32,
            rect.width as u32,
            rect.height as u32,
        );
        canvas.copy_rect(dest, src_x as i32, src_y as i32);
        let png = canvas.crop_png(dest);

        match png {
            Some(payload) => (
                4,
                Ok(DecodeOutcome::Rect {
                    payload,
                    mime: "image/png",
                }),
            ),
            None => (4, Ok(DecodeOutcome::None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnc_replay_common::Rect;

    #[test]
    fn copies_pixels_from_canvas() {
        let decoder = CopyRectDecoder;
        let mut canvas = Canvas::new(20, 20);
        canvas.fill_rect(Rect::new(0, 0, 5, 5), [1, 2, 3, 255]);

        let rect = Rectangle {
            x: 10,
            y: 10,
            width: 5,
            height: 5,
            encoding: ENCODING_COPY_RECT,
        };
        let payload = [0x00, 0x00, 0x00, 0x00]; // src (0, 0)
        let (consumed, outcome) = decoder.decode(&payload, &rect, &mut canvas);
        assert_eq!(consumed, 4);
        assert!(matches!(outcome.unwrap(), DecodeOutcome::Rect { .. }));
    }

    #[test]
    fn zero_area_consumes_nothing() {
        let decoder = CopyRectDecoder;
        let mut canvas = Canvas::new(20, 20);
        let rect = Rectangle {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            encoding: ENCODING_COPY_RECT,
        };
        let (consumed, outcome) = decoder.decode(&[], &rect, &mut canvas);
        assert_eq!(consumed, 0);
        assert_eq!(outcome.unwrap(), DecodeOutcome::None);
    }

    #[test]
    fn truncated_payload_errors() {
        let decoder = CopyRectDecoder;
        let mut canvas = Canvas::new(20, 20);
        let rect = Rectangle {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
            encoding: ENCODING_COPY_RECT,
        };
        let (_, outcome) = decoder.decode(&[0, 1], &rect, &mut canvas);
        assert!(outcome.is_err());
    }
}
