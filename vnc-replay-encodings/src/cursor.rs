//! Cursor pseudo-encoding decoder - cursor shape plus an alpha bitmask.
//!
//! Cursor (pseudo-encoding -239) carries `w*h` pixels in the negotiated pixel
//! format, followed by a `ceil(w/8)*h`-byte transparency bitmask (one row per
//! cursor scanline, padded to a whole byte, MSB first). A set bit means
//! opaque; a clear bit means the corresponding pixel is fully transparent.
//!
//! Unlike Raw/CopyRect/Tight, this never touches the session canvas - a
//! cursor shape isn't part of the framebuffer. The rectangle header's
//! `(x, y)` is the cursor's hotspot, and `(width, height)` its dimensions.

use crate::{DecodeError, DecodeOutcome, ENCODING_CURSOR};
use vnc_replay_pixelbuffer::{encode_rgba_png, PixelFormat};
use vnc_replay_protocol::messages::types::Rectangle;

pub struct CursorDecoder;

impl CursorDecoder {
    pub fn encoding_type(&self) -> i32 {
        ENCODING_CURSOR
    }

    /// Decodes a Cursor rectangle. Returns `(bytes_consumed, outcome)`.
    pub fn decode(
        &self,
        payload: &[u8],
        rect: &Rectangle,
        pixel_format: &PixelFormat,
    ) -> (usize, Result<DecodeOutcome, DecodeError>) {
        let width = rect.width as usize;
        let height = rect.height as usize;
        if width == 0 || height == 0 {
            return (0, Ok(DecodeOutcome::None));
        }

        let bpp = pixel_format.bytes_per_pixel() as usize;
        let mut rgba = vec![0u8; width * height * 4];
        let mut consumed = 0usize;

        'pixels: for row in 0..height {
            for col in 0..width {
                if consumed + bpp > payload.len() {
                    break 'pixels;
                }
                let (n, pixel, _invalid) =
                    pixel_format.read_pixel(&payload[consumed..consumed + bpp]);
                consumed += n;
                let dst = (row * width + col) * 4;
                rgba[dst..dst + 4].copy_from_slice(&pixel);
            }
        }

        let mask_row_bytes = width.div_ceil(8);
        let mask_start = consumed;
        let mask_len = mask_row_bytes * height;
        let mask_end = (mask_start + mask_len).min(payload.len());

        for row in 0..height {
            for col in 0..width {
                let byte_idx = mask_start + row * mask_row_bytes + col / 8;
                let opaque = if byte_idx < mask_end {
                    let bit = 7 - (col % 8);
                    (payload[byte_idx] >> bit) & 1 == 1
                } else {
                    false
                };
                if !opaque {
                    rgba[(row * width + col) * 4 + 3] = 0;
                }
            }
        }
        consumed = mask_end.max(consumed);

        match encode_rgba_png(width as u32, height as u32, &rgba) {
            Some(png) => (
                consumed,
                Ok(DecodeOutcome::Cursor {
                    png,
                    hot_x: rect.x,
                    hot_y: rect.y,
                }),
            ),
            None => (consumed, Ok(DecodeOutcome::None)),
        }
    }
}
