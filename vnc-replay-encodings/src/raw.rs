//! Raw encoding decoder - uncompressed pixel data.
//!
//! Raw encoding (type 0) transmits pixels as uncompressed data in the
//! server's pixel format: `width * height * bytes_per_pixel` bytes, no
//! compression applied.

use crate::{DecodeError, DecodeOutcome, ENCODING_RAW};
use vnc_replay_pixelbuffer::{Canvas, PixelFormat};
use vnc_replay_protocol::messages::types::Rectangle;

pub struct RawDecoder;

impl RawDecoder {
    pub fn encoding_type(&self) -> i32 {
        ENCODING_RAW
    }

    /// Decodes a Raw rectangle. Returns `(bytes_consumed, outcome)`.
    ///
    /// If `payload` runs out partway through the rectangle, the partial
    /// image decoded so far is still returned (per the testable-property
    /// requirement that a truncated Raw/Cursor rectangle still renders
    /// something), and the consumed count reflects only what was available.
    pub fn decode(
        &self,
        payload: &[u8],
        rect: &Rectangle,
        pixel_format: &PixelFormat,
        canvas: &mut Canvas,
    ) -> (usize, Result<DecodeOutcome, DecodeError>) {
        let width = rect.width as usize;
        let height = rect.height as usize;
        if width == 0 || height == 0 {
            return (0, Ok(DecodeOutcome::None));
        }

        let bpp = pixel_format.bytes_per_pixel() as usize;
        let mut rgba = vec![0u8; width * height * 4];
        let mut consumed = 0usize;

        'rows: for row in 0..height {
            for col in 0..width {
                if consumed + bpp > payload.len() {
                    break 'rows;
                }
                let (n, pixel, _invalid) =
                    pixel_format.read_pixel(&payload[consumed..consumed + bpp]);
                consumed += n;
                let dst = (row * width + col) * 4;
                rgba[dst..dst + 4].copy_from_slice(&pixel);
            }
        }

        let dest = vnc_replay_common::Rect::new(rect.x as i32, rect.y as i32, rect.width as u32, rect.height as u32);
        canvas.blit_rgba(dest, &rgba);
        let png = canvas.crop_png(dest);

        match png {
            Some(payload) => (
                consumed,
                Ok(DecodeOutcome::Rect {
                    payload,
                    mime: "image/png",
                }),
            ),
            None => (consumed, Ok(DecodeOutcome::None)),
        }
    }
}
