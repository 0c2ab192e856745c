//! Core RFB wire types.
//!
//! This module defines the fixed-size structures that appear literally on the wire:
//! - [`PixelFormat`] - the 16-byte pixel format descriptor (RFB section 7.4)
//! - [`Rectangle`] - the 12-byte rectangle header that precedes every encoded rectangle
//! - Encoding / security type constants
//!
//! Unlike the teacher crate, these are parsed synchronously from an already-buffered
//! slice (`TimedBuffer` peeks, not a live `AsyncRead` socket) — there is nothing to
//! await when every byte the handshake or dispatcher needs has already arrived.

/// RFB pixel format specification, exactly as it appears on the wire (16 bytes).
///
/// Boolean fields are kept as raw `u8` here (0/1, as transmitted) rather than
/// `bool`; [`vnc_replay_pixelbuffer::PixelFormat`] is the interpreted value object
/// derived from this via `From`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: u8,
    pub true_color: u8,
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl PixelFormat {
    pub const WIRE_LEN: usize = 16;

    pub fn bytes_per_pixel(&self) -> u8 {
        self.bits_per_pixel.div_ceil(8)
    }

    /// Parses the 16-byte wire layout. `bytes` must be at least 16 bytes long.
    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            bits_per_pixel: bytes[0],
            depth: bytes[1],
            big_endian: bytes[2],
            true_color: bytes[3],
            red_max: u16::from_be_bytes([bytes[4], bytes[5]]),
            green_max: u16::from_be_bytes([bytes[6], bytes[7]]),
            blue_max: u16::from_be_bytes([bytes[8], bytes[9]]),
            red_shift: bytes[10],
            green_shift: bytes[11],
            blue_shift: bytes[12],
            // bytes[13..16] are padding, ignored on read.
        }
    }

    /// Serializes back to the 16-byte wire layout (used only by tests here;
    /// the replay tool never re-transmits a handshake).
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.bits_per_pixel);
        out.push(self.depth);
        out.push(self.big_endian);
        out.push(self.true_color);
        out.extend_from_slice(&self.red_max.to_be_bytes());
        out.extend_from_slice(&self.green_max.to_be_bytes());
        out.extend_from_slice(&self.blue_max.to_be_bytes());
        out.push(self.red_shift);
        out.push(self.green_shift);
        out.push(self.blue_shift);
        out.extend_from_slice(&[0, 0, 0]);
    }
}

/// Rectangle header for framebuffer updates (12 bytes on the wire).
///
/// Only the header; the pixel payload that follows is parsed separately by
/// `vnc-replay-encodings` according to `encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub encoding: i32,
}

impl Rectangle {
    pub const HEADER_LEN: usize = 12;

    /// Parses a 12-byte rectangle header. `bytes` must be at least 12 bytes long.
    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            x: u16::from_be_bytes([bytes[0], bytes[1]]),
            y: u16::from_be_bytes([bytes[2], bytes[3]]),
            width: u16::from_be_bytes([bytes[4], bytes[5]]),
            height: u16::from_be_bytes([bytes[6], bytes[7]]),
            encoding: i32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_be_bytes());
        out.extend_from_slice(&self.y.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.encoding.to_be_bytes());
    }
}

//
// Encoding type constants (RFB / TigerVNC registry).
//

/// Raw encoding - uncompressed pixel data.
pub const ENCODING_RAW: i32 = 0;
/// CopyRect encoding - copy a block already present in the framebuffer.
pub const ENCODING_COPYRECT: i32 = 1;
/// Tight encoding - JPEG, zlib, palette, and solid-fill sub-types.
pub const ENCODING_TIGHT: i32 = 7;
/// PointerPos pseudo-encoding - cursor position only, no pixels.
pub const ENCODING_POINTER_POS: i32 = -232;
/// Cursor pseudo-encoding - cursor shape plus an alpha bitmask.
pub const ENCODING_CURSOR: i32 = -239;

//
// Security type constants.
//

/// No security - not supported by this passive-trace decoder.
pub const SECURITY_TYPE_NONE: u8 = 1;
/// VNC authentication - the only security type this decoder understands.
pub const SECURITY_TYPE_VNC_AUTH: u8 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_round_trip() {
        let original = PixelFormat {
            bits_per_pixel: 32,
            depth: 24,
            big_endian: 0,
            true_color: 1,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        };
        let mut buf = Vec::new();
        original.write_to(&mut buf);
        assert_eq!(buf.len(), PixelFormat::WIRE_LEN);
        let read_back = PixelFormat::read_from(&buf);
        assert_eq!(original, read_back);
    }

    #[test]
    fn rectangle_round_trip() {
        let original = Rectangle {
            x: 100,
            y: 200,
            width: 640,
            height: 480,
            encoding: ENCODING_RAW,
        };
        let mut buf = Vec::new();
        original.write_to(&mut buf);
        assert_eq!(buf.len(), Rectangle::HEADER_LEN);
        let read_back = Rectangle::read_from(&buf);
        assert_eq!(original, read_back);
    }

    #[test]
    fn rectangle_negative_encoding_round_trips() {
        let original = Rectangle {
            x: 0,
            y: 0,
            width: 16,
            height: 16,
            encoding: ENCODING_CURSOR,
        };
        let mut buf = Vec::new();
        original.write_to(&mut buf);
        assert_eq!(Rectangle::read_from(&buf).encoding, ENCODING_CURSOR);
    }

    #[test]
    fn bytes_per_pixel() {
        let pf = PixelFormat {
            bits_per_pixel: 15,
            depth: 15,
            big_endian: 0,
            true_color: 1,
            red_max: 31,
            green_max: 31,
            blue_max: 31,
            red_shift: 10,
            green_shift: 5,
            blue_shift: 0,
        };
        assert_eq!(pf.bytes_per_pixel(), 2);
    }
}
