//! Server-to-client RFB messages.
//!
//! As in `client.rs`, every `read_from` receives the body *after* the leading
//! message-type byte and returns `(Self, bytes_consumed)`. `FramebufferUpdate`
//! parses only rectangle headers; the pixel payload that follows each header
//! is the job of `vnc-replay-encodings`.

use super::types::{PixelFormat, Rectangle};

/// ServerInit - the server's half of the init handshake.
///
/// # Wire Format
/// - 2 bytes width, 2 bytes height, 16 bytes [`PixelFormat`], 4 bytes name
///   length, N bytes name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInit {
    pub framebuffer_width: u16,
    pub framebuffer_height: u16,
    pub pixel_format: PixelFormat,
    pub name: String,
}

impl ServerInit {
    pub fn read_from(bytes: &[u8]) -> (Self, usize) {
        let framebuffer_width = u16::from_be_bytes([bytes[0], bytes[1]]);
        let framebuffer_height = u16::from_be_bytes([bytes[2], bytes[3]]);
        let pixel_format = PixelFormat::read_from(&bytes[4..]);
        let name_offset = 4 + PixelFormat::WIRE_LEN;
        let name_length = u32::from_be_bytes([
            bytes[name_offset],
            bytes[name_offset + 1],
            bytes[name_offset + 2],
            bytes[name_offset + 3],
        ]) as usize;
        let name_start = name_offset + 4;
        let name =
            String::from_utf8_lossy(&bytes[name_start..name_start + name_length]).to_string();
        (
            Self {
                framebuffer_width,
                framebuffer_height,
                pixel_format,
                name,
            },
            name_start + name_length,
        )
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.framebuffer_width.to_be_bytes());
        out.extend_from_slice(&self.framebuffer_height.to_be_bytes());
        self.pixel_format.write_to(out);
        out.extend_from_slice(&(self.name.len() as u32).to_be_bytes());
        out.extend_from_slice(self.name.as_bytes());
    }
}

/// FramebufferUpdate - message type 0. Only rectangle headers; the caller
/// decodes each rectangle's pixel payload according to its encoding before
/// moving on to the next header.
///
/// # Wire Format
/// - 1 byte padding, 2 bytes rectangle count, then one 12-byte header per
///   rectangle (pixel data is not part of this struct).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferUpdateHeader {
    pub rectangle_count: u16,
}

impl FramebufferUpdateHeader {
    pub const LEN: usize = 3;

    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            rectangle_count: u16::from_be_bytes([bytes[1], bytes[2]]),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(0);
        out.push(0);
        out.extend_from_slice(&self.rectangle_count.to_be_bytes());
    }
}

/// Color map entry (RGB triplet), used by [`SetColorMapEntries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMapEntry {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// SetColorMapEntries - message type 1. Rare on true-color servers but must
/// still be parsed to keep the dispatcher's cursor in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetColorMapEntries {
    pub first_color: u16,
    pub colors: Vec<ColorMapEntry>,
}

impl SetColorMapEntries {
    pub fn read_from(bytes: &[u8]) -> (Self, usize) {
        let first_color = u16::from_be_bytes([bytes[1], bytes[2]]);
        let count = u16::from_be_bytes([bytes[3], bytes[4]]) as usize;
        let mut colors = Vec::with_capacity(count);
        let mut offset = 5;
        for _ in 0..count {
            colors.push(ColorMapEntry {
                red: u16::from_be_bytes([bytes[offset], bytes[offset + 1]]),
                green: u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]),
                blue: u16::from_be_bytes([bytes[offset + 4], bytes[offset + 5]]),
            });
            offset += 6;
        }
        (
            Self {
                first_color,
                colors,
            },
            offset,
        )
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(1);
        out.push(0);
        out.extend_from_slice(&self.first_color.to_be_bytes());
        out.extend_from_slice(&(self.colors.len() as u16).to_be_bytes());
        for c in &self.colors {
            out.extend_from_slice(&c.red.to_be_bytes());
            out.extend_from_slice(&c.green.to_be_bytes());
            out.extend_from_slice(&c.blue.to_be_bytes());
        }
    }
}

/// Bell - message type 2. No body beyond the message type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bell;

impl Bell {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(2);
    }
}

/// ServerCutText - message type 3. Clipboard text pushed from server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCutText {
    pub text: String,
}

impl ServerCutText {
    pub fn read_from(bytes: &[u8]) -> (Self, usize) {
        let length = u32::from_be_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]) as usize;
        let text = String::from_utf8_lossy(&bytes[7..7 + length]).to_string();
        (Self { text }, 7 + length)
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(3);
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&(self.text.len() as u32).to_be_bytes());
        out.extend_from_slice(self.text.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::types::ENCODING_RAW;

    fn sample_pixel_format() -> PixelFormat {
        PixelFormat {
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
        }
    }

    #[test]
    fn server_init_round_trip() {
        let original = ServerInit {
            framebuffer_width: 1920,
            framebuffer_height: 1080,
            pixel_format: sample_pixel_format(),
            name: "Test Desktop".to_string(),
        };
        let mut buf = Vec::new();
        original.write_to(&mut buf);
        let (read_back, consumed) = ServerInit::read_from(&buf);
        assert_eq!(original, read_back);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn framebuffer_update_header_round_trip() {
        let original = FramebufferUpdateHeader {
            rectangle_count: 3,
        };
        let mut buf = Vec::new();
        original.write_to(&mut buf);
        assert_eq!(FramebufferUpdateHeader::read_from(&buf[1..]), original);
    }

    #[test]
    fn rectangle_header_after_update_header() {
        let rect = Rectangle {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
            encoding: ENCODING_RAW,
        };
        let mut buf = Vec::new();
        rect.write_to(&mut buf);
        assert_eq!(Rectangle::read_from(&buf), rect);
    }

    #[test]
    fn set_colormap_entries_round_trip() {
        let original = SetColorMapEntries {
            first_color: 10,
            colors: vec![
                ColorMapEntry {
                    red: 65535,
                    green: 0,
                    blue: 0,
                },
                ColorMapEntry {
                    red: 0,
                    green: 65535,
                    blue: 0,
                },
            ],
        };
        let mut buf = Vec::new();
        original.write_to(&mut buf);
        let (read_back, consumed) = SetColorMapEntries::read_from(&buf[1..]);
        assert_eq!(original, read_back);
        assert_eq!(consumed, buf.len() - 1);
    }

    #[test]
    fn bell_is_one_byte() {
        let mut buf = Vec::new();
        Bell.write_to(&mut buf);
        assert_eq!(buf, vec![2]);
    }

    #[test]
    fn server_cut_text_round_trip() {
        let original = ServerCutText {
            text: "Hello, clipboard!".to_string(),
        };
        let mut buf = Vec::new();
        original.write_to(&mut buf);
        let (read_back, consumed) = ServerCutText::read_from(&buf[1..]);
        assert_eq!(original, read_back);
        assert_eq!(consumed, buf.len() - 1);
    }
}
