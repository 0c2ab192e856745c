//! Client-to-server RFB messages.
//!
//! Every `read_from` here receives the message body *after* the leading
//! message-type byte (the dispatcher in `vnc-replay-core` reads that byte to
//! pick which parser to call) and returns `(Self, bytes_consumed)` so the
//! dispatcher can advance its cursor past variable-length bodies.

use super::types::PixelFormat;

/// ClientInit - sent once, right after the security handshake completes.
///
/// # Wire Format
/// - 1 byte: shared flag (0 = exclusive, 1 = shared)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInit {
    pub shared: bool,
}

impl ClientInit {
    pub const LEN: usize = 1;

    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            shared: bytes[0] != 0,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(if self.shared { 1 } else { 0 });
    }
}

/// SetPixelFormat - message type 0.
///
/// # Wire Format
/// - 3 bytes padding, 16 bytes [`PixelFormat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPixelFormat {
    pub pixel_format: PixelFormat,
}

impl SetPixelFormat {
    pub fn read_from(bytes: &[u8]) -> (Self, usize) {
        let pixel_format = PixelFormat::read_from(&bytes[3..]);
        (Self { pixel_format }, 3 + PixelFormat::WIRE_LEN)
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(0); // message type
        out.extend_from_slice(&[0, 0, 0]);
        self.pixel_format.write_to(out);
    }
}

/// SetEncodings - message type 2. Lists the encodings the client claims to
/// support, in preference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetEncodings {
    pub encodings: Vec<i32>,
}

impl SetEncodings {
    pub fn read_from(bytes: &[u8]) -> (Self, usize) {
        let count = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
        let mut encodings = Vec::with_capacity(count);
        let mut offset = 3;
        for _ in 0..count {
            encodings.push(i32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]));
            offset += 4;
        }
        (Self { encodings }, offset)
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(2);
        out.push(0);
        out.extend_from_slice(&(self.encodings.len() as u16).to_be_bytes());
        for e in &self.encodings {
            out.extend_from_slice(&e.to_be_bytes());
        }
    }
}

/// FramebufferUpdateRequest - message type 3. A replay trace never needs to
/// issue one itself, but client traces contain them, so they must be parsed
/// to stay in step with the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferUpdateRequest {
    pub incremental: bool,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl FramebufferUpdateRequest {
    pub const LEN: usize = 9;

    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            incremental: bytes[0] != 0,
            x: u16::from_be_bytes([bytes[1], bytes[2]]),
            y: u16::from_be_bytes([bytes[3], bytes[4]]),
            width: u16::from_be_bytes([bytes[5], bytes[6]]),
            height: u16::from_be_bytes([bytes[7], bytes[8]]),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(3);
        out.push(if self.incremental { 1 } else { 0 });
        out.extend_from_slice(&self.x.to_be_bytes());
        out.extend_from_slice(&self.y.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
    }
}

/// KeyEvent - message type 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub down: bool,
    pub key: u32,
}

impl KeyEvent {
    pub const LEN: usize = 7;

    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            down: bytes[0] != 0,
            key: u32::from_be_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(4);
        out.push(if self.down { 1 } else { 0 });
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&self.key.to_be_bytes());
    }
}

/// PointerEvent - message type 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub button_mask: u8,
    pub x: u16,
    pub y: u16,
}

impl PointerEvent {
    pub const LEN: usize = 5;

    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            button_mask: bytes[0],
            x: u16::from_be_bytes([bytes[1], bytes[2]]),
            y: u16::from_be_bytes([bytes[3], bytes[4]]),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(5);
        out.push(self.button_mask);
        out.extend_from_slice(&self.x.to_be_bytes());
        out.extend_from_slice(&self.y.to_be_bytes());
    }
}

/// ClientCutText - message type 6. Clipboard text pushed from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCutText {
    pub text: String,
}

impl ClientCutText {
    pub fn read_from(bytes: &[u8]) -> (Self, usize) {
        let length = u32::from_be_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]) as usize;
        let text = String::from_utf8_lossy(&bytes[7..7 + length]).to_string();
        (Self { text }, 7 + length)
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(6);
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&(self.text.len() as u32).to_be_bytes());
        out.extend_from_slice(self.text.as_bytes());
    }
}
