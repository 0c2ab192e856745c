//! Consumes the fixed RFB handshake dialogue from both directions.
//!
//! A one-shot, purely synchronous walk over already-fully-captured buffers:
//! there is no partial-read retry loop and no timeout, since the whole
//! dialogue is either present in the reassembled bytes already or the
//! replay fails fast with the appropriate fatal token.

use crate::error::ReplayError;
use crate::timed_buffer::TimedBuffer;
use std::time::Duration;
use vnc_replay_pixelbuffer::PixelFormat;
use vnc_replay_protocol::messages::types::{PixelFormat as WirePixelFormat, SECURITY_TYPE_VNC_AUTH};

pub struct HandshakeResult {
    pub width: u16,
    pub height: u16,
    pub pixel_format: PixelFormat,
    pub name: String,
    pub time_origin: Duration,
}

/// Walks the handshake, leaving both buffers positioned at their first
/// post-handshake protocol message.
pub fn run(client: &mut TimedBuffer, server: &mut TimedBuffer) -> Result<HandshakeResult, ReplayError> {
    // 1. server version banner (ignored).
    if server.consume(12).len() != 12 {
        return Err(ReplayError::ServerRejected);
    }
    tracing::debug!("server version banner consumed");

    // 2. client version banner (ignored).
    if client.consume(12).len() != 12 {
        return Err(ReplayError::ClientRejected);
    }
    tracing::debug!("client version banner consumed");

    // 3. server security-type list.
    let n_sec = server.consume(1);
    if n_sec.len() != 1 {
        return Err(ReplayError::ServerRejected);
    }
    let n_sec = n_sec[0] as usize;
    if server.consume(n_sec).len() != n_sec {
        return Err(ReplayError::ServerRejected);
    }

    // 4. client's chosen security type.
    let sec = client.consume(1);
    if sec.len() != 1 {
        return Err(ReplayError::ClientRejected);
    }
    let sec = sec[0];
    if sec != SECURITY_TYPE_VNC_AUTH {
        return Err(ReplayError::UnsupportedAuth(sec));
    }

    // 5. challenge/response, ignored - the trace is passive.
    if server.consume(16).len() != 16 {
        return Err(ReplayError::ServerRejected);
    }
    if client.consume(16).len() != 16 {
        return Err(ReplayError::ClientRejected);
    }

    // 6. securityResult.
    let result = server.consume(4);
    if result.len() != 4 {
        return Err(ReplayError::ServerRejected);
    }
    let security_result = u32::from_be_bytes([result[0], result[1], result[2], result[3]]);
    if security_result != 0 {
        return Err(ReplayError::AuthFailed(security_result));
    }

    // 7. client shared-flag; time_origin is recorded at this instant.
    if client.consume(1).len() != 1 {
        return Err(ReplayError::ClientRejected);
    }
    let time_origin = server.current_time();
    tracing::debug!(?time_origin, "handshake complete, time origin recorded");

    // 8. server init: width, height, pixel format, name.
    let header = server.consume(24);
    if header.len() != 24 {
        return Err(ReplayError::ServerRejected);
    }
    let width = u16::from_be_bytes([header[0], header[1]]);
    let height = u16::from_be_bytes([header[2], header[3]]);
    let wire_pixel_format = WirePixelFormat::read_from(&header[4..20]);
    let name_len = u32::from_be_bytes([header[20], header[21], header[22], header[23]]) as usize;
    let name_bytes = server.consume(name_len);
    if name_bytes.len() != name_len {
        return Err(ReplayError::ServerRejected);
    }
    let name = String::from_utf8_lossy(name_bytes).to_string();

    Ok(HandshakeResult {
        width,
        height,
        pixel_format: PixelFormat::from(wire_pixel_format),
        name,
        time_origin,
    })
}
