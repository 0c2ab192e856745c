//! The normalized packet shape the core consumes.
//!
//! Decoupled from whatever file format the packets originally came from - a
//! pcap reader lives in the `vnc-replay` binary crate and produces these;
//! nothing in this crate parses a capture file itself.

use crate::timed_buffer::TimedBuffer;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Packet {
    pub timestamp: Duration,
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub syn: bool,
    pub payload: Vec<u8>,
}

/// Demultiplexes a flat packet iterator into the two per-direction
/// `TimedBuffer`s, per SPEC_FULL.md §6's packet ingestion contract:
///
/// - The first segment observed defines the server port (its destination)
///   and the client port (its source).
/// - A `syn` segment records `seq + 1` as that direction's initial sequence
///   number; later payload offsets are `seq - initial`. A direction that
///   never shows a SYN (a capture that starts mid-stream) falls back to
///   treating its first data segment's `seq` as the initial sequence, so at
///   least relative ordering within the capture is preserved.
/// - Zero-payload segments are ignored.
/// - Segments from any other port pair are ignored with a warning.
pub fn demux(packets: impl IntoIterator<Item = Packet>) -> (TimedBuffer, TimedBuffer) {
    let mut client_buf = TimedBuffer::new();
    let mut server_buf = TimedBuffer::new();

    let mut ports: Option<(u16, u16)> = None; // (client_port, server_port)
    let mut client_initial: Option<u32> = None;
    let mut server_initial: Option<u32> = None;

    for packet in packets {
        let (client_port, server_port) = *ports.get_or_insert((packet.src_port, packet.dst_port));

        let is_client_to_server = packet.src_port == client_port && packet.dst_port == server_port;
        let is_server_to_client = packet.src_port == server_port && packet.dst_port == client_port;

        if !is_client_to_server && !is_server_to_client {
            tracing::warn!(
                src = packet.src_port,
                dst = packet.dst_port,
                "ignoring segment outside the established client/server port pair"
            );
            continue;
        }

        let initial = if is_client_to_server {
            &mut client_initial
        } else {
            &mut server_initial
        };
        if packet.syn {
            *initial = Some(packet.seq.wrapping_add(1));
            continue;
        }
        if packet.payload.is_empty() {
            continue;
        }
        let initial = *initial.get_or_insert(packet.seq);
        let offset = packet.seq.wrapping_sub(initial) as usize;

        let buf = if is_client_to_server {
            &mut client_buf
        } else {
            &mut server_buf
        };
        if let Err(e) = buf.add(packet.timestamp, offset, &packet.payload) {
            tracing::warn!(error = %e, "dropping segment that could not be reassembled");
        }
    }

    (client_buf, server_buf)
}
