//! A small, purpose-built reader for classic libpcap savefiles.
//!
//! There is no ambient pcap-parsing crate in this workspace's stack, so this
//! unwraps the global header, per-packet headers, and the Ethernet/IPv4/TCP
//! headers by hand. It only needs to produce the `vnc_replay_core::Packet`
//! shape the core consumes - anything the replay doesn't need (IP options,
//! fragmentation, non-TCP protocols) is read just far enough to be skipped.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use vnc_replay_core::Packet;

const MAGIC_LE: u32 = 0xa1b2_c3d4;
const MAGIC_BE: u32 = 0xd4c3_b2a1;
const GLOBAL_HEADER_LEN: usize = 24;
const PACKET_HEADER_LEN: usize = 16;
const ETHERNET_HEADER_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;
const PROTO_TCP: u8 = 6;

enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(&self, b: &[u8]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes([b[0], b[1]]),
            Endian::Big => u16::from_be_bytes([b[0], b[1]]),
        }
    }

    fn u32(&self, b: &[u8]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            Endian::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        }
    }
}

/// Parses a full savefile into TCP segments, in capture order. Non-Ethernet,
/// non-IPv4, non-TCP, or zero-payload frames are silently dropped - the
/// demuxer downstream only cares about the two TCP directions of the RFB
/// connection.
pub fn read_tcp_segments(data: &[u8]) -> Result<Vec<Packet>> {
    if data.len() < GLOBAL_HEADER_LEN {
        bail!("pcap file too short for a global header");
    }
    let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let endian = if magic == MAGIC_LE {
        Endian::Little
    } else if u32::from_be_bytes([data[0], data[1], data[2], data[3]]) == MAGIC_BE {
        Endian::Big
    } else {
        bail!("not a libpcap savefile (unrecognized magic {magic:#010x})");
    };
    let linktype = endian.u32(&data[20..24]);
    if linktype != 1 {
        bail!("unsupported linktype {linktype}, only Ethernet (1) is supported");
    }

    let mut packets = Vec::new();
    let mut offset = GLOBAL_HEADER_LEN;
    while offset < data.len() {
        if offset + PACKET_HEADER_LEN > data.len() {
            bail!("truncated packet header at offset {offset:#x}");
        }
        let header = &data[offset..offset + PACKET_HEADER_LEN];
        let ts_sec = endian.u32(&header[0..4]);
        let ts_usec = endian.u32(&header[4..8]);
        let incl_len = endian.u32(&header[8..12]) as usize;
        offset += PACKET_HEADER_LEN;

        if offset + incl_len > data.len() {
            bail!("truncated packet body at offset {offset:#x}");
        }
        let frame = &data[offset..offset + incl_len];
        offset += incl_len;

        let timestamp = Duration::new(ts_sec as u64, 0) + Duration::from_micros(ts_usec as u64);
        if let Some(packet) = parse_ethernet_frame(frame, timestamp)
            .with_context(|| format!("parsing frame at pcap offset {offset:#x}"))?
        {
            packets.push(packet);
        }
    }
    Ok(packets)
}

fn parse_ethernet_frame(frame: &[u8], timestamp: Duration) -> Result<Option<Packet>> {
    if frame.len() < ETHERNET_HEADER_LEN {
        return Ok(None);
    }
    let ethertype = u16::from_be_bytes([frame[12], frame[13]]);
    if ethertype != ETHERTYPE_IPV4 {
        return Ok(None);
    }
    parse_ipv4_packet(&frame[ETHERNET_HEADER_LEN..], timestamp)
}

fn parse_ipv4_packet(ip: &[u8], timestamp: Duration) -> Result<Option<Packet>> {
    if ip.len() < 20 {
        return Ok(None);
    }
    let version = ip[0] >> 4;
    if version != 4 {
        return Ok(None);
    }
    let ihl = ((ip[0] & 0x0f) as usize) * 4;
    if ihl < 20 || ip.len() < ihl {
        bail!("malformed IPv4 header (IHL {ihl})");
    }
    let total_length = u16::from_be_bytes([ip[2], ip[3]]) as usize;
    let protocol = ip[9];
    if protocol != PROTO_TCP {
        return Ok(None);
    }
    let end = total_length.min(ip.len());
    if end <= ihl {
        return Ok(None);
    }
    parse_tcp_segment(&ip[ihl..end], timestamp)
}

fn parse_tcp_segment(tcp: &[u8], timestamp: Duration) -> Result<Option<Packet>> {
    if tcp.len() < 20 {
        return Ok(None);
    }
    let src_port = u16::from_be_bytes([tcp[0], tcp[1]]);
    let dst_port = u16::from_be_bytes([tcp[2], tcp[3]]);
    let seq = u32::from_be_bytes([tcp[4], tcp[5], tcp[6], tcp[7]]);
    let data_offset = ((tcp[12] >> 4) as usize) * 4;
    if data_offset < 20 || tcp.len() < data_offset {
        bail!("malformed TCP header (data offset {data_offset})");
    }
    let syn = tcp[13] & 0x02 != 0;
    let payload = tcp[data_offset..].to_vec();
    if payload.is_empty() && !syn {
        return Ok(None);
    }

    Ok(Some(Packet {
        timestamp,
        src_port,
        dst_port,
        seq,
        syn,
        payload,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_header(magic: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&magic.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes()); // version_major
        out.extend_from_slice(&4u16.to_le_bytes()); // version_minor
        out.extend_from_slice(&0i32.to_le_bytes()); // thiszone
        out.extend_from_slice(&0u32.to_le_bytes()); // sigfigs
        out.extend_from_slice(&65535u32.to_le_bytes()); // snaplen
        out.extend_from_slice(&1u32.to_le_bytes()); // linktype = Ethernet
        out
    }

    fn ethernet_ipv4_tcp_frame(src_port: u16, dst_port: u16, seq: u32, syn: bool, payload: &[u8]) -> Vec<u8> {
        let mut tcp = Vec::new();
        tcp.extend_from_slice(&src_port.to_be_bytes());
        tcp.extend_from_slice(&dst_port.to_be_bytes());
        tcp.extend_from_slice(&seq.to_be_bytes());
        tcp.extend_from_slice(&0u32.to_be_bytes()); // ack
        tcp.push(5 << 4); // data offset = 5 words = 20 bytes, no options
        tcp.push(if syn { 0x02 } else { 0x10 }); // SYN or ACK
        tcp.extend_from_slice(&0u16.to_be_bytes()); // window
        tcp.extend_from_slice(&0u16.to_be_bytes()); // checksum
        tcp.extend_from_slice(&0u16.to_be_bytes()); // urgent ptr
        tcp.extend_from_slice(payload);

        let mut ip = Vec::new();
        ip.push(0x45); // version 4, IHL 5
        ip.push(0); // DSCP/ECN
        ip.extend_from_slice(&((20 + tcp.len()) as u16).to_be_bytes());
        ip.extend_from_slice(&0u16.to_be_bytes()); // identification
        ip.extend_from_slice(&0u16.to_be_bytes()); // flags/fragment offset
        ip.push(64); // TTL
        ip.push(PROTO_TCP);
        ip.extend_from_slice(&0u16.to_be_bytes()); // checksum
        ip.extend_from_slice(&[127, 0, 0, 1]);
        ip.extend_from_slice(&[127, 0, 0, 1]);
        ip.extend_from_slice(&tcp);

        let mut frame = Vec::new();
        frame.extend_from_slice(&[0u8; 6]); // dst mac
        frame.extend_from_slice(&[0u8; 6]); // src mac
        frame.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
        frame.extend_from_slice(&ip);
        frame
    }

    fn packet_record(frame: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u32.to_le_bytes()); // ts_sec
        out.extend_from_slice(&0u32.to_le_bytes()); // ts_usec
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes()); // incl_len
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes()); // orig_len
        out.extend_from_slice(frame);
        out
    }

    #[test]
    fn rejects_non_pcap_magic() {
        let err = read_tcp_segments(&[0, 1, 2, 3, 4, 5, 6, 7]).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn parses_syn_and_data_segments() {
        let mut file = global_header(MAGIC_LE);
        file.extend_from_slice(&packet_record(&ethernet_ipv4_tcp_frame(5000, 5900, 0, true, &[])));
        file.extend_from_slice(&packet_record(&ethernet_ipv4_tcp_frame(5900, 5000, 100, false, b"hello")));

        let packets = read_tcp_segments(&file).unwrap();
        assert_eq!(packets.len(), 2);
        assert!(packets[0].syn);
        assert_eq!(packets[1].payload, b"hello");
        assert_eq!(packets[1].seq, 100);
    }

    #[test]
    fn ignores_zero_payload_non_syn_segments() {
        let mut file = global_header(MAGIC_LE);
        file.extend_from_slice(&packet_record(&ethernet_ipv4_tcp_frame(5000, 5900, 0, true, &[])));
        file.extend_from_slice(&packet_record(&ethernet_ipv4_tcp_frame(5900, 5000, 1, false, &[])));

        let packets = read_tcp_segments(&file).unwrap();
        assert_eq!(packets.len(), 1);
    }
}
