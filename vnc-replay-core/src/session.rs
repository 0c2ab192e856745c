//! `Session`: owns both `TimedBuffer`s, the zlib stream set, the canvas, and
//! the merged-timeline event dispatcher.
//!
//! The dispatch loop is the synchronous replacement for the teacher's
//! `tokio::select!`-driven `event_loop.rs`: instead of awaiting whichever
//! socket has data, it peeks each `TimedBuffer`'s `current_time()` and
//! consumes the earlier one, tie going to the client (SPEC_FULL.md §4.5).

use crate::error::ReplayError;
use crate::event::{Diagnostic, Event, EventPayload, RenderedRect};
use crate::handshake;
use crate::packet::{demux, Packet};
use crate::timed_buffer::{TimedBuffer, SENTINEL};
use std::time::Duration;
use vnc_replay_encodings::{
    Canvas, CopyRectDecoder, CursorDecoder, DecodeError, DecodeOutcome, PixelFormat,
    PointerPosDecoder, RawDecoder, Rectangle, TightDecoder, ZlibStreamSet, ENCODING_COPY_RECT,
    ENCODING_CURSOR, ENCODING_POINTER_POS, ENCODING_RAW, ENCODING_TIGHT,
};
use vnc_replay_protocol::messages::client::{
    ClientCutText, FramebufferUpdateRequest, KeyEvent, PointerEvent, SetEncodings, SetPixelFormat,
};
use vnc_replay_protocol::messages::server::{FramebufferUpdateHeader, ServerCutText};
use vnc_replay_protocol::messages::types::PixelFormat as WirePixelFormat;

pub struct Session {
    client: TimedBuffer,
    server: TimedBuffer,
    zlib: ZlibStreamSet,
    pixel_format: PixelFormat,
    width: u16,
    height: u16,
    name: String,
    time_origin: Duration,
    canvas: Canvas,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    /// Demultiplexes `packets`, walks the handshake, and runs the dispatcher
    /// to completion. Returns the fully-populated session ready for
    /// `ReplayWriter` to render, or a fatal `ReplayError` if the handshake
    /// itself could not be completed.
    pub fn from_packets(packets: impl IntoIterator<Item = Packet>) -> Result<Self, ReplayError> {
        let (mut client, mut server) = demux(packets);
        let handshake = handshake::run(&mut client, &mut server)?;
        let canvas = Canvas::new(handshake.width as u32, handshake.height as u32);
        let mut session = Self {
            client,
            server,
            zlib: ZlibStreamSet::new(),
            pixel_format: handshake.pixel_format,
            width: handshake.width,
            height: handshake.height,
            name: handshake.name,
            time_origin: handshake.time_origin,
            canvas,
            events: Vec::new(),
            diagnostics: Vec::new(),
        };
        session.dispatch_loop();
        Ok(session)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixel_format(&self) -> &PixelFormat {
        &self.pixel_format
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn dispatch_loop(&mut self) {
        loop {
            let client_remaining = self.client.remaining();
            let server_remaining = self.server.remaining();
            if client_remaining == 0 && server_remaining == 0 {
                break;
            }
            if client_remaining == 0 {
                self.dispatch_server_once();
                continue;
            }
            if server_remaining == 0 {
                self.dispatch_client_once();
                continue;
            }
            if self.client.current_time() <= self.server.current_time() {
                self.dispatch_client_once();
            } else {
                self.dispatch_server_once();
            }
        }
    }

    fn push_event(&mut self, t: Duration, payload: EventPayload) {
        let t_ms = crate::event::relative_millis(t, self.time_origin);
        self.events.push(Event::new(t_ms, payload));
    }

    fn push_diagnostic(&mut self, t: Duration, token: &'static str, detail: String) {
        let t_ms = crate::event::relative_millis(t, self.time_origin);
        self.diagnostics.push(Diagnostic { t_ms, token, detail });
    }

    fn dispatch_client_once(&mut self) {
        let offset = self.client.current_offset();
        let t = self.client.current_time();
        let msg_type = match self.client.peek(1).first().copied() {
            Some(b) => b,
            None => return,
        };
        self.client.consume(1);

        match msg_type {
            0 => {
                let body = self.client.peek(self.client.remaining()).to_vec();
                if body.len() < 3 + WirePixelFormat::WIRE_LEN {
                    self.warn_truncated_client(offset, "SetPixelFormat");
                    self.client.dump();
                    return;
                }
                let (msg, consumed) = SetPixelFormat::read_from(&body);
                self.client.consume(consumed);
                self.pixel_format = PixelFormat::from(msg.pixel_format);
            }
            2 => {
                let body = self.client.peek(self.client.remaining()).to_vec();
                if body.len() < 3 {
                    self.warn_truncated_client(offset, "SetEncodings");
                    self.client.dump();
                    return;
                }
                let count = u16::from_be_bytes([body[1], body[2]]) as usize;
                let total = 3 + 4 * count;
                if body.len() < total {
                    self.warn_truncated_client(offset, "SetEncodings");
                    self.client.dump();
                    return;
                }
                let (_msg, consumed) = SetEncodings::read_from(&body);
                self.client.consume(consumed);
            }
            3 => {
                let body = self.client.peek(FramebufferUpdateRequest::LEN);
                if body.len() != FramebufferUpdateRequest::LEN {
                    self.warn_truncated_client(offset, "FramebufferUpdateRequest");
                    self.client.dump();
                    return;
                }
                let _ = FramebufferUpdateRequest::read_from(body);
                self.client.consume(FramebufferUpdateRequest::LEN);
            }
            4 => {
                let body = self.client.peek(KeyEvent::LEN);
                if body.len() != KeyEvent::LEN {
                    self.warn_truncated_client(offset, "KeyEvent");
                    self.client.dump();
                    return;
                }
                let key_event = KeyEvent::read_from(body);
                self.client.consume(KeyEvent::LEN);
                let payload = if key_event.down {
                    EventPayload::KeyPress { key: key_event.key }
                } else {
                    EventPayload::KeyRelease { key: key_event.key }
                };
                self.push_event(t, payload);
            }
            5 => {
                let body = self.client.peek(PointerEvent::LEN);
                if body.len() != PointerEvent::LEN {
                    self.warn_truncated_client(offset, "PointerEvent");
                    self.client.dump();
                    return;
                }
                let pe = PointerEvent::read_from(body);
                self.client.consume(PointerEvent::LEN);
                let m = pe.button_mask;
                self.push_event(
                    t,
                    EventPayload::PointerUpdate {
                        x: pe.x,
                        y: pe.y,
                        lmb: m & 0x01 != 0,
                        rmb: m & 0x02 != 0,
                        mmb: m & 0x04 != 0,
                        scroll_up: m & 0x08 != 0,
                        scroll_down: m & 0x10 != 0,
                    },
                );
            }
            6 => {
                let body = self.client.peek(self.client.remaining()).to_vec();
                if body.len() < 7 {
                    self.client.dump();
                    return;
                }
                let length = u32::from_be_bytes([body[3], body[4], body[5], body[6]]) as usize;
                if body.len() < 7 + length {
                    self.client.dump();
                    return;
                }
                let (_msg, consumed) = ClientCutText::read_from(&body);
                self.client.consume(consumed);
            }
            SENTINEL => {
                // Exactly one sentinel byte was already consumed above; this
                // is the gap-recovery resync point, never a protocol error.
            }
            other => {
                tracing::warn!(
                    dir = "client",
                    r#type = other,
                    offset,
                    "unknown client message type"
                );
                self.push_diagnostic(
                    t,
                    "UNKNOWN_MESSAGE_TYPE",
                    format!("dir=client type={other} offset={offset:#x}"),
                );
                self.client.dump();
            }
        }
    }

    fn warn_truncated_client(&self, offset: usize, what: &str) {
        tracing::warn!(offset, what, "truncated client message, resyncing");
    }

    fn dispatch_server_once(&mut self) {
        let offset = self.server.current_offset();
        let t = self.server.current_time();
        let msg_type = match self.server.peek(1).first().copied() {
            Some(b) => b,
            None => return,
        };
        self.server.consume(1);

        match msg_type {
            0 => self.dispatch_framebuffer_update(offset, t),
            1 => {
                tracing::debug!(offset, "SetColourMapEntries not decoded, skipping to next boundary");
                self.push_diagnostic(t, "NOT_DECODED", "SetColourMapEntries".to_string());
                self.server.dump();
            }
            2 => {
                tracing::debug!(offset, "Bell not decoded, skipping to next boundary");
                self.push_diagnostic(t, "NOT_DECODED", "Bell".to_string());
                self.server.dump();
            }
            3 => {
                let body = self.server.peek(self.server.remaining()).to_vec();
                if body.len() < 7 {
                    self.server.dump();
                    return;
                }
                let length = u32::from_be_bytes([body[3], body[4], body[5], body[6]]) as usize;
                if body.len() < 7 + length {
                    self.server.dump();
                    return;
                }
                let (msg, consumed) = ServerCutText::read_from(&body);
                self.server.consume(consumed);
                self.push_event(t, EventPayload::ServerCutText { text: msg.text });
            }
            SENTINEL => {}
            other => {
                tracing::warn!(
                    dir = "server",
                    r#type = other,
                    offset,
                    "unknown server message type"
                );
                self.push_diagnostic(
                    t,
                    "UNKNOWN_MESSAGE_TYPE",
                    format!("dir=server type={other} offset={offset:#x}"),
                );
                self.server.dump();
            }
        }
    }

    fn dispatch_framebuffer_update(&mut self, offset: usize, t: Duration) {
        let header_bytes = self.server.peek(FramebufferUpdateHeader::LEN).to_vec();
        if header_bytes.len() != FramebufferUpdateHeader::LEN {
            tracing::warn!(offset, "truncated FramebufferUpdate header");
            self.server.dump();
            return;
        }
        let header = FramebufferUpdateHeader::read_from(&header_bytes);
        self.server.consume(FramebufferUpdateHeader::LEN);

        let mut rects = Vec::new();
        // (png, x, y); png is None for the "use system cursor" default case.
        let mut cursor_updates: Vec<(Option<Vec<u8>>, u16, u16)> = Vec::new();

        for _ in 0..header.rectangle_count {
            let rect_header = self.server.peek(Rectangle::HEADER_LEN).to_vec();
            if rect_header.len() != Rectangle::HEADER_LEN {
                tracing::warn!(offset, "truncated rectangle header");
                self.server.dump();
                break;
            }
            let rect = Rectangle::read_from(&rect_header);
            self.server.consume(Rectangle::HEADER_LEN);

            if rect.encoding == ENCODING_CURSOR && (rect.width == 0 || rect.height == 0) {
                cursor_updates.push((None, rect.x, rect.y));
                continue;
            }

            if !matches!(
                rect.encoding,
                ENCODING_RAW | ENCODING_COPY_RECT | ENCODING_TIGHT | ENCODING_POINTER_POS | ENCODING_CURSOR
            ) {
                self.push_diagnostic(t, "UNKNOWN_ENCODING", format!("tag={}", rect.encoding));
            }

            let payload = self.server.peek(self.server.remaining()).to_vec();
            let (consumed, outcome) = self.decode_rectangle(&rect, &payload);
            self.server.consume(consumed);
            match outcome {
                Ok(DecodeOutcome::Rect { payload, mime }) => rects.push(RenderedRect {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    mime,
                    payload,
                }),
                Ok(DecodeOutcome::Cursor { png, hot_x, hot_y }) => {
                    cursor_updates.push((Some(png), hot_x, hot_y));
                }
                Ok(DecodeOutcome::None) => {}
                Err(DecodeError::ZlibTruncated(stream_id)) => {
                    tracing::warn!(stream_id, offset, "zlib stream truncated, abandoning rest of update");
                    self.push_diagnostic(t, "ZLIB_TRUNCATED", format!("stream_id={stream_id}"));
                    self.server.dump();
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, offset, "recoverable rectangle decode error, abandoning rest of update");
                    self.server.dump();
                    break;
                }
            }
        }

        for (i, (png, x, y)) in cursor_updates.into_iter().enumerate() {
            let default_cursor = png.is_none();
            self.push_event(
                t,
                EventPayload::PointerSkin {
                    id: png.as_ref().map(|_| format!("cursor_{offset:08x}_{i}")),
                    default_cursor,
                    x,
                    y,
                    png,
                },
            );
        }
        if !rects.is_empty() {
            self.push_event(
                t,
                EventPayload::Framebuffer {
                    id: format!("framebuffer_{offset:08x}"),
                    rects,
                },
            );
        }
    }

    fn decode_rectangle(
        &mut self,
        rect: &Rectangle,
        payload: &[u8],
    ) -> (usize, Result<DecodeOutcome, DecodeError>) {
        match rect.encoding {
            ENCODING_RAW => RawDecoder.decode(payload, rect, &self.pixel_format, &mut self.canvas),
            ENCODING_COPY_RECT => CopyRectDecoder.decode(payload, rect, &mut self.canvas),
            ENCODING_TIGHT => TightDecoder.decode(payload, rect, &mut self.canvas, &mut self.zlib),
            ENCODING_POINTER_POS => PointerPosDecoder.decode(payload, rect),
            ENCODING_CURSOR => CursorDecoder.decode(payload, rect, &self.pixel_format),
            other => {
                tracing::warn!(tag = other, "unknown rectangle encoding, consuming rest of buffer");
                (payload.len(), Ok(DecodeOutcome::None))
            }
        }
    }
}
