//! Replay events: the ordered log the `EventDispatcher` produces and the
//! `ReplayWriter` (in `vnc-replay-report`) later renders to HTML/JS.
//!
//! Payloads are kept as small typed structs here rather than pre-serialized
//! JSON - the exact JSON schemas named in the spec (`{Key}`, `{X,Y,Lmb,...}`,
//! etc.) are the writer's concern, not the dispatcher's.

/// A rectangle already rendered to an image, ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub mime: &'static str,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    KeyPress { key: u32 },
    KeyRelease { key: u32 },
    PointerUpdate {
        x: u16,
        y: u16,
        lmb: bool,
        rmb: bool,
        mmb: bool,
        scroll_up: bool,
        scroll_down: bool,
    },
    Framebuffer { id: String, rects: Vec<RenderedRect> },
    PointerSkin {
        id: Option<String>,
        default_cursor: bool,
        x: u16,
        y: u16,
        png: Option<Vec<u8>>,
    },
    ServerCutText { text: String },
}

impl EventPayload {
    /// The `kind` string used on the wire (`Event.kind` in the data model)
    /// and in the JS `PushEvent` call.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::KeyPress { .. } => "keypress",
            EventPayload::KeyRelease { .. } => "keyrelease",
            EventPayload::PointerUpdate { .. } => "pointerupdate",
            EventPayload::Framebuffer { .. } => "framebuffer",
            EventPayload::PointerSkin { .. } => "pointer-skin",
            EventPayload::ServerCutText { .. } => "server-cut-text",
        }
    }
}

/// One entry in the replay's ordered event log.
///
/// `t_ms` is `round((t_from_pcap_start - time_origin) * 10) / 10`, i.e.
/// milliseconds with one decimal digit of precision, per SPEC_FULL.md §4.5.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub t_ms: f64,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(t_ms: f64, payload: EventPayload) -> Self {
        Self { t_ms, payload }
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// A recoverable-error marker the dispatcher records alongside (but
/// separate from) the event log proper - SPEC_FULL.md §7's
/// `UNKNOWN_MESSAGE_TYPE`/`UNKNOWN_ENCODING`/`ZLIB_TRUNCATED` tokens. The
/// writer renders these as `-error`/`-todo` class `<div>`s rather than
/// pushing them through the JS player's event-kind machinery, since none of
/// them is one of the six event kinds the player understands.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub t_ms: f64,
    pub token: &'static str,
    pub detail: String,
}

/// Rounds a duration relative to `time_origin` to one decimal millisecond,
/// per the `t_ms_from_origin` formula in SPEC_FULL.md §4.5.
pub fn relative_millis(t: std::time::Duration, time_origin: std::time::Duration) -> f64 {
    let delta_ms = t.as_secs_f64() * 1000.0 - time_origin.as_secs_f64() * 1000.0;
    (delta_ms * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn relative_millis_rounds_to_one_decimal() {
        let origin = Duration::from_millis(0);
        let t = Duration::from_micros(100_250);
        assert_eq!(relative_millis(t, origin), 100.3);
    }

    #[test]
    fn events_report_their_kind() {
        let e = Event::new(1.0, EventPayload::KeyPress { key: 65 });
        assert_eq!(e.kind(), "keypress");
        let e = Event::new(1.0, EventPayload::ServerCutText { text: "hi".into() });
        assert_eq!(e.kind(), "server-cut-text");
    }
}
