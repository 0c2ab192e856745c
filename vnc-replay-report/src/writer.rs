//! Builds the self-contained HTML replay document.
//!
//! One `render()` pass walks the session's events and diagnostics in time
//! order, emitting a human-readable `<div>`/`<img>` per entry and, for the
//! six event kinds the player understands, a matching
//! `rfb.PushEvent([kind, t, payload])` call. Diagnostics never reach the
//! player - they are rendered as `-error`/`-todo` marker `<div>`s only.

use crate::payload::{
    FramebufferPayload, KeyPayload, PointerPayload, PointerSkinPayload, ServerCutTextPayload,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use vnc_replay_core::{Diagnostic, Event, EventPayload, ReplayError, Session};

const PLAYER_JS: &str = include_str!("../assets/player.js");

const STYLE: &str = r#"
body { font-family: sans-serif; background: #fafafa; color: #222; }
#remote-framebuffer-protocol { max-width: 960px; margin: 0 auto; }
#remote-framebuffer-protocol img { border: 1px solid #ccc; margin: 2px 0; }
.-error { color: #b00020; font-weight: bold; }
.-todo { color: #888; font-style: italic; }
"#;

/// Renders a [`Session`] to a self-contained HTML document.
pub struct ReplayWriter<'a> {
    session: &'a Session,
    embed_assets: bool,
}

impl<'a> ReplayWriter<'a> {
    pub fn new(session: &'a Session, embed_assets: bool) -> Self {
        Self { session, embed_assets }
    }

    /// Renders the full document. Writing it to disk is the binary crate's
    /// job (so that the inevitable I/O errors are `anyhow::Error` wrapped
    /// with `.context(...)`, per the workspace's error-handling convention);
    /// this only fails for the fatal `ASSET_MISSING` condition.
    pub fn render(&self) -> Result<String, ReplayError> {
        if self.embed_assets && PLAYER_JS.is_empty() {
            return Err(ReplayError::AssetMissing("player.js"));
        }
        tracing::debug!(
            events = self.session.events().len(),
            diagnostics = self.session.diagnostics().len(),
            embed_assets = self.embed_assets,
            "rendering replay"
        );

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>RFB replay</title>\n");
        out.push_str("<style>");
        out.push_str(STYLE);
        out.push_str("</style>\n</head><body>\n");
        out.push_str("<div id=\"remote-framebuffer-protocol\">\n");

        self.render_handshake_summary(&mut out);

        let mut push_lines = String::new();
        self.render_timeline(&mut out, &mut push_lines);

        out.push_str("</div>\n");

        out.push_str("<script>\n");
        if self.embed_assets {
            out.push_str(PLAYER_JS);
        }
        out.push_str("\n</script>\n");

        out.push_str("<script>\n");
        out.push_str(&format!(
            "rfb = new RFB({}, {});\n",
            self.session.width(),
            self.session.height()
        ));
        out.push_str(&push_lines);
        out.push_str("rfb.Render(document.getElementById(\"remote-framebuffer-protocol\"));\n");
        out.push_str("</script>\n");

        out.push_str("</body></html>\n");
        Ok(out)
    }

    fn render_handshake_summary(&self, out: &mut String) {
        out.push_str(&format!(
            "<div>Remote display {}x{}, {}</div>\n",
            self.session.width(),
            self.session.height(),
            self.session.pixel_format().describe()
        ));
        if !self.session.name().is_empty() {
            out.push_str(&format!(
                "<div>Server name: {}</div>\n",
                escape_html(self.session.name())
            ));
        }
    }

    fn render_timeline(&self, out: &mut String, push_lines: &mut String) {
        enum Item<'e> {
            Event(&'e Event),
            Diagnostic(&'e Diagnostic),
        }
        impl Item<'_> {
            fn t_ms(&self) -> f64 {
                match self {
                    Item::Event(e) => e.t_ms,
                    Item::Diagnostic(d) => d.t_ms,
                }
            }
        }

        let mut items: Vec<Item> = Vec::with_capacity(
            self.session.events().len() + self.session.diagnostics().len(),
        );
        items.extend(self.session.events().iter().map(Item::Event));
        items.extend(self.session.diagnostics().iter().map(Item::Diagnostic));
        items.sort_by(|a, b| a.t_ms().partial_cmp(&b.t_ms()).unwrap());

        for item in &items {
            match item {
                Item::Event(event) => self.render_event(out, push_lines, event),
                Item::Diagnostic(diag) => render_diagnostic(out, diag),
            }
        }
    }

    fn render_event(&self, out: &mut String, push_lines: &mut String, event: &Event) {
        let t = event.t_ms;
        match &event.payload {
            EventPayload::KeyPress { key } => {
                out.push_str(&format!("<div>Key press: {key:#x}</div>\n"));
                push_event(push_lines, "keypress", t, &KeyPayload { key: *key });
            }
            EventPayload::KeyRelease { key } => {
                out.push_str(&format!("<div>Key release: {key:#x}</div>\n"));
                push_event(push_lines, "keyrelease", t, &KeyPayload { key: *key });
            }
            EventPayload::PointerUpdate {
                x,
                y,
                lmb,
                rmb,
                mmb,
                scroll_up,
                scroll_down,
            } => {
                out.push_str(&format!("<div>Pointer: ({x}, {y})</div>\n"));
                push_event(
                    push_lines,
                    "pointerupdate",
                    t,
                    &PointerPayload {
                        x: *x,
                        y: *y,
                        lmb: *lmb,
                        rmb: *rmb,
                        mmb: *mmb,
                        su: *scroll_up,
                        sd: *scroll_down,
                    },
                );
            }
            EventPayload::Framebuffer { id, rects } => {
                out.push_str(&format!(
                    "<div>Framebuffer update ({} rect(s)):</div>\n",
                    rects.len()
                ));
                for (i, rect) in rects.iter().enumerate() {
                    let b64 = BASE64.encode(&rect.payload);
                    out.push_str(&format!(
                        "<img id=\"{id}_{i}\" data-x=\"{}\" data-y=\"{}\" data-width=\"{}\" data-height=\"{}\" width=\"{}\" height=\"{}\" src=\"data:{};base64,{}\">\n",
                        rect.x, rect.y, rect.width, rect.height, rect.width, rect.height, rect.mime, b64
                    ));
                }
                push_event(
                    push_lines,
                    "framebuffer",
                    t,
                    &FramebufferPayload { id: id.clone() },
                );
            }
            EventPayload::PointerSkin {
                id,
                default_cursor,
                x,
                y,
                png,
            } => {
                if *default_cursor {
                    out.push_str("<div>Pointer skin: use the default cursor from here.</div>\n");
                } else if let (Some(id), Some(png)) = (id, png) {
                    let b64 = BASE64.encode(png);
                    out.push_str(&format!(
                        "<div>Pointer skin update at ({x}, {y}):</div>\n<img id=\"{id}\" src=\"data:image/png;base64,{b64}\">\n"
                    ));
                }
                push_event(
                    push_lines,
                    "pointer-skin",
                    t,
                    &PointerSkinPayload {
                        id: id.clone(),
                        default: u8::from(*default_cursor),
                        x: *x,
                        y: *y,
                    },
                );
            }
            EventPayload::ServerCutText { text } => {
                out.push_str(&format!(
                    "<div>Server Cut Text: <tt>{}</tt></div>\n",
                    escape_html(text)
                ));
                push_event(
                    push_lines,
                    "server-cut-text",
                    t,
                    &ServerCutTextPayload { text: text.clone() },
                );
            }
        }
    }
}

fn render_diagnostic(out: &mut String, diag: &Diagnostic) {
    match diag.token {
        "NOT_DECODED" => out.push_str(&format!(
            "<div class=\"-todo\">TODO: {}</div>\n",
            escape_html(&diag.detail)
        )),
        _ => out.push_str(&format!(
            "<div class=\"-error\">{}: {}</div>\n",
            diag.token,
            escape_html(&diag.detail)
        )),
    }
}

fn push_event(push_lines: &mut String, kind: &str, t_ms: f64, payload: &impl serde::Serialize) {
    let json = serde_json::to_string(payload).expect("payload types always serialize");
    push_lines.push_str(&format!("rfb.PushEvent(\"{kind}\", {t_ms}, {json});\n"));
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vnc_replay_core::Packet;
    use vnc_replay_protocol::messages::types::SECURITY_TYPE_VNC_AUTH;

    fn minimal_session() -> Session {
        let mut server_bytes = Vec::new();
        server_bytes.extend_from_slice(b"RFB 003.008\n");
        server_bytes.push(1);
        server_bytes.push(SECURITY_TYPE_VNC_AUTH);
        server_bytes.extend_from_slice(&[0u8; 16]);
        server_bytes.extend_from_slice(&0u32.to_be_bytes());
        server_bytes.extend_from_slice(&64u16.to_be_bytes());
        server_bytes.extend_from_slice(&48u16.to_be_bytes());
        server_bytes.extend_from_slice(&sample_pixel_format_bytes());
        server_bytes.extend_from_slice(&5u32.to_be_bytes());
        server_bytes.extend_from_slice(b"Alpha");

        let mut client_bytes = Vec::new();
        client_bytes.extend_from_slice(b"RFB 003.008\n");
        client_bytes.push(SECURITY_TYPE_VNC_AUTH);
        client_bytes.extend_from_slice(&[0u8; 16]);
        client_bytes.push(1);

        let packets = vec![
            Packet { timestamp: Duration::ZERO, src_port: 5000, dst_port: 5900, seq: 0, syn: true, payload: vec![] },
            Packet { timestamp: Duration::ZERO, src_port: 5900, dst_port: 5000, seq: 0, syn: true, payload: vec![] },
            Packet { timestamp: Duration::from_millis(1), src_port: 5900, dst_port: 5000, seq: 1, syn: false, payload: server_bytes },
            Packet { timestamp: Duration::from_millis(1), src_port: 5000, dst_port: 5900, seq: 1, syn: false, payload: client_bytes },
        ];
        Session::from_packets(packets).unwrap()
    }

    fn sample_pixel_format_bytes() -> Vec<u8> {
        use vnc_replay_protocol::messages::types::PixelFormat as WirePixelFormat;
        let wire = WirePixelFormat {
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
        let mut out = Vec::new();
        wire.write_to(&mut out);
        out
    }

    #[test]
    fn render_embeds_handshake_summary_and_player() {
        let session = minimal_session();
        let writer = ReplayWriter::new(&session, true);
        let html = writer.render().unwrap();
        assert!(html.contains("Remote display 64x48"));
        assert!(html.contains("Server name: Alpha"));
        assert!(html.contains("class RFB"));
        assert!(html.contains("rfb = new RFB(64, 48);"));
        assert!(html.contains("rfb.Render("));
    }

    #[test]
    fn render_without_embedding_omits_player_source() {
        let session = minimal_session();
        let writer = ReplayWriter::new(&session, false);
        let html = writer.render().unwrap();
        assert!(!html.contains("class RFB"));
        assert!(html.contains("rfb = new RFB(64, 48);"));
    }

    #[test]
    fn rendered_document_can_be_written_to_disk() {
        let session = minimal_session();
        let writer = ReplayWriter::new(&session, true);
        let html = writer.render().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.html");
        std::fs::write(&path, &html).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
    }
}
