//! Pixel format description and the session-lifetime RGBA canvas used by the
//! VNC replay's rectangle decoders.

pub mod canvas;
pub mod format;

pub use canvas::{encode_rgba_png, Canvas};
pub use format::PixelFormat;
