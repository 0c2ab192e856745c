//! The session-lifetime RGBA accumulation buffer ("canvas").
//!
//! Unlike the teacher's `ManagedPixelBuffer` (which stores pixels in the server's
//! native `PixelFormat` and exposes a generic `MutablePixelBuffer` trait), this
//! canvas always stores RGBA8888 — every rectangle decoder already converts through
//! `PixelFormat::read_pixel` before writing here, so there is exactly one pixel
//! format to reason about downstream. Rectangle decoders composite into it so that
//! CopyRect and Tight-JPEG regions have prior pixels to read back.
//!
//! Stride is always `width` pixels (4 bytes); there is no separate stride parameter
//! since, unlike the teacher's buffer, this type never aliases a sub-region of a
//! larger allocation.

use vnc_replay_common::Rect;

/// A full framebuffer-sized RGBA8888 accumulation buffer.
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        if rect.width == 0 || rect.height == 0 || rect.x < 0 || rect.y < 0 {
            return None;
        }
        let x = rect.x as u32;
        let y = rect.y as u32;
        if x >= self.width || y >= self.height {
            return None;
        }
        let w = rect.width.min(self.width - x);
        let h = rect.height.min(self.height - y);
        Some((x, y, w, h))
    }

    /// Fills `rect` with a solid RGBA colour.
    pub fn fill_rect(&mut self, rect: Rect, rgba: [u8; 4]) {
        let Some((x, y, w, h)) = self.clip(rect) else {
            return;
        };
        for row in 0..h {
            let row_start = (((y + row) * self.width + x) * 4) as usize;
            for col in 0..w {
                let px = row_start + (col * 4) as usize;
                self.data[px..px + 4].copy_from_slice(&rgba);
            }
        }
    }

    /// Blits tightly-packed RGBA pixel data (`w * h * 4` bytes, row-major) into `rect`.
    pub fn blit_rgba(&mut self, rect: Rect, pixels: &[u8]) {
        let Some((x, y, w, h)) = self.clip(rect) else {
            return;
        };
        let src_stride = (rect.width * 4) as usize;
        for row in 0..h {
            let src_start = (row as usize) * src_stride;
            if src_start + (w as usize) * 4 > pixels.len() {
                break;
            }
            let dst_start = (((y + row) * self.width + x) * 4) as usize;
            let len = (w * 4) as usize;
            self.data[dst_start..dst_start + len]
                .copy_from_slice(&pixels[src_start..src_start + len]);
        }
    }

    /// Copies a `w x h` block from `(src_x, src_y)` to `dest`, as the CopyRect
    /// encoding requires. Reads the source into a scratch buffer first so that
    /// overlapping source/destination regions do not corrupt each other.
    pub fn copy_rect(&mut self, dest: Rect, src_x: i32, src_y: i32) {
        let Some((dx, dy, w, h)) = self.clip(dest) else {
            return;
        };
        let src_rect = Rect::new(src_x, src_y, w, h);
        let Some((sx, sy, sw, sh)) = self.clip(src_rect) else {
            return;
        };
        let w = w.min(sw);
        let h = h.min(sh);

        let mut scratch = vec![0u8; (w * h * 4) as usize];
        for row in 0..h {
            let src_start = (((sy + row) * self.width + sx) * 4) as usize;
            let dst_start = ((row * w) * 4) as usize;
            let len = (w * 4) as usize;
            scratch[dst_start..dst_start + len]
                .copy_from_slice(&self.data[src_start..src_start + len]);
        }
        for row in 0..h {
            let dst_start = (((dy + row) * self.width + dx) * 4) as usize;
            let src_start = ((row * w) * 4) as usize;
            let len = (w * 4) as usize;
            self.data[dst_start..dst_start + len]
                .copy_from_slice(&scratch[src_start..src_start + len]);
        }
    }

    /// Encodes the pixels within `rect` as a standalone PNG image.
    pub fn crop_png(&self, rect: Rect) -> Option<Vec<u8>> {
        let (x, y, w, h) = self.clip(rect)?;
        let mut cropped = vec![0u8; (w * h * 4) as usize];
        for row in 0..h {
            let src_start = (((y + row) * self.width + x) * 4) as usize;
            let dst_start = ((row * w) * 4) as usize;
            let len = (w * 4) as usize;
            cropped[dst_start..dst_start + len]
                .copy_from_slice(&self.data[src_start..src_start + len]);
        }
        encode_rgba_png(w, h, &cropped)
    }
}

/// Encodes a tightly-packed RGBA buffer as a PNG, used both by [`Canvas::crop_png`]
/// and directly by decoders that produce a rectangle's pixels without going through
/// the canvas (e.g. a Cursor image, which is never copied back into the canvas).
pub fn encode_rgba_png(width: u32, height: u32, rgba: &[u8]) -> Option<Vec<u8>> {
    if width == 0 || height == 0 {
        return None;
    }
    let image = image::RgbaImage::from_raw(width, height, rgba.to_vec())?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .ok()?;
    Some(out)
}
