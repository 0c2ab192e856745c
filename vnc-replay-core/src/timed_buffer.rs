//! Per-direction timed reassembly buffer.
//!
//! Turns TCP segments arriving out of order (by capture-relative sequence
//! offset) into one contiguous byte stream, with a parallel sparse mapping
//! from byte offset to arrival time so the dispatcher can merge both
//! directions' timelines. Gaps left by segments the capture never saw are
//! filled with the sentinel byte `0x6F` rather than tracked out-of-band -
//! see `EventDispatcher`, which relies on that sentinel never parsing as a
//! real message type.

use crate::error::ReplayError;
use std::time::Duration;

/// The in-band gap marker. Not a valid RFB client or server message type in
/// any tag this crate dispatches, so its appearance at a message-type
/// position means "skip one byte and resync".
pub const SENTINEL: u8 = 0x6F;

#[derive(Debug, Default)]
pub struct TimedBuffer {
    buf: Vec<u8>,
    index: usize,
    /// `(byte_offset, arrival_time)`, meant to stay sorted by offset; an
    /// overlapping retransmission can violate that, tracked by `dirty`.
    timing: Vec<(usize, Duration)>,
    dirty: bool,
}

impl TimedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` as having arrived at time `t`, claiming to start at
    /// `offset` in this direction's byte-offset space.
    pub fn add(&mut self, t: Duration, offset: usize, bytes: &[u8]) -> Result<(), ReplayError> {
        use std::cmp::Ordering;
        match offset.cmp(&self.buf.len()) {
            Ordering::Equal => {
                tracing::trace!(offset, len = bytes.len(), "timed buffer append");
                self.timing.push((self.buf.len(), t));
                self.buf.extend_from_slice(bytes);
            }
            Ordering::Greater => {
                let gap = offset - self.buf.len();
                tracing::debug!(offset, gap, "timed buffer gap, sentinel-filling");
                self.buf.resize(self.buf.len() + gap, SENTINEL);
                self.timing.push((offset, t));
                self.buf.extend_from_slice(bytes);
            }
            Ordering::Less => {
                if offset + bytes.len() <= self.buf.len() {
                    tracing::warn!(offset, len = bytes.len(), "overlapping retransmission, overwriting in place");
                    self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
                    self.dirty = true;
                } else {
                    return Err(ReplayError::OutOfOrderUnsupported);
                }
            }
        }
        Ok(())
    }

    /// Advances past up to `l` bytes, returning what was actually consumed.
    /// Clamps silently at the end of the buffer.
    pub fn consume(&mut self, l: usize) -> &[u8] {
        let take = l.min(self.remaining());
        let start = self.index;
        self.index += take;
        &self.buf[start..start + take]
    }

    /// Like `consume`, but does not advance the cursor.
    pub fn peek(&self, l: usize) -> &[u8] {
        let take = l.min(self.remaining());
        &self.buf[self.index..self.index + take]
    }

    /// Advances to the next timing boundary strictly after the current
    /// position (or to the end of the buffer), returning the number of
    /// bytes skipped. Used by recoverable-error recovery to resync past an
    /// unparseable run of bytes.
    pub fn dump(&mut self) -> usize {
        self.resort_if_dirty();
        let next_boundary = self
            .timing
            .iter()
            .map(|&(offset, _)| offset)
            .find(|&offset| offset > self.index)
            .unwrap_or(self.buf.len());
        let skipped = next_boundary - self.index;
        self.index = next_boundary;
        skipped
    }

    pub fn current_offset(&self) -> usize {
        self.index
    }

    /// The arrival time associated with the current position: the latest
    /// timing entry at or before `index`, or `t_max + 1ms` if the cursor has
    /// moved past every recorded entry.
    pub fn current_time(&mut self) -> Duration {
        self.resort_if_dirty();
        if self.timing.is_empty() {
            return Duration::ZERO;
        }
        let max_offset = self.timing.last().unwrap().0;
        let mut best = self.timing[0].1;
        for &(offset, t) in &self.timing {
            if offset <= self.index {
                best = t;
            } else {
                break;
            }
        }
        if self.index > max_offset {
            best + Duration::from_millis(1)
        } else {
            best
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.index
    }

    fn resort_if_dirty(&mut self) {
        if self.dirty {
            self.timing.sort_by_key(|&(offset, _)| offset);
            self.dirty = false;
        }
    }
}
