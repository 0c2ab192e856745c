//! The four independent zlib decompression streams Tight encoding relies on.
//!
//! Tight data can reference any of four streams (selected by 2 bits of the
//! compression control byte); each stream's dictionary persists across
//! rectangles until the server explicitly resets it. This lives on the
//! session rather than inside `TightDecoder` itself so its lifetime is tied
//! to the whole replay, matching the teacher's `Mutex<[Option<Decompress>; 4]>`
//! field but without the mutex - there is never more than one rectangle
//! decoding at a time in this synchronous pipeline.

use crate::DecodeError;
use flate2::{Decompress, FlushDecompress};

pub struct ZlibStreamSet {
    streams: [Option<Decompress>; 4],
}

impl Default for ZlibStreamSet {
    fn default() -> Self {
        Self {
            streams: [None, None, None, None],
        }
    }
}

impl ZlibStreamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets stream `id`, discarding its dictionary. Called when the
    /// corresponding reset bit is set in a Tight compression control byte.
    pub fn reset(&mut self, id: usize) {
        self.streams[id] = None;
    }

    /// Decompresses `compressed` on stream `id` into exactly `expected_size`
    /// bytes. Creates the stream lazily on first use.
    pub fn decompress(
        &mut self,
        id: usize,
        compressed: &[u8],
        expected_size: usize,
    ) -> Result<Vec<u8>, DecodeError> {
        if self.streams[id].is_none() {
            self.streams[id] = Some(Decompress::new(true));
        }
        let decompressor = self.streams[id].as_mut().unwrap();

        let mut output = vec![0u8; expected_size];
        let before_out = decompressor.total_out();
        decompressor
            .decompress(compressed, &mut output, FlushDecompress::Sync)
            .map_err(|_| DecodeError::ZlibTruncated(id))?;
        let produced = (decompressor.total_out() - before_out) as usize;
        if produced != expected_size {
            return Err(DecodeError::ZlibTruncated(id));
        }
        output.truncate(produced);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn decompress_round_trip() {
        let mut streams = ZlibStreamSet::new();
        let original = b"tight stream data";
        let compressed = zlib_compress(original);
        let out = streams.decompress(0, &compressed, original.len()).unwrap();
        assert_eq!(&out[..], &original[..]);
    }

    #[test]
    fn streams_are_independent() {
        let mut streams = ZlibStreamSet::new();
        let a = zlib_compress(b"stream a data");
        let b = zlib_compress(b"stream b data");
        streams.decompress(0, &a, "stream a data".len()).unwrap();
        let out_b = streams.decompress(1, &b, "stream b data".len()).unwrap();
        assert_eq!(&out_b[..], b"stream b data");
    }

    #[test]
    fn reset_drops_dictionary() {
        let mut streams = ZlibStreamSet::new();
        let a = zlib_compress(b"first");
        streams.decompress(0, &a, "first".len()).unwrap();
        streams.reset(0);
        assert!(streams.streams[0].is_none());
    }
}
