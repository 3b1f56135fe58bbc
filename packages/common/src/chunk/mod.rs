mod cipher;
mod error;

pub use cipher::{ChunkCipher, NONCE_LEN, TAG_LEN};
pub use error::ChunkError;

use std::io::Read;

/// Default chunk size: 3 MiB. Bounds peak memory during transfer while
/// amortizing per-chunk overhead.
pub const DEFAULT_CHUNK_SIZE: usize = 3 * 1024 * 1024;

/// A contiguous slice of a file's byte stream.
///
/// Chunks are derived deterministically from (stream, chunk_size, index) and
/// only exist in memory; they are never persisted as their own records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position within the stream.
    pub index: u32,
    pub data: Vec<u8>,
}

/// Lazily splits a byte stream into fixed-size chunks.
///
/// The final chunk may be shorter. Restarting means re-invoking on a fresh
/// reader; there is no mid-stream cursor. The chunk size must not change
/// mid-file.
#[derive(Debug)]
pub struct ChunkReader<R> {
    inner: R,
    chunk_size: usize,
    next_index: u32,
    exhausted: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R, chunk_size: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidChunkSize);
        }
        Ok(Self {
            inner,
            chunk_size,
            next_index: 0,
            exhausted: false,
        })
    }

    /// Read the next chunk, or `None` once the stream is drained.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < self.chunk_size {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                self.exhausted = true;
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(Chunk { index, data: buf }))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<Chunk, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// Join chunks back into the original byte stream.
///
/// Fails when the index sequence has a gap or duplicate, so a missing chunk
/// is surfaced instead of silently producing a corrupted file.
pub fn reassemble(chunks: impl IntoIterator<Item = Chunk>) -> Result<Vec<u8>, ChunkError> {
    let mut chunks: Vec<Chunk> = chunks.into_iter().collect();
    chunks.sort_by_key(|c| c.index);

    let mut out = Vec::new();
    for (expected, chunk) in chunks.into_iter().enumerate() {
        if chunk.index as usize != expected {
            return Err(ChunkError::MissingChunk {
                index: expected as u32,
            });
        }
        out.extend_from_slice(&chunk.data);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn split_all(data: &[u8], chunk_size: usize) -> Vec<Chunk> {
        ChunkReader::new(Cursor::new(data.to_vec()), chunk_size)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = ChunkReader::new(Cursor::new(vec![1u8]), 0).unwrap_err();
        assert!(matches!(err, ChunkError::InvalidChunkSize));
    }

    #[test]
    fn empty_stream_yields_no_chunks() {
        assert!(split_all(b"", 4).is_empty());
    }

    #[test]
    fn uneven_tail_chunk() {
        // 10 units at chunk size 3 -> sizes 3, 3, 3, 1. Mirrors the 10 MiB /
        // 3 MiB transfer shape at test scale.
        let data: Vec<u8> = (0..10).collect();
        let chunks = split_all(&data, 3);
        assert_eq!(chunks.len(), 4);
        assert_eq!(
            chunks.iter().map(|c| c.data.len()).collect::<Vec<_>>(),
            vec![3, 3, 3, 1]
        );
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = split_all(&[7u8; 12], 4);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.data.len() == 4));
    }

    #[test]
    fn split_reassemble_round_trip() {
        let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        for chunk_size in [1, 7, 256, 4096, 10_000, 20_000] {
            let chunks = split_all(&data, chunk_size);
            assert_eq!(reassemble(chunks).unwrap(), data, "chunk_size {chunk_size}");
        }
    }

    #[test]
    fn reassemble_detects_gap() {
        let mut chunks = split_all(&[1u8; 30], 10);
        chunks.remove(1);
        let err = reassemble(chunks).unwrap_err();
        assert!(matches!(err, ChunkError::MissingChunk { index: 1 }));
    }

    #[test]
    fn reassemble_accepts_out_of_order_input() {
        let mut chunks = split_all(&[9u8; 9], 3);
        chunks.reverse();
        assert_eq!(reassemble(chunks).unwrap(), vec![9u8; 9]);
    }
}
