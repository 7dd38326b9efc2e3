//! Random access over a chunked, optionally compressed heap.
//!
//! On disk the heap is a run of chunks, each either stored or zlib-deflated,
//! followed (for compressed heaps) by a table of big-endian `u16` values
//! giving each chunk's on-disk length minus one. The table omits the last
//! chunk; its length is whatever remains of the compressed size.
//!
//! ```text
//! ┌─────────┬─────────┬─────┬─────────┬──────────────────────────┐
//! │ chunk 0 │ chunk 1 │ ... │ chunk N │ len(0)-1 ... len(N-1)-1  │
//! └─────────┴─────────┴─────┴─────────┴──────────────────────────┘
//! ```

use super::cache::ChunkCache;
use super::coordinates::HeapCoordinates;
use super::{checked_window, HeapReader};
use crate::error::{HpkError, Result};
use crate::formats::HeapCompression;
use crate::parsing::HeapLayout;
use flate2::{Decompress, FlushDecompress, Status};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Reads the heap of an HPKG or HPKR file, decompressing chunks on demand.
#[derive(Debug)]
pub struct HpkHeapReader<R = File> {
    /// Seek and read happen under one lock
    source: Mutex<R>,
    layout: HeapLayout,
    /// On-disk length of every chunk
    chunk_lengths: Vec<u64>,
    /// File offset of every chunk
    chunk_offsets: Vec<u64>,
    cache: ChunkCache,
}

impl HpkHeapReader<File> {
    /// Open `path` and read the heap it describes.
    pub fn open(path: impl AsRef<Path>, layout: HeapLayout) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(HpkError::io(format!("opening {}", path.display())))?;
        Self::new(file, layout)
    }
}

impl<R: Read + Seek + Send> HpkHeapReader<R> {
    pub const DEFAULT_CACHE_CAPACITY: usize = 3;
    pub const MAX_CHUNK_SIZE: u64 = 65536;

    pub fn new(mut source: R, layout: HeapLayout) -> Result<Self> {
        if layout.chunk_size == 0 || layout.chunk_size > Self::MAX_CHUNK_SIZE {
            return Err(HpkError::InvalidHeader(format!(
                "heap chunk size {} is outside 1..={}",
                layout.chunk_size,
                Self::MAX_CHUNK_SIZE
            )));
        }

        let file_length = source
            .seek(SeekFrom::End(0))
            .map_err(HpkError::io("measuring the file"))?;
        let heap_end = layout.offset.checked_add(layout.size_compressed);
        if heap_end.is_none_or(|end| end > file_length) {
            return Err(HpkError::InvalidHeader(format!(
                "heap of {} bytes at offset {} does not fit in a file of {} bytes",
                layout.size_compressed, layout.offset, file_length
            )));
        }

        let count = chunk_count(&layout);
        let chunk_lengths = match layout.compression {
            HeapCompression::None => {
                if layout.size_compressed != layout.size_uncompressed {
                    return Err(HpkError::InvalidHeader(format!(
                        "uncompressed heap has differing sizes {} and {}",
                        layout.size_compressed, layout.size_uncompressed
                    )));
                }
                (0..count)
                    .map(|index| uncompressed_length(&layout, count, index))
                    .collect()
            }
            HeapCompression::Zlib => read_chunk_lengths(&mut source, &layout, count)?,
        };

        let mut chunk_offsets = Vec::with_capacity(chunk_lengths.len());
        let mut offset = layout.offset;
        for length in &chunk_lengths {
            chunk_offsets.push(offset);
            offset += length;
        }

        debug!(
            compression = ?layout.compression,
            chunks = count,
            chunk_size = layout.chunk_size,
            compressed = layout.size_compressed,
            uncompressed = layout.size_uncompressed,
            "opened heap"
        );

        Ok(Self {
            source: Mutex::new(source),
            layout,
            chunk_lengths,
            chunk_offsets,
            cache: ChunkCache::new(Self::DEFAULT_CACHE_CAPACITY),
        })
    }

    /// Replace the chunk cache with one holding `capacity` chunks.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = ChunkCache::new(capacity);
        self
    }

    pub fn layout(&self) -> &HeapLayout {
        &self.layout
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_lengths.len()
    }

    /// On-disk length of chunk `index`.
    pub fn chunk_compressed_length(&self, index: usize) -> Option<u64> {
        self.chunk_lengths.get(index).copied()
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    fn chunk_uncompressed_length(&self, index: usize) -> u64 {
        uncompressed_length(&self.layout, self.chunk_count(), index)
    }

    fn is_last(&self, index: usize) -> bool {
        index + 1 == self.chunk_count()
    }

    fn chunk(&self, index: usize) -> Result<std::sync::Arc<Vec<u8>>> {
        self.cache.get_or_load(index, || self.load_chunk(index))
    }

    fn load_chunk(&self, index: usize) -> Result<Vec<u8>> {
        let expected = self.chunk_uncompressed_length(index) as usize;
        let stored_length = self.chunk_lengths[index] as usize;

        if stored_length > expected {
            return Err(HpkError::ChunkLength {
                chunk: index,
                length: stored_length as i64,
                reason: "longer than the uncompressed chunk",
            });
        }

        let mut raw = vec![0u8; stored_length];
        {
            let mut source = self.source.lock();
            source
                .seek(SeekFrom::Start(self.chunk_offsets[index]))
                .map_err(HpkError::io(format!("seeking to heap chunk {index}")))?;
            source.read_exact(&mut raw).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    HpkError::Format(format!("unexpected end of file reading heap chunk {index}"))
                } else {
                    HpkError::io(format!("reading heap chunk {index}"))(e)
                }
            })?;
        }

        if stored_length == expected {
            return Ok(raw);
        }

        let mut inflated = vec![0u8; expected];
        let mut inflater = Decompress::new(true);
        let status = inflater
            .decompress(&raw, &mut inflated, FlushDecompress::Finish)
            .map_err(|e| HpkError::Inflate {
                chunk: index,
                reason: e.to_string(),
            })?;
        let produced = inflater.total_out() as usize;

        if produced != expected {
            // The last chunk may legitimately come up short
            if !self.is_last(index) {
                return Err(HpkError::Inflate {
                    chunk: index,
                    reason: format!("inflated to {produced} bytes; was expecting {expected}"),
                });
            }
            inflated.truncate(produced);
        }

        if status != Status::StreamEnd {
            return Err(HpkError::Inflate {
                chunk: index,
                reason: "incomplete inflation of input data".to_string(),
            });
        }

        Ok(inflated)
    }

    fn check_bounds(&self, coordinates: HeapCoordinates) -> Result<()> {
        checked_window(coordinates, self.layout.size_uncompressed)
    }
}

impl<R: Read + Seek + Send> HeapReader for HpkHeapReader<R> {
    fn size(&self) -> u64 {
        self.layout.size_uncompressed
    }

    fn read_byte(&self, offset: u64) -> Result<u8> {
        self.check_bounds(HeapCoordinates::new(offset, 1))?;

        let index = (offset / self.layout.chunk_size) as usize;
        let within = (offset % self.layout.chunk_size) as usize;
        let chunk = self.chunk(index)?;

        chunk
            .get(within)
            .copied()
            .ok_or(HpkError::UnexpectedEnd { offset })
    }

    fn read_range(&self, buffer: &mut [u8], coordinates: HeapCoordinates) -> Result<()> {
        self.check_bounds(coordinates)?;
        if (buffer.len() as u64) < coordinates.length {
            return Err(HpkError::Precondition(format!(
                "buffer of {} bytes cannot hold {} heap bytes",
                buffer.len(),
                coordinates.length
            )));
        }

        let mut offset = coordinates.offset;
        let mut copied = 0usize;
        let wanted = coordinates.length as usize;

        while copied < wanted {
            let index = (offset / self.layout.chunk_size) as usize;
            let within = (offset % self.layout.chunk_size) as usize;
            let chunk = self.chunk(index)?;

            let available = chunk.len().saturating_sub(within);
            if available == 0 {
                return Err(HpkError::UnexpectedEnd { offset });
            }
            let take = available.min(wanted - copied);

            buffer[copied..copied + take].copy_from_slice(&chunk[within..within + take]);
            copied += take;
            offset += take as u64;
        }

        Ok(())
    }
}

fn chunk_count(layout: &HeapLayout) -> usize {
    layout.size_uncompressed.div_ceil(layout.chunk_size) as usize
}

fn uncompressed_length(layout: &HeapLayout, count: usize, index: usize) -> u64 {
    if index + 1 < count {
        layout.chunk_size
    } else {
        layout.size_uncompressed - layout.chunk_size * (count as u64 - 1)
    }
}

/// Read the trailing size table and derive the final chunk's length.
fn read_chunk_lengths<R: Read + Seek>(
    source: &mut R,
    layout: &HeapLayout,
    count: usize,
) -> Result<Vec<u64>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let table_length = 2 * (count as u64 - 1);
    if table_length > layout.size_compressed {
        return Err(HpkError::InvalidHeader(format!(
            "{} chunks need a {} byte size table but the compressed heap is {} bytes",
            count, table_length, layout.size_compressed
        )));
    }

    let mut table = vec![0u8; table_length as usize];
    source
        .seek(SeekFrom::Start(
            layout.offset + layout.size_compressed - table_length,
        ))
        .map_err(HpkError::io("seeking to the heap chunk size table"))?;
    source
        .read_exact(&mut table)
        .map_err(HpkError::io("reading the heap chunk size table"))?;

    let mut lengths = Vec::with_capacity(count);
    let mut total = 0u64;

    for (index, pair) in table.chunks_exact(2).enumerate() {
        let length = u64::from(u16::from_be_bytes([pair[0], pair[1]])) + 1;
        if length > layout.chunk_size {
            return Err(HpkError::ChunkLength {
                chunk: index,
                length: length as i64,
                reason: "larger than the heap chunk size",
            });
        }
        total += length;
        lengths.push(length);
    }

    let last = layout.size_compressed as i64 - table_length as i64 - total as i64;
    if last <= 0 || last as u64 > layout.chunk_size {
        return Err(HpkError::ChunkLength {
            chunk: count - 1,
            length: last,
            reason: "derived last chunk length is out of bounds",
        });
    }
    lengths.push(last as u64);

    Ok(lengths)
}
