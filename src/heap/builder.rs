//! Building a heap for writing.
//!
//! Bytes are accumulated into fixed-size chunks which are spilled to an
//! anonymous temporary file as they fill up. [`HeapBuilder::complete`] then
//! deflates every chunk independently, keeping the raw bytes whenever
//! deflation does not make a chunk smaller. The reader tells the two apart
//! purely by comparing a chunk's stored length with its uncompressed length.

use crate::error::{HpkError, Result};
use crate::formats::HeapCompression;
use crate::parsing::leb128::write_unsigned_leb128;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::debug;

/// Largest chunk whose length minus one still fits the `u16` size table.
pub const MAX_CHUNK_SIZE: usize = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapBuilderOptions {
    pub compression: HeapCompression,
    /// Uncompressed bytes per chunk, `1..=65536`
    pub chunk_size: usize,
}

impl Default for HeapBuilderOptions {
    fn default() -> Self {
        Self {
            compression: HeapCompression::Zlib,
            chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

#[derive(Debug)]
struct Completed {
    /// Chunks as they will appear on disk
    chunks: File,
    /// On-disk length of every chunk
    lengths: Vec<usize>,
}

#[derive(Debug)]
pub struct HeapBuilder {
    options: HeapBuilderOptions,
    current: Vec<u8>,
    /// Full raw chunks
    spill: File,
    full_chunks: usize,
    total: u64,
    completed: Option<Completed>,
}

impl HeapBuilder {
    pub fn new(options: HeapBuilderOptions) -> Result<Self> {
        if options.chunk_size == 0 || options.chunk_size > MAX_CHUNK_SIZE {
            return Err(HpkError::Precondition(format!(
                "heap chunk size {} is outside 1..={}",
                options.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        let spill = tempfile::tempfile().map_err(HpkError::io("creating heap spill file"))?;

        Ok(Self {
            options,
            current: Vec::with_capacity(options.chunk_size),
            spill,
            full_chunks: 0,
            total: 0,
            completed: None,
        })
    }

    pub fn options(&self) -> &HeapBuilderOptions {
        &self.options
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Bytes written so far; also the heap offset of the next write.
    pub fn uncompressed_size(&self) -> u64 {
        self.total
    }

    /// Size of the heap on disk, including the chunk size table.
    pub fn compressed_size(&self) -> Result<u64> {
        let completed = self.completed()?;
        let data: usize = completed.lengths.iter().sum();
        Ok((data + self.table_length(completed.lengths.len())) as u64)
    }

    pub fn chunk_count(&self) -> usize {
        match &self.completed {
            Some(completed) => completed.lengths.len(),
            None => self.full_chunks + usize::from(!self.current.is_empty()),
        }
    }

    fn completed(&self) -> Result<&Completed> {
        self.completed
            .as_ref()
            .ok_or(HpkError::HeapCompleted("the heap builder has not been completed"))
    }

    fn table_length(&self, chunks: usize) -> usize {
        match self.options.compression {
            HeapCompression::None => 0,
            HeapCompression::Zlib => 2 * chunks.saturating_sub(1),
        }
    }

    pub fn write_bytes(&mut self, mut data: &[u8]) -> Result<usize> {
        if self.completed.is_some() {
            return Err(HpkError::HeapCompleted(
                "cannot write into a completed heap builder",
            ));
        }

        let written = data.len();
        while !data.is_empty() {
            let room = self.options.chunk_size - self.current.len();
            let take = room.min(data.len());
            self.current.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.current.len() == self.options.chunk_size {
                self.spill
                    .write_all(&self.current)
                    .map_err(HpkError::io("spilling a heap chunk"))?;
                self.full_chunks += 1;
                self.current.clear();
            }
        }

        self.total += written as u64;
        Ok(written)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<usize> {
        self.write_bytes(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<usize> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<usize> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<usize> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<usize> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<usize> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<usize> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<usize> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_unsigned_leb128(&mut self, value: u64) -> Result<usize> {
        let mut encoded = Vec::with_capacity(10);
        write_unsigned_leb128(value, &mut encoded);
        self.write_bytes(&encoded)
    }

    /// Write a NUL-terminated UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<usize> {
        if value.as_bytes().contains(&0) {
            return Err(HpkError::Precondition(format!(
                "string {value:?} contains a NUL byte"
            )));
        }
        Ok(self.write_bytes(value.as_bytes())? + self.write_u8(0)?)
    }

    /// Copy everything `reader` yields into the heap.
    pub fn write_from<R: Read>(&mut self, reader: &mut R) -> Result<u64> {
        let mut buffer = vec![0u8; self.options.chunk_size];
        let mut total = 0u64;
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => return Ok(total),
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HpkError::io("reading file data into the heap")(e)),
            };
            self.write_bytes(&buffer[..read])?;
            total += read as u64;
        }
    }

    /// Compress every chunk. No writes are accepted afterwards.
    pub fn complete(&mut self) -> Result<()> {
        if self.completed.is_some() {
            return Err(HpkError::HeapCompleted("the heap builder is already complete"));
        }

        let mut chunks =
            tempfile::tempfile().map_err(HpkError::io("creating heap chunk file"))?;
        let mut lengths = Vec::with_capacity(self.chunk_count());
        let mut deflated_count = 0usize;

        self.spill
            .seek(SeekFrom::Start(0))
            .map_err(HpkError::io("rewinding heap spill file"))?;
        let mut raw = vec![0u8; self.options.chunk_size];

        for _ in 0..self.full_chunks {
            self.spill
                .read_exact(&mut raw)
                .map_err(HpkError::io("reading back a spilled heap chunk"))?;
            let (length, deflated) = self.emit_chunk(&raw, &mut chunks)?;
            lengths.push(length);
            deflated_count += usize::from(deflated);
        }
        if !self.current.is_empty() {
            let last = std::mem::take(&mut self.current);
            let (length, deflated) = self.emit_chunk(&last, &mut chunks)?;
            lengths.push(length);
            deflated_count += usize::from(deflated);
        }

        debug!(
            chunks = lengths.len(),
            deflated = deflated_count,
            stored = lengths.len() - deflated_count,
            uncompressed = self.total,
            compressed = lengths.iter().sum::<usize>() + self.table_length(lengths.len()),
            "completed heap"
        );

        self.completed = Some(Completed { chunks, lengths });
        Ok(())
    }

    /// Write one chunk to `out`, returning its on-disk length and whether
    /// it was deflated.
    fn emit_chunk(&self, chunk: &[u8], out: &mut File) -> Result<(usize, bool)> {
        if self.options.compression == HeapCompression::Zlib {
            let mut encoder = ZlibEncoder::new(Vec::with_capacity(chunk.len()), Compression::best());
            encoder
                .write_all(chunk)
                .map_err(HpkError::io("deflating a heap chunk"))?;
            let deflated = encoder
                .finish()
                .map_err(HpkError::io("deflating a heap chunk"))?;

            if deflated.len() < chunk.len() {
                out.write_all(&deflated)
                    .map_err(HpkError::io("writing a deflated heap chunk"))?;
                return Ok((deflated.len(), true));
            }
        }

        out.write_all(chunk)
            .map_err(HpkError::io("writing a stored heap chunk"))?;
        Ok((chunk.len(), false))
    }

    /// Write the chunks, then (when compressed) the size table without its
    /// last entry. Returns the number of bytes written.
    pub fn write_to_stream<W: Write>(&mut self, sink: &mut W) -> Result<u64> {
        let compression = self.options.compression;
        let completed = self
            .completed
            .as_mut()
            .ok_or(HpkError::HeapCompleted("the heap builder has not been completed"))?;

        completed
            .chunks
            .seek(SeekFrom::Start(0))
            .map_err(HpkError::io("rewinding heap chunk file"))?;
        let mut written = io::copy(&mut completed.chunks, sink)
            .map_err(HpkError::io("writing heap chunks"))?;

        if compression == HeapCompression::Zlib {
            if let Some((_, table)) = completed.lengths.split_last() {
                let mut encoded = Vec::with_capacity(table.len() * 2);
                for length in table {
                    encoded.extend_from_slice(&((*length - 1) as u16).to_be_bytes());
                }
                sink.write_all(&encoded)
                    .map_err(HpkError::io("writing the heap chunk size table"))?;
                written += encoded.len() as u64;
            }
        }

        Ok(written)
    }
}
