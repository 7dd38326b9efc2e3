//! The heap: the chunked, optionally compressed byte region that holds
//! attribute data, strings and file content.
//!
//! ## Reading
//!
//! [`HpkHeapReader`] presents the uncompressed heap as randomly addressable
//! bytes. Chunks are inflated on first access and kept in a small
//! [`ChunkCache`].
//!
//! ## Writing
//!
//! [`HeapBuilder`] accumulates writes into chunks and produces the on-disk
//! form, including the trailing chunk size table.
//!
//! | Chunk state | Stored length | Reader action |
//! |-------------|---------------|---------------|
//! | Stored | equals the uncompressed chunk length | copy |
//! | Deflated | smaller than the uncompressed chunk length | inflate |

mod builder;
mod cache;
mod coordinates;
mod memory;
mod reader;
mod stream;

pub use builder::{HeapBuilder, HeapBuilderOptions, MAX_CHUNK_SIZE};
pub use cache::ChunkCache;
pub use coordinates::HeapCoordinates;
pub use memory::MemoryHeapReader;
pub use reader::HpkHeapReader;
pub use stream::{ByteSource, HeapInputStream};

use crate::error::{HpkError, Result};

/// Random access to the uncompressed heap.
pub trait HeapReader: Send + Sync {
    /// Uncompressed heap size in bytes.
    fn size(&self) -> u64;

    fn read_byte(&self, offset: u64) -> Result<u8>;

    /// Fill `buffer[..coordinates.length]` with the addressed heap bytes,
    /// which may span several chunks.
    fn read_range(&self, buffer: &mut [u8], coordinates: HeapCoordinates) -> Result<()>;

    fn read_vec(&self, coordinates: HeapCoordinates) -> Result<Vec<u8>> {
        checked_window(coordinates, self.size())?;
        let mut buffer = vec![0u8; coordinates.length as usize];
        self.read_range(&mut buffer, coordinates)?;
        Ok(buffer)
    }
}

/// Reject a window that does not lie within a heap of `size` bytes.
pub(crate) fn checked_window(coordinates: HeapCoordinates, size: u64) -> Result<()> {
    match coordinates.end() {
        Some(end) if end <= size => Ok(()),
        _ => Err(HpkError::OutOfBounds {
            offset: coordinates.offset,
            length: coordinates.length,
            size,
        }),
    }
}
