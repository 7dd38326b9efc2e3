use super::{checked_window, HeapCoordinates, HeapReader};
use crate::error::Result;

/// An uncompressed heap held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryHeapReader {
    data: Vec<u8>,
}

impl MemoryHeapReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl HeapReader for MemoryHeapReader {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_byte(&self, offset: u64) -> Result<u8> {
        checked_window(HeapCoordinates::new(offset, 1), self.size())?;
        Ok(self.data[offset as usize])
    }

    fn read_range(&self, buffer: &mut [u8], coordinates: HeapCoordinates) -> Result<()> {
        checked_window(coordinates, self.size())?;
        let start = coordinates.offset as usize;
        let length = coordinates.length as usize;
        buffer[..length].copy_from_slice(&self.data[start..start + length]);
        Ok(())
    }
}
