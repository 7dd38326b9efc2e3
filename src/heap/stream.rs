//! Byte-stream views over file content.

use super::coordinates::HeapCoordinates;
use super::HeapReader;
use crate::error::Result;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

/// `Read + Seek` over a window of the heap.
pub struct HeapInputStream {
    reader: Arc<dyn HeapReader>,
    coordinates: HeapCoordinates,
    position: u64,
}

impl HeapInputStream {
    pub fn new(reader: Arc<dyn HeapReader>, coordinates: HeapCoordinates) -> Self {
        Self {
            reader,
            coordinates,
            position: 0,
        }
    }

    pub fn coordinates(&self) -> HeapCoordinates {
        self.coordinates
    }

    pub fn remaining(&self) -> u64 {
        self.coordinates.length.saturating_sub(self.position)
    }
}

impl fmt::Debug for HeapInputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapInputStream")
            .field("coordinates", &self.coordinates)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl Read for HeapInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.remaining().min(buf.len() as u64);
        if count == 0 {
            return Ok(0);
        }

        let window = HeapCoordinates::new(self.coordinates.offset + self.position, count);
        self.reader
            .read_range(&mut buf[..count as usize], window)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.position += count;
        Ok(count as usize)
    }
}

impl Seek for HeapInputStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.coordinates.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        match target {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the heap window",
            )),
        }
    }
}

/// File content, either held in memory or left in the heap.
#[derive(Clone)]
pub enum ByteSource {
    Inline(Arc<[u8]>),
    Heap {
        reader: Arc<dyn HeapReader>,
        coordinates: HeapCoordinates,
    },
}

impl ByteSource {
    pub fn len(&self) -> u64 {
        match self {
            Self::Inline(data) => data.len() as u64,
            Self::Heap { coordinates, .. } => coordinates.length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Where the bytes live in the heap, if they live there.
    pub fn coordinates(&self) -> Option<HeapCoordinates> {
        match self {
            Self::Inline(_) => None,
            Self::Heap { coordinates, .. } => Some(*coordinates),
        }
    }

    pub fn read_all(&self) -> Result<Vec<u8>> {
        match self {
            Self::Inline(data) => Ok(data.to_vec()),
            Self::Heap {
                reader,
                coordinates,
            } => reader.read_vec(*coordinates),
        }
    }

    pub fn open(&self) -> Box<dyn Read + Send> {
        match self {
            Self::Inline(data) => Box::new(Cursor::new(Arc::clone(data))),
            Self::Heap {
                reader,
                coordinates,
            } => Box::new(HeapInputStream::new(Arc::clone(reader), *coordinates)),
        }
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Inline(data.into())
    }
}

impl From<&[u8]> for ByteSource {
    fn from(data: &[u8]) -> Self {
        Self::Inline(data.into())
    }
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(data) => write!(f, "Inline({} bytes)", data.len()),
            Self::Heap { coordinates, .. } => write!(f, "Heap({coordinates})"),
        }
    }
}

/// Content equality; heap-backed sources are read to compare.
impl PartialEq for ByteSource {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        match (self.read_all(), other.read_all()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::MemoryHeapReader;

    fn heap() -> Arc<dyn HeapReader> {
        Arc::new(MemoryHeapReader::new((0..=99).collect()))
    }

    #[test]
    fn test_stream_reads_window() {
        let mut stream = HeapInputStream::new(heap(), HeapCoordinates::new(10, 5));
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![10, 11, 12, 13, 14]);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_stream_seek() {
        let mut stream = HeapInputStream::new(heap(), HeapCoordinates::new(20, 10));
        stream.seek(SeekFrom::End(-2)).unwrap();
        let mut out = [0u8; 4];
        assert_eq!(stream.read(&mut out).unwrap(), 2);
        assert_eq!(&out[..2], &[28, 29]);

        assert!(stream.seek(SeekFrom::Current(-20)).is_err());
        // Past the end just reads nothing
        stream.seek(SeekFrom::Start(50)).unwrap();
        assert_eq!(stream.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_byte_source_variants_compare_by_content() {
        let inline = ByteSource::from(vec![40, 41, 42]);
        let on_heap = ByteSource::Heap {
            reader: heap(),
            coordinates: HeapCoordinates::new(40, 3),
        };
        assert_eq!(inline, on_heap);
        assert_eq!(on_heap.len(), 3);
        assert_eq!(on_heap.coordinates(), Some(HeapCoordinates::new(40, 3)));
        assert!(inline.coordinates().is_none());

        let mut opened = Vec::new();
        on_heap.open().read_to_end(&mut opened).unwrap();
        assert_eq!(opened, vec![40, 41, 42]);
    }
}
