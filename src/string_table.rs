//! Lazily loaded string tables.
//!
//! A section's string table is a run of NUL-terminated UTF-8 strings ended
//! by an extra NUL. It is only read from the heap on first lookup.

use crate::error::{HpkError, Result};
use crate::heap::{HeapCoordinates, HeapReader};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

pub struct HpkStringTable {
    heap_reader: Arc<dyn HeapReader>,
    coordinates: HeapCoordinates,
    expected_count: u64,
    values: Mutex<Option<Arc<[String]>>>,
}

impl HpkStringTable {
    pub fn new(
        heap_reader: Arc<dyn HeapReader>,
        heap_offset: u64,
        heap_length: u64,
        expected_count: u64,
    ) -> Self {
        Self {
            heap_reader,
            coordinates: HeapCoordinates::new(heap_offset, heap_length),
            expected_count,
            values: Mutex::new(None),
        }
    }

    /// A table with no strings.
    pub fn empty(heap_reader: Arc<dyn HeapReader>) -> Self {
        Self::new(heap_reader, 0, 0, 0)
    }

    pub fn expected_count(&self) -> u64 {
        self.expected_count
    }

    pub fn get_string(&self, index: u64) -> Result<String> {
        let strings = self.strings()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| strings.get(i))
            .cloned()
            .ok_or_else(|| {
                HpkError::StringTable(format!(
                    "index {} is outside a table of {} strings",
                    index,
                    strings.len()
                ))
            })
    }

    /// All strings, loading them on first use.
    pub fn strings(&self) -> Result<Arc<[String]>> {
        let mut values = self.values.lock();
        if let Some(strings) = values.as_ref() {
            return Ok(Arc::clone(strings));
        }

        let strings: Arc<[String]> = if self.coordinates.length == 0 {
            Arc::from(Vec::new())
        } else {
            let data = self.heap_reader.read_vec(self.coordinates)?;
            let parsed = parse_strings(&data, self.expected_count, self.coordinates.offset)?;
            debug!(
                offset = self.coordinates.offset,
                length = self.coordinates.length,
                count = parsed.len(),
                "loaded string table"
            );
            parsed.into()
        };

        *values = Some(Arc::clone(&strings));
        Ok(strings)
    }
}

impl std::fmt::Debug for HpkStringTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpkStringTable")
            .field("coordinates", &self.coordinates)
            .field("expected_count", &self.expected_count)
            .field("loaded", &self.values.lock().is_some())
            .finish()
    }
}

/// Split a table into exactly `expected` strings, requiring the sentinel.
fn parse_strings(data: &[u8], expected: u64, heap_offset: u64) -> Result<Vec<String>> {
    let mut strings = Vec::with_capacity(expected.min(data.len() as u64) as usize);
    let mut offset = 0usize;

    while offset < data.len() {
        if data[offset] == 0 {
            if strings.len() as u64 != expected {
                return Err(HpkError::StringTable(format!(
                    "expected to read {} strings from the string table, but actually found {}",
                    expected,
                    strings.len()
                )));
            }
            return Ok(strings);
        }

        if strings.len() as u64 >= expected {
            return Err(HpkError::StringTable(
                "read all of the expected strings but the table data is not exhausted"
                    .to_string(),
            ));
        }

        let Some(length) = data[offset..].iter().position(|&b| b == 0) else {
            break;
        };
        let value = std::str::from_utf8(&data[offset..offset + length]).map_err(|_| {
            HpkError::InvalidUtf8 {
                offset: heap_offset + offset as u64,
            }
        })?;
        strings.push(value.to_string());
        offset += length + 1;
    }

    Err(HpkError::StringTable(format!(
        "no terminating NUL for the table; read {} of {} strings",
        strings.len(),
        expected
    )))
}
