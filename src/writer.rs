//! Writing a [`Package`] as an `.hpkg` file.

use crate::assembly::{directory_entry_attribute, package_attributes};
use crate::attribute::AttributeValue;
use crate::error::{HpkError, Result};
use crate::formats::HeapCompression;
use crate::heap::{ByteSource, HeapBuilder, HeapBuilderOptions, HeapCoordinates, MAX_CHUNK_SIZE};
use crate::model::Package;
use crate::parsing::{HpkgHeader, HpkgHeaderParser};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub const HPKG_VERSION: u16 = 2;
pub const HPKG_MINOR_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    pub compression: HeapCompression,
    /// Uncompressed bytes per heap chunk, `1..=65536`
    pub chunk_size: usize,
    /// File data up to this many bytes is stored inside the TOC
    pub inline_data_threshold: u64,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: HeapCompression::Zlib,
            chunk_size: MAX_CHUNK_SIZE,
            inline_data_threshold: 8,
        }
    }
}

/// Serializes packages. The heap is laid out as file data, then the TOC,
/// then the package attributes; neither section uses a string table.
#[derive(Debug, Clone, Default)]
pub struct HpkgWriter {
    options: WriterOptions,
}

impl HpkgWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn write(&self, package: &Package, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(HpkError::io(format!("creating {}", path.display())))?;
        let mut sink = BufWriter::new(file);
        let written = self.write_to(package, &mut sink)?;
        sink.flush()
            .map_err(HpkError::io(format!("flushing {}", path.display())))?;
        Ok(written)
    }

    /// Write the complete file to `sink`, returning the bytes written.
    pub fn write_to<W: Write>(&self, package: &Package, sink: &mut W) -> Result<u64> {
        let attributes = package_attributes(package)?;
        let mut heap = HeapBuilder::new(HeapBuilderOptions {
            compression: self.options.compression,
            chunk_size: self.options.chunk_size,
        })?;

        let threshold = self.options.inline_data_threshold;
        let toc = {
            let mut place_data = |data: &ByteSource| -> Result<AttributeValue> {
                if data.len() <= threshold {
                    return Ok(AttributeValue::InlineRaw(data.read_all()?));
                }
                let offset = heap.uncompressed_size();
                let written = heap.write_from(&mut data.open())?;
                if written != data.len() {
                    return Err(HpkError::Precondition(format!(
                        "file data yielded {written} bytes but declared {}",
                        data.len()
                    )));
                }
                Ok(HeapCoordinates::new(offset, written).into())
            };
            package
                .directory_entries
                .iter()
                .map(|entry| directory_entry_attribute(entry, &mut place_data))
                .collect::<Result<Vec<_>>>()?
        };

        let toc_offset = heap.uncompressed_size();
        heap.write_attributes(&toc)?;
        let toc_length = heap.uncompressed_size() - toc_offset;

        let attributes_offset = heap.uncompressed_size();
        heap.write_attributes(&attributes)?;
        let attributes_length = u32::try_from(heap.uncompressed_size() - attributes_offset)
            .map_err(|_| {
                HpkError::Precondition("package attributes exceed 4 GiB".to_string())
            })?;

        heap.complete()?;
        let heap_size_compressed = heap.compressed_size()?;
        let header_size = HpkgHeaderParser::HEADER_SIZE as u16;
        let header = HpkgHeader {
            header_size,
            version: HPKG_VERSION,
            total_size: u64::from(header_size) + heap_size_compressed,
            minor_version: HPKG_MINOR_VERSION,
            heap_compression: self.options.compression,
            heap_chunk_size: self.options.chunk_size as u32,
            heap_size_compressed,
            heap_size_uncompressed: heap.uncompressed_size(),
            attributes_length,
            attributes_strings_length: 0,
            attributes_strings_count: 0,
            toc_length,
            toc_strings_length: 0,
            toc_strings_count: 0,
        };
        debug!(
            package = %package.name,
            toc_length,
            attributes_length,
            heap_size_compressed,
            heap_size_uncompressed = header.heap_size_uncompressed,
            chunks = heap.chunk_count(),
            "writing hpkg"
        );

        sink.write_all(&header.to_bytes())
            .map_err(HpkError::io("writing the hpkg header"))?;
        let written = heap.write_to_stream(sink)?;
        Ok(u64::from(header_size) + written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::HpkgFileExtractor;
    use crate::model::{DirectoryEntry, PkgArchitecture, PkgVersion};
    use std::io::Cursor;

    fn sample() -> Package {
        let mut package = Package::new("testpkg");
        package.architecture = Some(PkgArchitecture::X86);
        package.version = Some(PkgVersion::new("1").with_minor("2"));
        package.directory_entries.push(DirectoryEntry::directory(
            "data",
            vec![
                DirectoryEntry::file("small", b"tiny".to_vec()),
                DirectoryEntry::file("large", vec![b'x'; 3000]),
            ],
        ));
        package
    }

    #[test]
    fn test_header_fields() {
        let mut out = Vec::new();
        let written = HpkgWriter::default().write_to(&sample(), &mut out).unwrap();
        assert_eq!(written, out.len() as u64);

        let header = HpkgHeaderParser::parse(&out[..80]).unwrap();
        assert_eq!(header.version, 2);
        assert_eq!(header.minor_version, 1);
        assert_eq!(header.header_size, 80);
        assert_eq!(header.total_size, out.len() as u64);
        assert_eq!(header.toc_strings_count, 0);
        assert_eq!(header.attributes_strings_length, 0);
        // 3000 bytes of file data precede the TOC
        assert_eq!(header.toc_offset().unwrap(), 3000);
    }

    #[test]
    fn test_data_placement() {
        let options = WriterOptions {
            compression: HeapCompression::None,
            chunk_size: 1024,
            ..WriterOptions::default()
        };
        let mut out = Vec::new();
        HpkgWriter::new(options).write_to(&sample(), &mut out).unwrap();

        let extractor = HpkgFileExtractor::from_reader(Cursor::new(out)).unwrap();
        let package = Package::from_hpkg(&extractor).unwrap();
        let data = &package.directory_entries[0];
        let small = data.children()[0].data().unwrap();
        let large = data.children()[1].data().unwrap();
        assert!(small.coordinates().is_none());
        assert_eq!(
            large.coordinates(),
            Some(HeapCoordinates::new(0, 3000))
        );
        assert_eq!(large.read_all().unwrap(), vec![b'x'; 3000]);
    }

    #[test]
    fn test_invalid_chunk_size() {
        let options = WriterOptions {
            chunk_size: 0,
            ..WriterOptions::default()
        };
        let err = HpkgWriter::new(options)
            .write_to(&sample(), &mut Vec::new())
            .unwrap_err();
        assert!(err.is_precondition());
    }
}
