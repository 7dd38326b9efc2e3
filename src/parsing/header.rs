//! Fixed file headers.
//!
//! Both file kinds open with the same big-endian prefix (magic, header size,
//! version, total size, minor version, and the heap description). HPKG then
//! describes the package-attribute and TOC sections; HPKR describes the
//! repository info and the packages section.

use crate::error::{HpkError, Result};
use crate::formats::{FileType, HeapCompression};
use crate::parsing::leb128::ByteCursor;
use std::io::Read;

/// Where the heap lives and how it is chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapLayout {
    /// File offset of the first heap byte (the header size).
    pub offset: u64,
    pub compression: HeapCompression,
    pub chunk_size: u64,
    /// Bytes on disk, including the trailing chunk-size table.
    pub size_compressed: u64,
    pub size_uncompressed: u64,
}

/// Fields shared by both headers, in file order.
struct Prefix {
    header_size: u16,
    version: u16,
    total_size: u64,
    minor_version: u16,
    heap_compression: HeapCompression,
    heap_chunk_size: u32,
    heap_size_compressed: u64,
    heap_size_uncompressed: u64,
}

fn truncated(kind: FileType) -> HpkError {
    HpkError::InvalidHeader(format!("truncated {} header", kind.name()))
}

fn parse_prefix(cursor: &mut ByteCursor<'_>, kind: FileType) -> Result<Prefix> {
    let magic = cursor.read_bytes(4).ok_or_else(|| truncated(kind))?;
    if FileType::from_bytes(magic) != Some(kind) {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(HpkError::InvalidMagic {
            expected: kind.name(),
            found,
        });
    }

    let header_size = cursor.read_u16_be().ok_or_else(|| truncated(kind))?;
    let version = cursor.read_u16_be().ok_or_else(|| truncated(kind))?;
    let total_size = cursor.read_u64_be().ok_or_else(|| truncated(kind))?;
    let minor_version = cursor.read_u16_be().ok_or_else(|| truncated(kind))?;
    let heap_compression =
        HeapCompression::from_u16(cursor.read_u16_be().ok_or_else(|| truncated(kind))?)?;
    let heap_chunk_size = cursor.read_u32_be().ok_or_else(|| truncated(kind))?;
    let heap_size_compressed = cursor.read_u64_be().ok_or_else(|| truncated(kind))?;
    let heap_size_uncompressed = cursor.read_u64_be().ok_or_else(|| truncated(kind))?;

    Ok(Prefix {
        header_size,
        version,
        total_size,
        minor_version,
        heap_compression,
        heap_chunk_size,
        heap_size_compressed,
        heap_size_uncompressed,
    })
}

fn check_header_size(header_size: u16, minimum: usize, kind: FileType) -> Result<()> {
    if (header_size as usize) < minimum {
        return Err(HpkError::InvalidHeader(format!(
            "{} header size {} is smaller than the {} byte fixed header",
            kind.name(),
            header_size,
            minimum
        )));
    }
    Ok(())
}

/// Read exactly `size` leading bytes, checking the magic first so that a
/// foreign file fails as a format error rather than a short read.
fn read_leading<R: Read>(reader: &mut R, size: usize, kind: FileType) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; size];
    reader
        .read_exact(&mut buffer[..4])
        .map_err(HpkError::io(format!("reading the {} magic", kind.name())))?;
    if FileType::from_bytes(&buffer[..4]) != Some(kind) {
        let mut found = [0u8; 4];
        found.copy_from_slice(&buffer[..4]);
        return Err(HpkError::InvalidMagic {
            expected: kind.name(),
            found,
        });
    }
    reader
        .read_exact(&mut buffer[4..])
        .map_err(HpkError::io(format!("reading the {} header", kind.name())))?;
    Ok(buffer)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HpkgHeader {
    pub header_size: u16,
    pub version: u16,
    pub total_size: u64,
    pub minor_version: u16,
    pub heap_compression: HeapCompression,
    pub heap_chunk_size: u32,
    pub heap_size_compressed: u64,
    pub heap_size_uncompressed: u64,
    // Package attributes section
    pub attributes_length: u32,
    pub attributes_strings_length: u32,
    pub attributes_strings_count: u32,
    // TOC section
    pub toc_length: u64,
    pub toc_strings_length: u64,
    pub toc_strings_count: u64,
}

impl HpkgHeader {
    pub fn heap_layout(&self) -> HeapLayout {
        HeapLayout {
            offset: u64::from(self.header_size),
            compression: self.heap_compression,
            chunk_size: u64::from(self.heap_chunk_size),
            size_compressed: self.heap_size_compressed,
            size_uncompressed: self.heap_size_uncompressed,
        }
    }

    /// Heap offset of the TOC section (its string table first).
    pub fn toc_offset(&self) -> Result<u64> {
        self.heap_size_uncompressed
            .checked_sub(u64::from(self.attributes_length))
            .and_then(|v| v.checked_sub(self.toc_length))
            .ok_or_else(|| {
                HpkError::InvalidHeader(format!(
                    "toc ({}) and attributes ({}) do not fit in a heap of {} bytes",
                    self.toc_length, self.attributes_length, self.heap_size_uncompressed
                ))
            })
    }

    /// Heap offset of the package-attributes section (its string table first).
    pub fn attributes_offset(&self) -> Result<u64> {
        self.heap_size_uncompressed
            .checked_sub(u64::from(self.attributes_length))
            .ok_or_else(|| {
                HpkError::InvalidHeader(format!(
                    "attributes ({}) do not fit in a heap of {} bytes",
                    self.attributes_length, self.heap_size_uncompressed
                ))
            })
    }

    /// Serialize in file order. The reserved word is always zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HpkgHeaderParser::HEADER_SIZE);
        out.extend_from_slice(FileType::HPKG);
        out.extend_from_slice(&self.header_size.to_be_bytes());
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&self.total_size.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.heap_compression.code().to_be_bytes());
        out.extend_from_slice(&self.heap_chunk_size.to_be_bytes());
        out.extend_from_slice(&self.heap_size_compressed.to_be_bytes());
        out.extend_from_slice(&self.heap_size_uncompressed.to_be_bytes());
        out.extend_from_slice(&self.attributes_length.to_be_bytes());
        out.extend_from_slice(&self.attributes_strings_length.to_be_bytes());
        out.extend_from_slice(&self.attributes_strings_count.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&self.toc_length.to_be_bytes());
        out.extend_from_slice(&self.toc_strings_length.to_be_bytes());
        out.extend_from_slice(&self.toc_strings_count.to_be_bytes());
        out
    }
}

pub struct HpkgHeaderParser;

impl HpkgHeaderParser {
    pub const HEADER_SIZE: usize = 80;

    pub fn parse(buffer: &[u8]) -> Result<HpkgHeader> {
        let mut cursor = ByteCursor::new(buffer);
        let prefix = parse_prefix(&mut cursor, FileType::Hpkg)?;
        let short = || truncated(FileType::Hpkg);

        let attributes_length = cursor.read_u32_be().ok_or_else(short)?;
        let attributes_strings_length = cursor.read_u32_be().ok_or_else(short)?;
        let attributes_strings_count = cursor.read_u32_be().ok_or_else(short)?;
        // reserved; ignored on read
        if !cursor.skip(4) {
            return Err(short());
        }
        let toc_length = cursor.read_u64_be().ok_or_else(short)?;
        let toc_strings_length = cursor.read_u64_be().ok_or_else(short)?;
        let toc_strings_count = cursor.read_u64_be().ok_or_else(short)?;

        check_header_size(prefix.header_size, Self::HEADER_SIZE, FileType::Hpkg)?;

        Ok(HpkgHeader {
            header_size: prefix.header_size,
            version: prefix.version,
            total_size: prefix.total_size,
            minor_version: prefix.minor_version,
            heap_compression: prefix.heap_compression,
            heap_chunk_size: prefix.heap_chunk_size,
            heap_size_compressed: prefix.heap_size_compressed,
            heap_size_uncompressed: prefix.heap_size_uncompressed,
            attributes_length,
            attributes_strings_length,
            attributes_strings_count,
            toc_length,
            toc_strings_length,
            toc_strings_count,
        })
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<HpkgHeader> {
        let buffer = read_leading(reader, Self::HEADER_SIZE, FileType::Hpkg)?;
        Self::parse(&buffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HpkrHeader {
    pub header_size: u16,
    pub version: u16,
    pub total_size: u64,
    pub minor_version: u16,
    pub heap_compression: HeapCompression,
    pub heap_chunk_size: u32,
    pub heap_size_compressed: u64,
    pub heap_size_uncompressed: u64,
    // Repository info section
    pub info_length: u32,
    // Packages section
    pub packages_length: u64,
    pub packages_strings_length: u64,
    pub packages_strings_count: u64,
}

impl HpkrHeader {
    pub fn heap_layout(&self) -> HeapLayout {
        HeapLayout {
            offset: u64::from(self.header_size),
            compression: self.heap_compression,
            chunk_size: u64::from(self.heap_chunk_size),
            size_compressed: self.heap_size_compressed,
            size_uncompressed: self.heap_size_uncompressed,
        }
    }

    /// Heap offset of the first package attribute.
    pub fn packages_attributes_offset(&self) -> u64 {
        u64::from(self.info_length).saturating_add(self.packages_strings_length)
    }
}

pub struct HpkrHeaderParser;

impl HpkrHeaderParser {
    pub const HEADER_SIZE: usize = 72;

    pub fn parse(buffer: &[u8]) -> Result<HpkrHeader> {
        let mut cursor = ByteCursor::new(buffer);
        let prefix = parse_prefix(&mut cursor, FileType::Hpkr)?;
        let short = || truncated(FileType::Hpkr);

        let info_length = cursor.read_u32_be().ok_or_else(short)?;
        // reserved; ignored on read
        if !cursor.skip(4) {
            return Err(short());
        }
        let packages_length = cursor.read_u64_be().ok_or_else(short)?;
        let packages_strings_length = cursor.read_u64_be().ok_or_else(short)?;
        let packages_strings_count = cursor.read_u64_be().ok_or_else(short)?;

        check_header_size(prefix.header_size, Self::HEADER_SIZE, FileType::Hpkr)?;

        Ok(HpkrHeader {
            header_size: prefix.header_size,
            version: prefix.version,
            total_size: prefix.total_size,
            minor_version: prefix.minor_version,
            heap_compression: prefix.heap_compression,
            heap_chunk_size: prefix.heap_chunk_size,
            heap_size_compressed: prefix.heap_size_compressed,
            heap_size_uncompressed: prefix.heap_size_uncompressed,
            info_length,
            packages_length,
            packages_strings_length,
            packages_strings_count,
        })
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<HpkrHeader> {
        let buffer = read_leading(reader, Self::HEADER_SIZE, FileType::Hpkr)?;
        Self::parse(&buffer)
    }
}
