use crate::attribute::{Attribute, AttributeContext, AttributeIterator};
use crate::error::{HpkError, Result};
use crate::heap::{HeapReader, HpkHeapReader};
use crate::parsing::{HpkgHeader, HpkgHeaderParser};
use crate::string_table::HpkStringTable;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// An open `.hpkg` file: header, heap and the string tables of its two
/// attribute sections.
pub struct HpkgFileExtractor {
    header: HpkgHeader,
    heap_reader: Arc<dyn HeapReader>,
    toc_string_table: HpkStringTable,
    toc_attributes_offset: u64,
    attributes_string_table: HpkStringTable,
    package_attributes_offset: u64,
}

impl HpkgFileExtractor {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(HpkError::io(format!("opening {}", path.display())))?;
        debug!(path = %path.display(), "opening hpkg file");
        Self::from_reader(file)
    }

    /// Read an hpkg from any seekable source positioned anywhere; the
    /// header is read from offset zero.
    pub fn from_reader<R>(mut source: R) -> Result<Self>
    where
        R: Read + Seek + Send + 'static,
    {
        source
            .seek(SeekFrom::Start(0))
            .map_err(HpkError::io("seeking to the hpkg header"))?;
        let header = HpkgHeaderParser::read(&mut source)?;

        let toc_offset = header.toc_offset()?;
        let attributes_offset = header.attributes_offset()?;
        if header.toc_strings_length > header.toc_length {
            return Err(HpkError::InvalidHeader(format!(
                "toc strings length {} exceeds the toc length {}",
                header.toc_strings_length, header.toc_length
            )));
        }
        if header.attributes_strings_length > header.attributes_length {
            return Err(HpkError::InvalidHeader(format!(
                "attribute strings length {} exceeds the attributes length {}",
                header.attributes_strings_length, header.attributes_length
            )));
        }

        let heap_reader: Arc<dyn HeapReader> =
            Arc::new(HpkHeapReader::new(source, header.heap_layout())?);

        let toc_string_table = HpkStringTable::new(
            Arc::clone(&heap_reader),
            toc_offset,
            header.toc_strings_length,
            header.toc_strings_count,
        );
        let attributes_string_table = HpkStringTable::new(
            Arc::clone(&heap_reader),
            attributes_offset,
            u64::from(header.attributes_strings_length),
            u64::from(header.attributes_strings_count),
        );

        debug!(
            version = header.version,
            minor_version = header.minor_version,
            compression = ?header.heap_compression,
            heap_compressed = header.heap_size_compressed,
            heap_uncompressed = header.heap_size_uncompressed,
            toc_length = header.toc_length,
            attributes_length = header.attributes_length,
            "read hpkg header"
        );

        Ok(Self {
            toc_attributes_offset: toc_offset + header.toc_strings_length,
            package_attributes_offset: attributes_offset
                + u64::from(header.attributes_strings_length),
            header,
            heap_reader,
            toc_string_table,
            attributes_string_table,
        })
    }

    pub fn header(&self) -> &HpkgHeader {
        &self.header
    }

    pub fn heap_reader(&self) -> &Arc<dyn HeapReader> {
        &self.heap_reader
    }

    pub fn toc_context(&self) -> AttributeContext<'_> {
        AttributeContext::new(&self.heap_reader, &self.toc_string_table)
    }

    pub fn package_attributes_context(&self) -> AttributeContext<'_> {
        AttributeContext::new(&self.heap_reader, &self.attributes_string_table)
    }

    pub fn toc_iterator(&self) -> AttributeIterator<'_> {
        AttributeIterator::new(self.toc_context(), self.toc_attributes_offset)
    }

    pub fn package_attributes_iterator(&self) -> AttributeIterator<'_> {
        AttributeIterator::new(
            self.package_attributes_context(),
            self.package_attributes_offset,
        )
    }

    /// Decode the whole table of contents.
    pub fn toc(&self) -> Result<Vec<Attribute>> {
        self.toc_iterator().collect_all()
    }

    /// Decode all package attributes.
    pub fn package_attributes(&self) -> Result<Vec<Attribute>> {
        self.package_attributes_iterator().collect_all()
    }
}

impl std::fmt::Debug for HpkgFileExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpkgFileExtractor")
            .field("header", &self.header)
            .field("toc_attributes_offset", &self.toc_attributes_offset)
            .field("package_attributes_offset", &self.package_attributes_offset)
            .finish_non_exhaustive()
    }
}
