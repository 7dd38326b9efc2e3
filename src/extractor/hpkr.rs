use crate::attribute::{AttributeContext, AttributeIterator};
use crate::error::{HpkError, Result};
use crate::heap::{HeapReader, HpkHeapReader};
use crate::parsing::{HpkrHeader, HpkrHeaderParser};
use crate::pkg_iterator::PkgIterator;
use crate::string_table::HpkStringTable;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// An open `.hpkr` repository index.
pub struct HpkrFileExtractor {
    header: HpkrHeader,
    heap_reader: Arc<dyn HeapReader>,
    packages_string_table: HpkStringTable,
}

impl HpkrFileExtractor {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(HpkError::io(format!("opening {}", path.display())))?;
        debug!(path = %path.display(), "opening hpkr file");
        Self::from_reader(file)
    }

    pub fn from_reader<R>(mut source: R) -> Result<Self>
    where
        R: Read + Seek + Send + 'static,
    {
        source
            .seek(SeekFrom::Start(0))
            .map_err(HpkError::io("seeking to the hpkr header"))?;
        let header = HpkrHeaderParser::read(&mut source)?;

        let heap_reader: Arc<dyn HeapReader> =
            Arc::new(HpkHeapReader::new(source, header.heap_layout())?);
        let packages_string_table = HpkStringTable::new(
            Arc::clone(&heap_reader),
            u64::from(header.info_length),
            header.packages_strings_length,
            header.packages_strings_count,
        );

        debug!(
            version = header.version,
            minor_version = header.minor_version,
            compression = ?header.heap_compression,
            heap_uncompressed = header.heap_size_uncompressed,
            info_length = header.info_length,
            packages_length = header.packages_length,
            packages_strings = header.packages_strings_count,
            "read hpkr header"
        );

        Ok(Self {
            header,
            heap_reader,
            packages_string_table,
        })
    }

    pub fn header(&self) -> &HpkrHeader {
        &self.header
    }

    pub fn heap_reader(&self) -> &Arc<dyn HeapReader> {
        &self.heap_reader
    }

    pub fn attribute_context(&self) -> AttributeContext<'_> {
        AttributeContext::new(&self.heap_reader, &self.packages_string_table)
    }

    /// Iterate the top-level `package` attributes.
    pub fn package_attributes_iterator(&self) -> AttributeIterator<'_> {
        AttributeIterator::new(
            self.attribute_context(),
            self.header.packages_attributes_offset(),
        )
    }

    /// Iterate package summaries.
    pub fn packages(&self) -> PkgIterator<'_> {
        PkgIterator::new(self.package_attributes_iterator())
    }
}

impl std::fmt::Debug for HpkrFileExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpkrFileExtractor")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}
