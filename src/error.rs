//! Error types for HPKG/HPKR parsing and writing.
//!
//! This module provides the [`HpkError`] type which covers every failure the
//! heap, attribute and package layers can report.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Format | [`InvalidMagic`], [`IllegalAttributeId`], [`Inflate`], ... | File content is malformed or unsupported |
//! | Precondition | [`Precondition`], [`OutOfBounds`], [`HeapCompleted`] | Caller misuse, not corrupt data |
//! | I/O | [`Io`] | Underlying file failed, with the phase that failed |
//!
//! ## Example
//!
//! ```rust,ignore
//! use hpkg_stream::{HpkError, HpkgFileExtractor};
//!
//! match HpkgFileExtractor::open("haiku.hpkg") {
//!     Ok(extractor) => println!("{} bytes of heap", extractor.header().heap_size_uncompressed),
//!     Err(HpkError::InvalidMagic { .. }) => eprintln!("Not an hpkg file"),
//!     Err(e) if e.is_io() => eprintln!("Could not read file: {}", e),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! [`InvalidMagic`]: HpkError::InvalidMagic
//! [`IllegalAttributeId`]: HpkError::IllegalAttributeId
//! [`Inflate`]: HpkError::Inflate
//! [`Precondition`]: HpkError::Precondition
//! [`OutOfBounds`]: HpkError::OutOfBounds
//! [`HeapCompleted`]: HpkError::HeapCompleted
//! [`Io`]: HpkError::Io

use std::io;
use thiserror::Error;

/// Error type for HPKG/HPKR operations.
#[derive(Debug, Error)]
pub enum HpkError {
    /// The first four bytes are not the expected magic.
    ///
    /// HPKG files start with `hpkg`, HPKR files with `hpkr`.
    #[error("invalid magic {found:?}; expected {expected}")]
    InvalidMagic {
        /// Magic token that was required.
        expected: &'static str,
        /// The four bytes that were actually found.
        found: [u8; 4],
    },

    /// A fixed header field has an impossible value.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The header names a heap compression this library does not know.
    #[error("unknown heap compression {0}")]
    UnsupportedCompression(u16),

    /// A heap chunk length in the size table is out of range.
    #[error("heap chunk {chunk} has length {length}: {reason}")]
    ChunkLength {
        chunk: usize,
        length: i64,
        reason: &'static str,
    },

    /// A compressed heap chunk could not be inflated.
    #[error("unable to inflate heap chunk {chunk}: {reason}")]
    Inflate { chunk: usize, reason: String },

    /// The attribute stream ran past the end of the heap.
    #[error("unexpected end of attribute data at heap offset {offset}")]
    UnexpectedEnd { offset: u64 },

    /// An unsigned LEB128 value needs more than 64 bits.
    #[error("LEB128 value at heap offset {offset} overflows 64 bits")]
    Leb128Overflow { offset: u64 },

    /// An inline string is not valid UTF-8.
    #[error("invalid UTF-8 in string at heap offset {offset}")]
    InvalidUtf8 { offset: u64 },

    /// A tag carries an attribute id outside the fixed table.
    #[error("illegal id; {0}")]
    IllegalAttributeId(u8),

    /// A tag carries a data type code that is not INT, UINT, STRING or RAW.
    #[error("unable to read the tag type [{0}]")]
    InvalidDataType(u8),

    /// A tag carries an encoding that does not exist for its data type.
    #[error("unknown {data_type} encoding; {encoding}")]
    InvalidEncoding {
        data_type: &'static str,
        encoding: u8,
    },

    /// The decoded value type disagrees with the attribute id's declared type.
    #[error("mismatch in attribute type for id {id}; expecting {expected}, but got {actual}")]
    AttributeTypeMismatch {
        id: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// The string table does not hold the advertised number of strings.
    #[error("string table: {0}")]
    StringTable(String),

    /// A package checksum was found where it cannot be trusted.
    #[error("the package checksum attribute is not supported when re-reading a package")]
    ChecksumNotSupported,

    /// A required attribute is absent.
    #[error("the {0} attribute must be present")]
    MissingAttribute(&'static str),

    /// An attribute held a value of a different kind than the model expects.
    #[error("attribute {id} does not hold {expected}")]
    UnexpectedValue {
        id: &'static str,
        expected: &'static str,
    },

    /// Any other malformed content.
    #[error("{0}")]
    Format(String),

    /// Caller supplied an invalid argument.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A heap read was requested outside the uncompressed heap.
    #[error("heap read at offset {offset} of {length} bytes exceeds heap size {size}")]
    OutOfBounds { offset: u64, length: u64, size: u64 },

    /// The heap builder was written to after completion, or dumped before it.
    #[error("{0}")]
    HeapCompleted(&'static str),

    /// An I/O error, with the phase that was running.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl HpkError {
    /// Wrap an [`io::Error`] with a description of what was being done.
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    /// Malformed or unsupported file content.
    pub fn is_format_error(&self) -> bool {
        !self.is_precondition() && !self.is_io()
    }

    /// Caller misuse rather than bad data.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Precondition(_) | Self::OutOfBounds { .. } | Self::HeapCompleted(_)
        )
    }

    /// Failure of the underlying file.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl From<io::Error> for HpkError {
    fn from(source: io::Error) -> Self {
        Self::Io {
            context: "i/o".to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HpkError>;
