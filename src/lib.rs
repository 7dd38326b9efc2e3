//! Reader and writer for Haiku package files.
//!
//! Handles `.hpkg` package archives and `.hpkr` repository indices: the
//! fixed headers, the chunked zlib heap, the tagged attribute trees stored
//! in it, and a typed package model on top.
//!
//! ## Features
//! - `cli` - the `hpk-attribute-dump` and `hpk-pkg-dump` tools
//!
//! ## Reading
//!
//! ```no_run
//! use hpkg_stream::{HpkgFileExtractor, Package};
//!
//! let extractor = HpkgFileExtractor::open("zlib-1.3-1-x86_64.hpkg")?;
//! let package = Package::from_hpkg(&extractor)?;
//! println!("{} {:?}", package.name, package.version);
//! # Ok::<(), hpkg_stream::HpkError>(())
//! ```

pub mod assembly;
pub mod attribute;
pub mod error;
pub mod extractor;
pub mod formats;
pub mod heap;
pub mod model;
pub mod output;
pub mod parsing;
pub mod pkg_iterator;
pub mod string_table;
pub mod writer;

pub use attribute::{Attribute, AttributeContext, AttributeId, AttributeIterator, AttributeValue};
pub use error::{HpkError, Result};
pub use extractor::{HpkgFileExtractor, HpkrFileExtractor};
pub use formats::{FileType, HeapCompression};
pub use heap::{ByteSource, HeapReader, HpkHeapReader};
pub use model::{DirectoryEntry, Package, Pkg, PkgArchitecture, PkgUrl, PkgVersion};
pub use output::{AttributeWriter, PkgWriter};
pub use pkg_iterator::PkgIterator;
pub use writer::{HpkgWriter, WriterOptions};
