//! Opening package files.
//!
//! An extractor owns the file handle (through its heap reader) and the
//! string tables; the [`AttributeContext`](crate::attribute::AttributeContext)
//! values it hands out borrow from it.

mod hpkg;
mod hpkr;

pub use hpkg::HpkgFileExtractor;
pub use hpkr::HpkrFileExtractor;
