//! Conversion between attribute trees and the package model.
//!
//! [`PackageReader`] and [`PkgFactory`] go from attributes to model types;
//! the free functions go the other way and are used by
//! [`HpkgWriter`](crate::writer::HpkgWriter).

mod read;
mod write;

pub use read::{PackageReader, PkgFactory};
pub use write::{directory_entry_attribute, package_attributes, version_attribute};
