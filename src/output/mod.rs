//! Human-readable text dumps.

mod attribute_writer;
mod pkg_writer;

pub use attribute_writer::AttributeWriter;
pub use pkg_writer::PkgWriter;
