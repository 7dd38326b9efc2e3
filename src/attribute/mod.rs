//! The self-describing attribute tree.
//!
//! Package metadata and the table of contents are both stored as lists of
//! attributes. Each attribute is a tag (see [`AttributeTag`]), a value whose
//! layout the tag selects, and optionally a nested list of children. A zero
//! tag ends every list.
//!
//! Decoding keeps values in wire form ([`AttributeValue`]); string-table and
//! heap references are only followed when a caller asks for the value with
//! an [`AttributeContext`].

mod encode;
mod id;
mod iterator;
mod node;
mod tag;
mod value;

pub use id::{AttributeId, AttributeType};
pub use iterator::{AttributeIterator, MAX_DEPTH};
pub use node::{Attribute, AttributeContext};
pub use tag::{AttributeEncoding, AttributeTag, DataType, IntWidth};
pub use value::{AttributeValue, ResolvedValue};
