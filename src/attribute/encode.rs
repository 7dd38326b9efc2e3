//! Serializing attribute trees into a heap.

use super::node::Attribute;
use super::tag::AttributeTag;
use super::value::AttributeValue;
use crate::error::{HpkError, Result};
use crate::heap::HeapBuilder;

impl HeapBuilder {
    pub fn write_attribute_tag(&mut self, tag: AttributeTag) -> Result<usize> {
        self.write_unsigned_leb128(tag.encode())
    }

    /// Write one attribute: tag, value, then its zero-terminated child list
    /// when it has children. Returns the bytes written.
    pub fn write_attribute(&mut self, attribute: &Attribute) -> Result<usize> {
        let value = attribute.raw();
        let tag = AttributeTag::new(
            value.encoding().code(),
            attribute.has_children(),
            value.data_type().code(),
            attribute.id().code(),
        );

        let mut written = self.write_attribute_tag(tag)?;
        written += self.write_attribute_value(value)?;
        if attribute.has_children() {
            written += self.write_attributes(attribute.children())?;
        }
        Ok(written)
    }

    /// Write a sibling list followed by its zero terminator.
    pub fn write_attributes(&mut self, attributes: &[Attribute]) -> Result<usize> {
        let mut written = 0;
        for attribute in attributes {
            written += self.write_attribute(attribute)?;
        }
        Ok(written + self.write_unsigned_leb128(0)?)
    }

    fn write_attribute_value(&mut self, value: &AttributeValue) -> Result<usize> {
        match value {
            AttributeValue::Int { value, width } => {
                let bytes = value.to_be_bytes();
                self.write_bytes(&bytes[bytes.len() - width.bytes()..])
            }
            AttributeValue::UInt { value, width } => {
                let bytes = value.to_be_bytes();
                self.write_bytes(&bytes[bytes.len() - width.bytes()..])
            }
            AttributeValue::InlineString(value) => self.write_string(value),
            AttributeValue::TableString(index) => Err(HpkError::Precondition(format!(
                "string table reference {index} cannot be written; strings are always inlined"
            ))),
            AttributeValue::InlineRaw(data) => {
                Ok(self.write_unsigned_leb128(data.len() as u64)? + self.write_bytes(data)?)
            }
            AttributeValue::HeapRaw(coordinates) => Ok(self
                .write_unsigned_leb128(coordinates.length)?
                + self.write_unsigned_leb128(coordinates.offset)?),
        }
    }
}
