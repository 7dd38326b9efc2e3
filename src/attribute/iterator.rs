//! Decoding a tag stream into attribute trees.

use super::id::AttributeId;
use super::node::{Attribute, AttributeContext};
use super::tag::{AttributeEncoding, AttributeTag, DataType, IntWidth};
use super::value::AttributeValue;
use crate::error::{HpkError, Result};
use crate::heap::HeapCoordinates;
use crate::parsing::leb128::decode_unsigned_leb128;

/// Deepest child nesting accepted before the stream is considered corrupt.
pub const MAX_DEPTH: usize = 256;

/// Depth-first decoder over one sibling list in the heap.
///
/// Each call yields a root attribute with all of its children already
/// decoded; iteration ends at the zero tag closing the list.
#[derive(Debug)]
pub struct AttributeIterator<'a> {
    context: AttributeContext<'a>,
    offset: u64,
    next_tag: Option<u64>,
    depth: usize,
    finished: bool,
}

impl<'a> AttributeIterator<'a> {
    pub fn new(context: AttributeContext<'a>, offset: u64) -> Self {
        Self::at_depth(context, offset, 0)
    }

    fn at_depth(context: AttributeContext<'a>, offset: u64, depth: usize) -> Self {
        Self {
            context,
            offset,
            next_tag: None,
            depth,
            finished: false,
        }
    }

    pub fn context(&self) -> AttributeContext<'a> {
        self.context
    }

    /// Heap offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn has_next(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        Ok(self.peek_tag()? != 0)
    }

    /// Decode the next root attribute, or `None` once the terminator has
    /// been consumed.
    pub fn next_attribute(&mut self) -> Result<Option<Attribute>> {
        if self.finished {
            return Ok(None);
        }

        let tag_value = self.peek_tag()?;
        self.next_tag = None;

        let Some(tag) = AttributeTag::decode(tag_value) else {
            self.finished = true;
            return Ok(None);
        };

        let id = AttributeId::from_code(tag.id).ok_or(HpkError::IllegalAttributeId(tag.id))?;
        let data_type = DataType::from_code(tag.data_type)?;
        let encoding = AttributeEncoding::from_code(data_type, tag.encoding)?;
        let value = self.read_value(data_type, encoding)?;

        if value.attribute_type() != id.attribute_type() {
            return Err(HpkError::AttributeTypeMismatch {
                id: id.name(),
                expected: id.attribute_type().name(),
                actual: data_type.name(),
            });
        }

        let children = if tag.has_children {
            self.read_children()?
        } else {
            Vec::new()
        };

        Ok(Some(Attribute::decoded(id, value, children)))
    }

    /// Decode every remaining root attribute.
    pub fn collect_all(mut self) -> Result<Vec<Attribute>> {
        let mut attributes = Vec::new();
        while let Some(attribute) = self.next_attribute()? {
            attributes.push(attribute);
        }
        Ok(attributes)
    }

    fn read_children(&mut self) -> Result<Vec<Attribute>> {
        if self.depth >= MAX_DEPTH {
            return Err(HpkError::Format(format!(
                "attributes nest deeper than {MAX_DEPTH} levels at heap offset {}",
                self.offset
            )));
        }

        let mut child_iterator = Self::at_depth(self.context, self.offset, self.depth + 1);
        let mut children = Vec::new();
        while let Some(child) = child_iterator.next_attribute()? {
            children.push(child);
        }
        self.offset = child_iterator.offset;
        Ok(children)
    }

    fn peek_tag(&mut self) -> Result<u64> {
        if let Some(tag) = self.next_tag {
            return Ok(tag);
        }
        let tag = self.read_leb128()?;
        self.next_tag = Some(tag);
        Ok(tag)
    }

    fn read_value(&mut self, data_type: DataType, encoding: AttributeEncoding) -> Result<AttributeValue> {
        match (data_type, encoding) {
            (DataType::Int, AttributeEncoding::Int(width)) => {
                let bytes = self.read_int_bytes(width)?;
                Ok(AttributeValue::Int {
                    value: signed_from_be(&bytes),
                    width,
                })
            }
            (DataType::UInt, AttributeEncoding::Int(width)) => {
                let bytes = self.read_int_bytes(width)?;
                Ok(AttributeValue::UInt {
                    value: bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
                    width,
                })
            }
            (DataType::String, AttributeEncoding::StringInline) => {
                self.read_inline_string().map(AttributeValue::InlineString)
            }
            (DataType::String, AttributeEncoding::StringTable) => {
                Ok(AttributeValue::TableString(self.read_leb128()?))
            }
            (DataType::Raw, AttributeEncoding::RawInline) => {
                let length = self.read_leb128()?;
                let data = self.read_bytes(length)?;
                Ok(AttributeValue::InlineRaw(data))
            }
            (DataType::Raw, AttributeEncoding::RawHeap) => {
                let length = self.read_leb128()?;
                let offset = self.read_leb128()?;
                Ok(AttributeValue::HeapRaw(HeapCoordinates::new(offset, length)))
            }
            (other, _) => Err(HpkError::InvalidDataType(other.code())),
        }
    }

    fn heap_size(&self) -> u64 {
        self.context.heap_reader.size()
    }

    fn next_byte(&mut self) -> Result<u8> {
        if self.offset >= self.heap_size() {
            return Err(HpkError::UnexpectedEnd {
                offset: self.offset,
            });
        }
        let byte = self.context.heap_reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, length: u64) -> Result<Vec<u8>> {
        let coordinates = HeapCoordinates::new(self.offset, length);
        if coordinates.end().is_none_or(|end| end > self.heap_size()) {
            return Err(HpkError::UnexpectedEnd {
                offset: self.offset,
            });
        }
        let data = self.context.heap_reader.read_vec(coordinates)?;
        self.offset += length;
        Ok(data)
    }

    fn read_int_bytes(&mut self, width: IntWidth) -> Result<Vec<u8>> {
        self.read_bytes(width.bytes() as u64)
    }

    fn read_leb128(&mut self) -> Result<u64> {
        let start = self.offset;
        decode_unsigned_leb128(start, || self.next_byte())
    }

    fn read_inline_string(&mut self) -> Result<String> {
        let start = self.offset;
        let mut bytes = Vec::new();
        loop {
            match self.next_byte()? {
                0 => break,
                byte => bytes.push(byte),
            }
        }
        String::from_utf8(bytes).map_err(|_| HpkError::InvalidUtf8 { offset: start })
    }
}

impl Iterator for AttributeIterator<'_> {
    type Item = Result<Attribute>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_attribute() {
            Ok(Some(attribute)) => Some(Ok(attribute)),
            Ok(None) => None,
            Err(e) => {
                // An error aborts the whole list
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Sign-extend a big-endian two's-complement integer of 1 to 8 bytes.
fn signed_from_be(bytes: &[u8]) -> i64 {
    let unsigned = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    let shift = 64 - 8 * bytes.len() as u32;
    ((unsigned << shift) as i64) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{HeapBuilder, HeapBuilderOptions, HeapReader, MemoryHeapReader};
    use crate::string_table::HpkStringTable;
    use std::sync::Arc;

    fn heap(bytes: Vec<u8>) -> Arc<dyn HeapReader> {
        Arc::new(MemoryHeapReader::new(bytes))
    }

    fn decode(bytes: Vec<u8>) -> Result<Vec<Attribute>> {
        let heap = heap(bytes);
        let table = HpkStringTable::empty(Arc::clone(&heap));
        AttributeIterator::new(AttributeContext::new(&heap, &table), 0).collect_all()
    }

    fn tag(encoding: u8, children: bool, data_type: DataType, id: AttributeId) -> Vec<u8> {
        crate::parsing::encode_unsigned_leb128(
            AttributeTag::new(encoding, children, data_type.code(), id.code()).encode(),
        )
    }

    #[test]
    fn test_sign_extension() {
        assert_eq!(signed_from_be(&[0xFF]), -1);
        assert_eq!(signed_from_be(&[0x80, 0x00]), -32768);
        assert_eq!(signed_from_be(&[0x00, 0x00, 0x01, 0x00]), 256);
        assert_eq!(signed_from_be(&[0xFF; 8]), -1);
    }

    #[test]
    fn test_decodes_nested_children() {
        let mut bytes = tag(0, true, DataType::String, AttributeId::PackageVersionMajor);
        bytes.extend_from_slice(b"6\0");
        bytes.extend(tag(0, false, DataType::String, AttributeId::PackageVersionMinor));
        bytes.extend_from_slice(b"32\0");
        bytes.extend(tag(0, false, DataType::UInt, AttributeId::PackageVersionRevision));
        bytes.push(8);
        bytes.push(0); // end of children
        bytes.extend(tag(2, false, DataType::Int, AttributeId::FileMtime));
        bytes.extend_from_slice(&(-2i32).to_be_bytes());
        bytes.push(0); // end of list

        let attributes = decode(bytes).unwrap();
        assert_eq!(attributes.len(), 2);

        let major = &attributes[0];
        assert_eq!(major.id(), AttributeId::PackageVersionMajor);
        assert_eq!(major.children().len(), 2);
        assert_eq!(
            major.children()[1].raw(),
            &AttributeValue::UInt {
                value: 8,
                width: IntWidth::Bits8
            }
        );
        assert_eq!(attributes[1].int_value().unwrap(), -2);
    }

    #[test]
    fn test_offset_lands_after_terminator() {
        let mut bytes = tag(0, false, DataType::String, AttributeId::PackageName);
        bytes.extend_from_slice(b"a\0");
        bytes.push(0);
        bytes.extend_from_slice(b"trailing");
        let length = bytes.len() as u64;

        let heap = heap(bytes);
        let table = HpkStringTable::empty(Arc::clone(&heap));
        let mut iterator = AttributeIterator::new(AttributeContext::new(&heap, &table), 0);
        assert!(iterator.has_next().unwrap());
        assert!(iterator.next_attribute().unwrap().is_some());
        assert!(!iterator.has_next().unwrap());
        assert!(iterator.next_attribute().unwrap().is_none());
        assert_eq!(iterator.offset(), length - 8);
    }

    #[test]
    fn test_illegal_id() {
        let bytes = crate::parsing::encode_unsigned_leb128(
            AttributeTag::new(0, false, DataType::String.code(), 99).encode(),
        );
        assert!(matches!(decode(bytes), Err(HpkError::IllegalAttributeId(99))));
    }

    #[test]
    fn test_type_mismatch() {
        // package:name declared STRING but tagged UINT
        let mut bytes = tag(0, false, DataType::UInt, AttributeId::PackageName);
        bytes.extend_from_slice(&[1, 0]);
        let err = decode(bytes).unwrap_err();
        assert!(matches!(err, HpkError::AttributeTypeMismatch { id: "package:name", .. }));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_invalid_type_and_encoding() {
        let bytes = crate::parsing::encode_unsigned_leb128(
            AttributeTag::new(0, false, 0, AttributeId::PackageName.code()).encode(),
        );
        assert!(matches!(decode(bytes), Err(HpkError::InvalidDataType(0))));

        let mut bytes = tag(3, false, DataType::String, AttributeId::PackageName);
        bytes.extend_from_slice(b"x\0\0");
        assert!(matches!(
            decode(bytes),
            Err(HpkError::InvalidEncoding { data_type: "string", encoding: 3 })
        ));
    }

    #[test]
    fn test_premature_end() {
        let mut bytes = tag(0, false, DataType::String, AttributeId::PackageName);
        bytes.extend_from_slice(b"unterminated");
        let err = decode(bytes).unwrap_err();
        assert!(matches!(err, HpkError::UnexpectedEnd { .. }));
        assert!(err.is_format_error());

        let mut bytes = tag(0, false, DataType::Raw, AttributeId::Data);
        bytes.extend_from_slice(&[10, 1, 2]);
        assert!(matches!(decode(bytes), Err(HpkError::UnexpectedEnd { .. })));
    }

    #[test]
    fn test_iterator_fuses_after_error() {
        let heap = heap(vec![0xFF]);
        let table = HpkStringTable::empty(Arc::clone(&heap));
        let mut iterator = AttributeIterator::new(AttributeContext::new(&heap, &table), 0);
        assert!(matches!(iterator.next(), Some(Err(_))));
        assert!(iterator.next().is_none());
    }

    #[test]
    fn test_decodes_builder_output() {
        let mut builder = HeapBuilder::new(HeapBuilderOptions::default()).unwrap();
        let entry = Attribute::new(AttributeId::DirectoryEntry, "readme")
            .unwrap()
            .with_child(Attribute::new(AttributeId::FileType, 0u32).unwrap())
            .with_child(Attribute::new(AttributeId::Data, b"hello".to_vec()).unwrap());
        let written = builder.write_attributes(std::slice::from_ref(&entry)).unwrap();
        assert_eq!(written as u64, builder.uncompressed_size());
        builder.complete().unwrap();

        let mut out = Vec::new();
        builder.write_to_stream(&mut out).unwrap();
        let layout = crate::parsing::HeapLayout {
            offset: 0,
            compression: crate::formats::HeapCompression::Zlib,
            chunk_size: 65536,
            size_compressed: out.len() as u64,
            size_uncompressed: written as u64,
        };
        let reader: Arc<dyn HeapReader> = Arc::new(
            crate::heap::HpkHeapReader::new(std::io::Cursor::new(out), layout).unwrap(),
        );
        let table = HpkStringTable::empty(Arc::clone(&reader));
        let decoded = AttributeIterator::new(AttributeContext::new(&reader, &table), 0)
            .collect_all()
            .unwrap();
        assert_eq!(decoded, vec![entry]);
    }

    #[test]
    fn test_depth_limit() {
        let mut bytes = Vec::new();
        for _ in 0..=MAX_DEPTH {
            bytes.extend(tag(0, true, DataType::String, AttributeId::DirectoryEntry));
            bytes.extend_from_slice(b"d\0");
        }
        bytes.extend(std::iter::repeat(0).take(MAX_DEPTH + 2));
        assert!(matches!(decode(bytes), Err(HpkError::Format(_))));
    }
}
