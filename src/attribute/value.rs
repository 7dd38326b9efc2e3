//! Attribute values as they sit in the heap, and as callers see them.

use super::id::AttributeType;
use super::tag::{AttributeEncoding, DataType, IntWidth};
use crate::heap::{ByteSource, HeapCoordinates};
use std::fmt;

/// A value in wire form. String-table and heap values are resolved later
/// through an [`AttributeContext`](super::AttributeContext).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    Int { value: i64, width: IntWidth },
    UInt { value: u64, width: IntWidth },
    InlineString(String),
    /// Index into the section's string table
    TableString(u64),
    InlineRaw(Vec<u8>),
    HeapRaw(HeapCoordinates),
}

impl AttributeValue {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int { .. } => DataType::Int,
            Self::UInt { .. } => DataType::UInt,
            Self::InlineString(_) | Self::TableString(_) => DataType::String,
            Self::InlineRaw(_) | Self::HeapRaw(_) => DataType::Raw,
        }
    }

    pub fn encoding(&self) -> AttributeEncoding {
        match self {
            Self::Int { width, .. } | Self::UInt { width, .. } => AttributeEncoding::Int(*width),
            Self::InlineString(_) => AttributeEncoding::StringInline,
            Self::TableString(_) => AttributeEncoding::StringTable,
            Self::InlineRaw(_) => AttributeEncoding::RawInline,
            Self::HeapRaw(_) => AttributeEncoding::RawHeap,
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Int { .. } | Self::UInt { .. } => AttributeType::Int,
            Self::InlineString(_) | Self::TableString(_) => AttributeType::String,
            Self::InlineRaw(_) | Self::HeapRaw(_) => AttributeType::Raw,
        }
    }

    /// Whether an integer value fits the width it claims.
    pub(crate) fn fits_width(&self) -> bool {
        match *self {
            Self::Int { value, width } => match width {
                IntWidth::Bits8 => i8::try_from(value).is_ok(),
                IntWidth::Bits16 => i16::try_from(value).is_ok(),
                IntWidth::Bits32 => i32::try_from(value).is_ok(),
                IntWidth::Bits64 => true,
            },
            Self::UInt { value, width } => match width {
                IntWidth::Bits8 => u8::try_from(value).is_ok(),
                IntWidth::Bits16 => u16::try_from(value).is_ok(),
                IntWidth::Bits32 => u32::try_from(value).is_ok(),
                IntWidth::Bits64 => true,
            },
            _ => true,
        }
    }
}

macro_rules! int_value_from {
    ($($source:ty => $variant:ident, $width:ident;)+) => {
        $(
            impl From<$source> for AttributeValue {
                fn from(value: $source) -> Self {
                    Self::$variant {
                        value: value.into(),
                        width: IntWidth::$width,
                    }
                }
            }
        )+
    };
}

int_value_from! {
    u8 => UInt, Bits8;
    u16 => UInt, Bits16;
    u32 => UInt, Bits32;
    u64 => UInt, Bits64;
    i8 => Int, Bits8;
    i16 => Int, Bits16;
    i32 => Int, Bits32;
    i64 => Int, Bits64;
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::InlineString(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::InlineString(value.to_string())
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::InlineRaw(value)
    }
}

impl From<&[u8]> for AttributeValue {
    fn from(value: &[u8]) -> Self {
        Self::InlineRaw(value.to_vec())
    }
}

impl From<HeapCoordinates> for AttributeValue {
    fn from(value: HeapCoordinates) -> Self {
        Self::HeapRaw(value)
    }
}

/// A value with string-table and heap references resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Int(i64),
    UInt(u64),
    String(String),
    Raw(ByteSource),
}

impl ResolvedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "a signed integer",
            Self::UInt(_) => "an unsigned integer",
            Self::String(_) => "a string",
            Self::Raw(_) => "raw data",
        }
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Raw(source) => match source.coordinates() {
                Some(coordinates) => write!(f, "{} bytes {}", source.len(), coordinates),
                None => write!(f, "{} bytes", source.len()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_type_and_encoding() {
        assert_eq!(
            AttributeValue::from(7u8).encoding(),
            AttributeEncoding::Int(IntWidth::Bits8)
        );
        assert_eq!(AttributeValue::from(7u32).data_type(), DataType::UInt);
        assert_eq!(
            AttributeValue::from(-1i16),
            AttributeValue::Int {
                value: -1,
                width: IntWidth::Bits16
            }
        );
        assert_eq!(
            AttributeValue::from("x").encoding(),
            AttributeEncoding::StringInline
        );
        assert_eq!(
            AttributeValue::from(vec![1u8, 2]).encoding(),
            AttributeEncoding::RawInline
        );
        assert_eq!(
            AttributeValue::from(HeapCoordinates::new(0, 9)).encoding(),
            AttributeEncoding::RawHeap
        );
    }

    #[test]
    fn test_fits_width() {
        assert!(AttributeValue::UInt { value: 255, width: IntWidth::Bits8 }.fits_width());
        assert!(!AttributeValue::UInt { value: 256, width: IntWidth::Bits8 }.fits_width());
        assert!(!AttributeValue::Int { value: -129, width: IntWidth::Bits8 }.fits_width());
        assert!(AttributeValue::Int { value: i64::MIN, width: IntWidth::Bits64 }.fits_width());
    }

    #[test]
    fn test_resolved_display() {
        assert_eq!(ResolvedValue::Int(-3).to_string(), "-3");
        assert_eq!(
            ResolvedValue::Raw(ByteSource::from(vec![0u8; 12])).to_string(),
            "12 bytes"
        );
    }
}
