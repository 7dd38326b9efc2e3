//! Attribute tags.
//!
//! Every attribute starts with one unsigned LEB128 value packing four fields.
//! The value is biased by one so that zero can terminate a sibling list.
//!
//! | Bits (of `tag - 1`) | Field |
//! |---------------------|-------|
//! | 0-6 | attribute id code |
//! | 7-9 | data type (0 invalid, 1 int, 2 uint, 3 string, 4 raw) |
//! | 10 | has-children flag |
//! | 11-12 | encoding |

use super::id::AttributeType;
use crate::error::{HpkError, Result};
use std::fmt;

/// Wire data type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Invalid = 0,
    Int = 1,
    UInt = 2,
    String = 3,
    Raw = 4,
}

impl DataType {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Int),
            2 => Ok(Self::UInt),
            3 => Ok(Self::String),
            4 => Ok(Self::Raw),
            other => Err(HpkError::InvalidDataType(other)),
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Int => "INT",
            Self::UInt => "UINT",
            Self::String => "STRING",
            Self::Raw => "RAW",
        }
    }

    /// The declared type this wire type satisfies.
    pub fn attribute_type(&self) -> Option<AttributeType> {
        match self {
            Self::Invalid => None,
            Self::Int | Self::UInt => Some(AttributeType::Int),
            Self::String => Some(AttributeType::String),
            Self::Raw => Some(AttributeType::Raw),
        }
    }
}

/// Byte width of an integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IntWidth {
    Bits8 = 0,
    Bits16 = 1,
    Bits32 = 2,
    Bits64 = 3,
}

impl IntWidth {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Bits8),
            1 => Ok(Self::Bits16),
            2 => Ok(Self::Bits32),
            3 => Ok(Self::Bits64),
            other => Err(HpkError::InvalidEncoding {
                data_type: "int",
                encoding: other,
            }),
        }
    }

    pub fn bytes(&self) -> usize {
        1 << (*self as u8)
    }
}

/// How a value is laid out after its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeEncoding {
    Int(IntWidth),
    StringInline,
    StringTable,
    RawInline,
    RawHeap,
}

impl AttributeEncoding {
    /// Interpret a 2-bit encoding code for the given wire type.
    pub fn from_code(data_type: DataType, code: u8) -> Result<Self> {
        match (data_type, code) {
            (DataType::Int | DataType::UInt, _) => Ok(Self::Int(IntWidth::from_code(code)?)),
            (DataType::String, 0) => Ok(Self::StringInline),
            (DataType::String, 1) => Ok(Self::StringTable),
            (DataType::String, other) => Err(HpkError::InvalidEncoding {
                data_type: "string",
                encoding: other,
            }),
            (DataType::Raw, 0) => Ok(Self::RawInline),
            (DataType::Raw, 1) => Ok(Self::RawHeap),
            (DataType::Raw, other) => Err(HpkError::InvalidEncoding {
                data_type: "raw",
                encoding: other,
            }),
            (DataType::Invalid, _) => Err(HpkError::InvalidDataType(0)),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Int(width) => *width as u8,
            Self::StringInline | Self::RawInline => 0,
            Self::StringTable | Self::RawHeap => 1,
        }
    }
}

/// The four fields of a tag, unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeTag {
    /// 2 bits
    pub encoding: u8,
    pub has_children: bool,
    /// 3 bits
    pub data_type: u8,
    /// 7 bits
    pub id: u8,
}

impl AttributeTag {
    pub fn new(encoding: u8, has_children: bool, data_type: u8, id: u8) -> Self {
        Self {
            encoding: encoding & 0x3,
            has_children,
            data_type: data_type & 0x7,
            id: id & 0x7F,
        }
    }

    /// Packed value, never zero.
    pub fn encode(&self) -> u64 {
        (u64::from(self.encoding & 0x3) << 11)
            + (u64::from(self.has_children) << 10)
            + (u64::from(self.data_type & 0x7) << 7)
            + u64::from(self.id & 0x7F)
            + 1
    }

    /// Unpack a tag value; `None` for the list terminator.
    pub fn decode(value: u64) -> Option<Self> {
        let biased = value.checked_sub(1)?;
        Some(Self {
            encoding: ((biased >> 11) & 0x3) as u8,
            has_children: (biased >> 10) & 0x1 != 0,
            data_type: ((biased >> 7) & 0x7) as u8,
            id: (biased & 0x7F) as u8,
        })
    }
}

impl fmt::Display for AttributeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} type={} encoding={} children={}",
            self.id, self.data_type, self.encoding, self.has_children
        )
    }
}
