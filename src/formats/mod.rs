//! HPK file kinds and heap compression codes.

use crate::error::{HpkError, Result};

/// File kind, detected from the 4-byte magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Installable package archive.
    Hpkg,
    /// Repository index.
    Hpkr,
}

impl FileType {
    pub const HPKG: &[u8; 4] = b"hpkg";
    pub const HPKR: &[u8; 4] = b"hpkr";

    pub fn magic(&self) -> &'static [u8; 4] {
        match self {
            Self::Hpkg => Self::HPKG,
            Self::Hpkr => Self::HPKR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hpkg => "hpkg",
            Self::Hpkr => "hpkr",
        }
    }

    /// Match the magic case-insensitively.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let magic = data.get(..4)?;
        if magic.eq_ignore_ascii_case(Self::HPKG) {
            Some(Self::Hpkg)
        } else if magic.eq_ignore_ascii_case(Self::HPKR) {
            Some(Self::Hpkr)
        } else {
            None
        }
    }

    /// Detect the kind of the file at `path` from its first four bytes.
    pub fn detect(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use std::io::Read;

        let path = path.as_ref();
        let mut file = std::fs::File::open(path)
            .map_err(HpkError::io(format!("opening {}", path.display())))?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)
            .map_err(HpkError::io("reading the 4-byte magic"))?;
        Self::from_bytes(&magic).ok_or(HpkError::InvalidMagic {
            expected: "hpkg or hpkr",
            found: magic,
        })
    }
}

/// Compression applied to each heap chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum HeapCompression {
    None = 0,
    #[default]
    Zlib = 1,
}

impl HeapCompression {
    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Zlib),
            other => Err(HpkError::UnsupportedCompression(other)),
        }
    }

    pub fn code(&self) -> u16 {
        *self as u16
    }
}
