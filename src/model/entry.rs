use crate::heap::ByteSource;
use std::fmt;

/// Seconds since the epoch plus a nanosecond remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl FileTimestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }
}

impl fmt::Display for FileTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// The `file:type` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FileKind {
    File = 0,
    Directory = 1,
    Symlink = 2,
}

impl FileKind {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::File),
            1 => Some(Self::Directory),
            2 => Some(Self::Symlink),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Type-specific payload of an entry. Exactly one exists per entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    File { data: Option<ByteSource> },
    Directory { children: Vec<DirectoryEntry> },
    Symlink { target: Option<String> },
}

impl EntryKind {
    pub fn file_kind(&self) -> FileKind {
        match self {
            Self::File { .. } => FileKind::File,
            Self::Directory { .. } => FileKind::Directory,
            Self::Symlink { .. } => FileKind::Symlink,
        }
    }
}

/// A BFS-style extended attribute attached to an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedFileAttribute {
    pub name: String,
    pub attribute_type: Option<u32>,
    pub data: Option<ByteSource>,
}

impl fmt::Display for ExtendedFileAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(attribute_type) = self.attribute_type {
            write!(f, " - Type: {attribute_type}")?;
        }
        Ok(())
    }
}

/// One node of the package file tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    pub permissions: Option<u32>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub access_time: Option<FileTimestamp>,
    pub modified_time: Option<FileTimestamp>,
    pub creation_time: Option<FileTimestamp>,
    pub attributes: Vec<ExtendedFileAttribute>,
}

impl DirectoryEntry {
    fn with_kind(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            permissions: None,
            user: None,
            group: None,
            access_time: None,
            modified_time: None,
            creation_time: None,
            attributes: Vec::new(),
        }
    }

    pub fn file(name: impl Into<String>, data: impl Into<ByteSource>) -> Self {
        Self::with_kind(
            name,
            EntryKind::File {
                data: Some(data.into()),
            },
        )
    }

    pub fn directory(name: impl Into<String>, children: Vec<DirectoryEntry>) -> Self {
        Self::with_kind(name, EntryKind::Directory { children })
    }

    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            EntryKind::Symlink {
                target: Some(target.into()),
            },
        )
    }

    pub(crate) fn empty(name: impl Into<String>, kind: FileKind) -> Self {
        let kind = match kind {
            FileKind::File => EntryKind::File { data: None },
            FileKind::Directory => EntryKind::Directory {
                children: Vec::new(),
            },
            FileKind::Symlink => EntryKind::Symlink { target: None },
        };
        Self::with_kind(name, kind)
    }

    pub fn file_kind(&self) -> FileKind {
        self.kind.file_kind()
    }

    /// Children of a directory; empty for anything else.
    pub fn children(&self) -> &[DirectoryEntry] {
        match &self.kind {
            EntryKind::Directory { children } => children,
            _ => &[],
        }
    }

    pub fn data(&self) -> Option<&ByteSource> {
        match &self.kind {
            EntryKind::File { data } => data.as_ref(),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Symlink { target } => target.as_deref(),
            _ => None,
        }
    }

    /// Depth-first walk yielding `(path, entry)` pairs.
    pub fn walk(&self) -> Vec<(String, &DirectoryEntry)> {
        let mut out = Vec::new();
        self.walk_into(String::new(), &mut out);
        out
    }

    fn walk_into<'a>(&'a self, parent: String, out: &mut Vec<(String, &'a DirectoryEntry)>) {
        let path = if parent.is_empty() {
            self.name.clone()
        } else {
            format!("{parent}/{}", self.name)
        };
        out.push((path.clone(), self));
        for child in self.children() {
            child.walk_into(path.clone(), out);
        }
    }
}
