use std::fmt;

/// What happens to a modified writable file on package update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WritableFileUpdateType {
    /// the old file is kept
    KeepOld = 0,
    /// the old file must be updated by hand
    Manual = 1,
    /// a three-way merge is attempted
    AutoMerge = 2,
}

impl WritableFileUpdateType {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::KeepOld),
            1 => Some(Self::Manual),
            2 => Some(Self::AutoMerge),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::KeepOld => "keep-old",
            Self::Manual => "manual",
            Self::AutoMerge => "auto-merge",
        }
    }
}

impl fmt::Display for WritableFileUpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A system-wide file or directory the package expects to be writable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalWritableFile {
    pub path: String,
    pub update_type: Option<WritableFileUpdateType>,
    pub is_directory: bool,
}

impl fmt::Display for GlobalWritableFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.is_directory {
            f.write_str(" directory")?;
        }
        if let Some(update_type) = self.update_type {
            write!(f, " {update_type}")?;
        }
        Ok(())
    }
}

/// A per-user settings file, optionally seeded from a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserSettingsFile {
    pub path: String,
    pub template_path: Option<String>,
    pub is_directory: bool,
}

impl fmt::Display for UserSettingsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.is_directory {
            f.write_str(" directory")?;
        }
        if let Some(template) = &self.template_path {
            write!(f, " template {template}")?;
        }
        Ok(())
    }
}
