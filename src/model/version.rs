use std::fmt;

/// A package version: `major[.minor][.micro][~pre_release][-revision]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PkgVersion {
    pub major: String,
    pub minor: Option<String>,
    pub micro: Option<String>,
    pub pre_release: Option<String>,
    pub revision: Option<u32>,
}

impl PkgVersion {
    pub fn new(major: impl Into<String>) -> Self {
        Self {
            major: major.into(),
            ..Self::default()
        }
    }

    pub fn with_minor(mut self, minor: impl Into<String>) -> Self {
        self.minor = Some(minor.into());
        self
    }

    pub fn with_micro(mut self, micro: impl Into<String>) -> Self {
        self.micro = Some(micro.into());
        self
    }

    pub fn with_pre_release(mut self, pre_release: impl Into<String>) -> Self {
        self.pre_release = Some(pre_release.into());
        self
    }

    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = Some(revision);
        self
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.major)?;
        if let Some(minor) = &self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(micro) = &self.micro {
            write!(f, ".{micro}")?;
        }
        if let Some(pre_release) = &self.pre_release {
            write!(f, "~{pre_release}")?;
        }
        if let Some(revision) = self.revision {
            write!(f, "-{revision}")?;
        }
        Ok(())
    }
}
