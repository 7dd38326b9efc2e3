//! The fixed attribute id table.

use std::fmt;

/// Semantic type an attribute id declares for its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Satisfied by both signed and unsigned wire values.
    Int,
    String,
    Raw,
}

impl AttributeType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::String => "STRING",
            Self::Raw => "RAW",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! attribute_ids {
    ($($variant:ident = $code:literal => $name:literal, $kind:ident;)+) => {
        /// Every attribute id the format defines, indexed by its 7-bit code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum AttributeId {
            $($variant = $code,)+
        }

        impl AttributeId {
            /// All ids in code order; `ALL[code]` is the id with that code.
            pub const ALL: &'static [AttributeId] = &[$(AttributeId::$variant,)+];

            /// Dotted name, e.g. `package:version.major`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            pub fn attribute_type(&self) -> AttributeType {
                match self {
                    $(Self::$variant => AttributeType::$kind,)+
                }
            }
        }
    };
}

attribute_ids! {
    DirectoryEntry = 0 => "dir:entry", String;
    FileType = 1 => "file:type", Int;
    FilePermissions = 2 => "file:permissions", Int;
    FileUser = 3 => "file:user", String;
    FileGroup = 4 => "file:group", String;
    FileAtime = 5 => "file:atime", Int;
    FileMtime = 6 => "file:mtime", Int;
    FileCrtime = 7 => "file:crtime", Int;
    FileAtimeNanos = 8 => "file:atime:nanos", Int;
    FileMtimeNanos = 9 => "file:mtime:nanos", Int;
    FileCrtimeNanos = 10 => "file:crtime:nanos", Int;
    FileAttribute = 11 => "file:attribute", String;
    FileAttributeType = 12 => "file:attribute:type", Int;
    Data = 13 => "data", Raw;
    SymlinkPath = 14 => "symlink:path", String;
    PackageName = 15 => "package:name", String;
    PackageSummary = 16 => "package:summary", String;
    PackageDescription = 17 => "package:description", String;
    PackageVendor = 18 => "package:vendor", String;
    PackagePackager = 19 => "package:packager", String;
    PackageFlags = 20 => "package:flags", Int;
    PackageArchitecture = 21 => "package:architecture", Int;
    PackageVersionMajor = 22 => "package:version.major", String;
    PackageVersionMinor = 23 => "package:version.minor", String;
    PackageVersionMicro = 24 => "package:version.micro", String;
    PackageVersionRevision = 25 => "package:version.revision", Int;
    PackageCopyright = 26 => "package:copyright", String;
    PackageLicense = 27 => "package:license", String;
    PackageProvides = 28 => "package:provides", String;
    PackageRequires = 29 => "package:requires", String;
    PackageSupplements = 30 => "package:supplements", String;
    PackageConflicts = 31 => "package:conflicts", String;
    PackageFreshens = 32 => "package:freshens", String;
    PackageReplaces = 33 => "package:replaces", String;
    PackageResolvableOperator = 34 => "package:resolvable.operator", Int;
    PackageChecksum = 35 => "package:checksum", String;
    PackageVersionPreRelease = 36 => "package:version.prerelease", String;
    PackageProvidesCompatible = 37 => "package:provides.compatible", String;
    PackageUrl = 38 => "package:url", String;
    PackageSourceUrl = 39 => "package:source-url", String;
    PackageInstallPath = 40 => "package:install-path", String;
    PackageBasePackage = 41 => "package:base-package", String;
    PackageGlobalWritableFile = 42 => "package:global-writable-file", String;
    PackageUserSettingsFile = 43 => "package:user-settings-file", String;
    PackageWritableFileUpdateType = 44 => "package:writable-file-update-type", Int;
    PackageSettingsFileTemplate = 45 => "package:settings-file-template", String;
    PackageUser = 46 => "package:user", String;
    PackageUserRealName = 47 => "package:user.real-name", String;
    PackageUserHome = 48 => "package:user.home", String;
    PackageUserShell = 49 => "package:user.shell", String;
    PackageUserGroup = 50 => "package:user.group", String;
    PackageGroup = 51 => "package:group", String;
    PackagePostInstallScript = 52 => "package:post-install-script", String;
    PackageIsWritableDirectory = 53 => "package:is-writable-directory", Int;
    Package = 54 => "package", String;
}

impl AttributeId {
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
