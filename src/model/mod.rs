//! Typed package model built from attribute trees.

mod architecture;
mod entry;
mod flags;
mod package;
mod pkg;
mod resolvable;
mod url;
mod user;
mod version;
mod writable;

pub use architecture::PkgArchitecture;
pub use entry::{DirectoryEntry, EntryKind, ExtendedFileAttribute, FileKind, FileTimestamp};
pub use flags::PkgFlags;
pub use package::Package;
pub use pkg::Pkg;
pub use resolvable::{CompatibleEntity, ResolvableEntity, ResolvableOperator};
pub use url::PkgUrl;
pub use user::PackageUser;
pub use version::PkgVersion;
pub use writable::{GlobalWritableFile, UserSettingsFile, WritableFileUpdateType};
