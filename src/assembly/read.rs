//! Attribute trees to package model.

use crate::attribute::{Attribute, AttributeContext, AttributeId};
use crate::error::{HpkError, Result};
use crate::model::{
    CompatibleEntity, DirectoryEntry, EntryKind, ExtendedFileAttribute, FileKind, FileTimestamp,
    GlobalWritableFile, Package, PackageUser, Pkg, PkgArchitecture, PkgFlags, PkgUrl, PkgVersion,
    ResolvableEntity, ResolvableOperator, UserSettingsFile, WritableFileUpdateType,
};
use tracing::trace;

/// Builds a [`Package`] from the two attribute sections of an hpkg.
#[derive(Debug, Clone, Copy)]
pub struct PackageReader<'a> {
    attributes: AttributeContext<'a>,
    toc: AttributeContext<'a>,
}

impl<'a> PackageReader<'a> {
    pub fn new(attributes: AttributeContext<'a>, toc: AttributeContext<'a>) -> Self {
        Self { attributes, toc }
    }

    pub fn read_package(&self, attributes: &[Attribute], toc: &[Attribute]) -> Result<Package> {
        let ctx = &self.attributes;
        let mut package = Package::default();
        let mut name = None;

        for attribute in attributes {
            match attribute.id() {
                AttributeId::PackageName => name = Some(attribute.string_value(ctx)?),
                AttributeId::PackageSummary => {
                    package.summary = Some(attribute.string_value(ctx)?);
                }
                AttributeId::PackageDescription => {
                    package.description = Some(attribute.string_value(ctx)?);
                }
                AttributeId::PackageVendor => package.vendor = Some(attribute.string_value(ctx)?),
                AttributeId::PackagePackager => {
                    package.packager = Some(attribute.string_value(ctx)?);
                }
                AttributeId::PackageBasePackage => {
                    package.base_package = Some(attribute.string_value(ctx)?);
                }
                AttributeId::PackageInstallPath => {
                    package.install_path = Some(attribute.string_value(ctx)?);
                }
                AttributeId::PackageFlags => {
                    package.flags = PkgFlags::from_bits(u32_value(attribute)?);
                }
                AttributeId::PackageArchitecture => {
                    package.architecture = Some(read_architecture(attribute)?);
                }
                AttributeId::PackageVersionMajor => {
                    package.version = Some(read_version(ctx, attribute)?);
                }
                AttributeId::PackageCopyright => {
                    package.copyrights.push(attribute.string_value(ctx)?);
                }
                AttributeId::PackageLicense => package.licenses.push(attribute.string_value(ctx)?),
                AttributeId::PackageUrl => package.urls.extend(read_url(ctx, attribute)?),
                AttributeId::PackageSourceUrl => {
                    package.source_urls.extend(read_url(ctx, attribute)?);
                }
                AttributeId::PackageProvides => {
                    package.provides.push(read_compatible(ctx, attribute)?);
                }
                AttributeId::PackageRequires => {
                    package.requires.push(read_resolvable(ctx, attribute)?);
                }
                AttributeId::PackageSupplements => {
                    package.supplements.push(read_resolvable(ctx, attribute)?);
                }
                AttributeId::PackageConflicts => {
                    package.conflicts.push(read_resolvable(ctx, attribute)?);
                }
                AttributeId::PackageFreshens => {
                    package.freshens.push(read_resolvable(ctx, attribute)?);
                }
                AttributeId::PackageReplaces => package.replaces.push(attribute.string_value(ctx)?),
                AttributeId::PackageGlobalWritableFile => {
                    package
                        .global_writable_files
                        .push(read_global_writable_file(ctx, attribute)?);
                }
                AttributeId::PackageUserSettingsFile => {
                    package
                        .user_settings_files
                        .push(read_user_settings_file(ctx, attribute)?);
                }
                AttributeId::PackageUser => package.users.push(read_user(ctx, attribute)?),
                AttributeId::PackageGroup => package.groups.push(attribute.string_value(ctx)?),
                AttributeId::PackagePostInstallScript => {
                    package
                        .post_install_scripts
                        .push(attribute.string_value(ctx)?);
                }
                AttributeId::PackageChecksum => return Err(HpkError::ChecksumNotSupported),
                other => trace!(id = other.name(), "skipping package attribute"),
            }
        }

        package.name = name.ok_or(HpkError::MissingAttribute(AttributeId::PackageName.name()))?;
        package.directory_entries = toc
            .iter()
            .filter(|attribute| attribute.id() == AttributeId::DirectoryEntry)
            .map(|attribute| self.read_directory_entry(attribute))
            .collect::<Result<_>>()?;
        Ok(package)
    }

    /// Build one entry, recursing into directories.
    pub fn read_directory_entry(&self, attribute: &Attribute) -> Result<DirectoryEntry> {
        let ctx = &self.toc;
        if attribute.id() != AttributeId::DirectoryEntry {
            return Err(unexpected_id(AttributeId::DirectoryEntry, attribute));
        }

        let name = attribute.string_value(ctx)?;
        let kind = match attribute.child(AttributeId::FileType) {
            Some(file_type) => {
                let code = file_type.uint_value()?;
                FileKind::from_code(code)
                    .ok_or_else(|| HpkError::Format(format!("unknown file type {code} for {name}")))?
            }
            None => FileKind::File,
        };

        let mut entry = DirectoryEntry::empty(name, kind);
        entry.kind = match kind {
            FileKind::File => EntryKind::File {
                data: attribute
                    .child(AttributeId::Data)
                    .map(|data| data.raw_value(ctx))
                    .transpose()?,
            },
            FileKind::Directory => EntryKind::Directory {
                children: attribute
                    .children_with(AttributeId::DirectoryEntry)
                    .map(|child| self.read_directory_entry(child))
                    .collect::<Result<_>>()?,
            },
            FileKind::Symlink => EntryKind::Symlink {
                target: attribute
                    .child(AttributeId::SymlinkPath)
                    .map(|target| target.string_value(ctx))
                    .transpose()?,
            },
        };

        entry.permissions = attribute
            .child(AttributeId::FilePermissions)
            .map(u32_value)
            .transpose()?;
        entry.user = optional_string(ctx, attribute, AttributeId::FileUser)?;
        entry.group = optional_string(ctx, attribute, AttributeId::FileGroup)?;
        entry.access_time =
            read_timestamp(attribute, AttributeId::FileAtime, AttributeId::FileAtimeNanos)?;
        entry.modified_time =
            read_timestamp(attribute, AttributeId::FileMtime, AttributeId::FileMtimeNanos)?;
        entry.creation_time =
            read_timestamp(attribute, AttributeId::FileCrtime, AttributeId::FileCrtimeNanos)?;
        entry.attributes = attribute
            .children_with(AttributeId::FileAttribute)
            .map(|file_attribute| {
                Ok(ExtendedFileAttribute {
                    name: file_attribute.string_value(ctx)?,
                    attribute_type: file_attribute
                        .child(AttributeId::FileAttributeType)
                        .map(u32_value)
                        .transpose()?,
                    data: file_attribute
                        .child(AttributeId::Data)
                        .map(|data| data.raw_value(ctx))
                        .transpose()?,
                })
            })
            .collect::<Result<_>>()?;

        Ok(entry)
    }
}

/// Turns top-level `package` attributes of a repository index into [`Pkg`]
/// summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PkgFactory;

impl PkgFactory {
    pub fn new() -> Self {
        Self
    }

    /// Name, version and architecture are required.
    pub fn create_package(&self, ctx: &AttributeContext<'_>, attribute: &Attribute) -> Result<Pkg> {
        if attribute.id() != AttributeId::Package {
            return Err(unexpected_id(AttributeId::Package, attribute));
        }

        let name = attribute
            .require_child(AttributeId::PackageName)?
            .string_value(ctx)?;
        let version = read_version(ctx, attribute.require_child(AttributeId::PackageVersionMajor)?)?;
        let architecture =
            read_architecture(attribute.require_child(AttributeId::PackageArchitecture)?)?;

        let strings = |id: AttributeId| {
            attribute
                .children_with(id)
                .map(|child| child.string_value(ctx))
                .collect::<Result<Vec<_>>>()
        };

        let home_page_url = match attribute.child(AttributeId::PackageUrl) {
            Some(url) => read_url(ctx, url)?,
            None => None,
        };

        Ok(Pkg {
            name: Some(name),
            version: Some(version),
            architecture: Some(architecture),
            vendor: optional_string(ctx, attribute, AttributeId::PackageVendor)?,
            copyrights: strings(AttributeId::PackageCopyright)?,
            licenses: strings(AttributeId::PackageLicense)?,
            summary: optional_string(ctx, attribute, AttributeId::PackageSummary)?,
            description: optional_string(ctx, attribute, AttributeId::PackageDescription)?,
            home_page_url,
        })
    }
}

fn unexpected_id(expected: AttributeId, attribute: &Attribute) -> HpkError {
    HpkError::Format(format!(
        "expected a {} attribute but found {}",
        expected.name(),
        attribute.id().name()
    ))
}

fn u32_value(attribute: &Attribute) -> Result<u32> {
    u32::try_from(attribute.uint_value()?).map_err(|_| HpkError::UnexpectedValue {
        id: attribute.id().name(),
        expected: "a 32-bit unsigned integer",
    })
}

fn optional_string(
    ctx: &AttributeContext<'_>,
    attribute: &Attribute,
    id: AttributeId,
) -> Result<Option<String>> {
    attribute
        .child(id)
        .map(|child| child.string_value(ctx))
        .transpose()
}

fn read_architecture(attribute: &Attribute) -> Result<PkgArchitecture> {
    let code = attribute.uint_value()?;
    PkgArchitecture::from_code(code)
        .ok_or_else(|| HpkError::Format(format!("unknown package architecture {code}")))
}

/// Empty URL strings are dropped.
fn read_url(ctx: &AttributeContext<'_>, attribute: &Attribute) -> Result<Option<PkgUrl>> {
    let value = attribute.string_value(ctx)?;
    if value.trim().is_empty() {
        return Ok(None);
    }
    PkgUrl::parse(&value).map(Some)
}

/// Read a version whose major part is the attribute's own value. The id
/// varies: `package:version.major` or `package:provides.compatible`.
fn read_version(ctx: &AttributeContext<'_>, attribute: &Attribute) -> Result<PkgVersion> {
    let mut version = PkgVersion::new(attribute.string_value(ctx)?);
    for child in attribute.children() {
        match child.id() {
            AttributeId::PackageVersionMinor => version.minor = Some(child.string_value(ctx)?),
            AttributeId::PackageVersionMicro => version.micro = Some(child.string_value(ctx)?),
            AttributeId::PackageVersionPreRelease => {
                version.pre_release = Some(child.string_value(ctx)?);
            }
            AttributeId::PackageVersionRevision => version.revision = Some(u32_value(child)?),
            _ => {}
        }
    }
    Ok(version)
}

fn read_resolvable(ctx: &AttributeContext<'_>, attribute: &Attribute) -> Result<ResolvableEntity> {
    let operator = match attribute.child(AttributeId::PackageResolvableOperator) {
        Some(operator) => {
            let code = operator.uint_value()?;
            Some(ResolvableOperator::from_code(code).ok_or_else(|| {
                HpkError::Format(format!("unknown resolvable operator {code}"))
            })?)
        }
        None => None,
    };

    Ok(ResolvableEntity {
        name: attribute.string_value(ctx)?,
        operator,
        version: attribute
            .child(AttributeId::PackageVersionMajor)
            .map(|version| read_version(ctx, version))
            .transpose()?,
    })
}

fn read_compatible(ctx: &AttributeContext<'_>, attribute: &Attribute) -> Result<CompatibleEntity> {
    Ok(CompatibleEntity {
        name: attribute.string_value(ctx)?,
        version: attribute
            .child(AttributeId::PackageVersionMajor)
            .map(|version| read_version(ctx, version))
            .transpose()?,
        compatible_version: attribute
            .child(AttributeId::PackageProvidesCompatible)
            .map(|version| read_version(ctx, version))
            .transpose()?,
    })
}

fn read_flag(attribute: &Attribute, id: AttributeId) -> Result<bool> {
    Ok(match attribute.child(id) {
        Some(flag) => flag.uint_value()? != 0,
        None => false,
    })
}

fn read_global_writable_file(
    ctx: &AttributeContext<'_>,
    attribute: &Attribute,
) -> Result<GlobalWritableFile> {
    let update_type = match attribute.child(AttributeId::PackageWritableFileUpdateType) {
        Some(update_type) => {
            let code = update_type.uint_value()?;
            Some(WritableFileUpdateType::from_code(code).ok_or_else(|| {
                HpkError::Format(format!("unknown writable file update type {code}"))
            })?)
        }
        None => None,
    };

    Ok(GlobalWritableFile {
        path: attribute.string_value(ctx)?,
        update_type,
        is_directory: read_flag(attribute, AttributeId::PackageIsWritableDirectory)?,
    })
}

fn read_user_settings_file(
    ctx: &AttributeContext<'_>,
    attribute: &Attribute,
) -> Result<UserSettingsFile> {
    Ok(UserSettingsFile {
        path: attribute.string_value(ctx)?,
        template_path: optional_string(ctx, attribute, AttributeId::PackageSettingsFileTemplate)?,
        is_directory: read_flag(attribute, AttributeId::PackageIsWritableDirectory)?,
    })
}

fn read_user(ctx: &AttributeContext<'_>, attribute: &Attribute) -> Result<PackageUser> {
    Ok(PackageUser {
        name: attribute.string_value(ctx)?,
        real_name: optional_string(ctx, attribute, AttributeId::PackageUserRealName)?,
        home: optional_string(ctx, attribute, AttributeId::PackageUserHome)?,
        shell: optional_string(ctx, attribute, AttributeId::PackageUserShell)?,
        groups: attribute
            .children_with(AttributeId::PackageUserGroup)
            .map(|group| group.string_value(ctx))
            .collect::<Result<_>>()?,
    })
}

/// Seconds plus optional nanoseconds; `None` when the seconds are absent.
fn read_timestamp(
    attribute: &Attribute,
    seconds: AttributeId,
    nanos: AttributeId,
) -> Result<Option<FileTimestamp>> {
    let Some(seconds) = attribute.child(seconds) else {
        return Ok(None);
    };
    let nanos = attribute.child(nanos).map(u32_value).transpose()?;
    Ok(Some(FileTimestamp::new(
        seconds.int_value()?,
        nanos.unwrap_or(0),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{HeapReader, MemoryHeapReader};
    use crate::string_table::HpkStringTable;
    use std::sync::Arc;

    fn attr(id: AttributeId, value: impl Into<crate::attribute::AttributeValue>) -> Attribute {
        Attribute::new(id, value).unwrap()
    }

    fn version_attribute() -> Attribute {
        attr(AttributeId::PackageVersionMajor, "6").with_children([
            attr(AttributeId::PackageVersionMinor, "32"),
            attr(AttributeId::PackageVersionMicro, "9"),
            attr(AttributeId::PackageVersionPreRelease, "beta"),
            attr(AttributeId::PackageVersionRevision, 8u32),
        ])
    }

    fn with_reader<T>(f: impl FnOnce(PackageReader<'_>) -> T) -> T {
        let heap: Arc<dyn HeapReader> = Arc::new(MemoryHeapReader::default());
        let table = HpkStringTable::empty(Arc::clone(&heap));
        let ctx = AttributeContext::new(&heap, &table);
        f(PackageReader::new(ctx, ctx))
    }

    #[test]
    fn test_minimal_package() {
        let attributes = vec![
            attr(AttributeId::PackageName, "testpkg"),
            version_attribute(),
            attr(AttributeId::PackageArchitecture, 1u32),
        ];
        let package = with_reader(|reader| reader.read_package(&attributes, &[])).unwrap();
        assert_eq!(package.name, "testpkg");
        assert_eq!(package.version.unwrap().to_string(), "6.32.9~beta-8");
        assert_eq!(package.architecture, Some(PkgArchitecture::X86));
    }

    #[test]
    fn test_missing_name() {
        let err = with_reader(|reader| reader.read_package(&[version_attribute()], &[]))
            .unwrap_err();
        assert!(matches!(err, HpkError::MissingAttribute("package:name")));
    }

    #[test]
    fn test_checksum_rejected() {
        let attributes = vec![
            attr(AttributeId::PackageName, "testpkg"),
            attr(AttributeId::PackageChecksum, "abc123"),
        ];
        let err = with_reader(|reader| reader.read_package(&attributes, &[])).unwrap_err();
        assert!(matches!(err, HpkError::ChecksumNotSupported));
    }

    #[test]
    fn test_resolvables_and_users() {
        let attributes = vec![
            attr(AttributeId::PackageName, "app"),
            attr(AttributeId::PackageRequires, "haiku").with_children([
                attr(AttributeId::PackageVersionMajor, "r1"),
                attr(AttributeId::PackageResolvableOperator, 4u32),
            ]),
            attr(AttributeId::PackageProvides, "app").with_children([
                attr(AttributeId::PackageVersionMajor, "2"),
                attr(AttributeId::PackageProvidesCompatible, "1"),
            ]),
            attr(AttributeId::PackageUser, "svc").with_children([
                attr(AttributeId::PackageUserHome, "/var/svc"),
                attr(AttributeId::PackageUserGroup, "a"),
                attr(AttributeId::PackageUserGroup, "b"),
            ]),
            attr(AttributeId::PackageUrl, "Home <http://example.com>"),
            attr(AttributeId::PackageUrl, ""),
        ];
        let package = with_reader(|reader| reader.read_package(&attributes, &[])).unwrap();
        assert_eq!(package.requires[0].to_string(), "haiku >= r1");
        assert_eq!(package.provides[0].to_string(), "app = 2 compat 1");
        assert_eq!(package.users[0].groups, vec!["a", "b"]);
        assert_eq!(package.urls.len(), 1);
        assert_eq!(package.home_page_url().unwrap().name(), Some("Home"));
    }

    #[test]
    fn test_entry_payload_matches_type() {
        let toc = vec![
            attr(AttributeId::DirectoryEntry, "bin").with_children([
                attr(AttributeId::FileType, 1u32),
                attr(AttributeId::DirectoryEntry, "tool").with_children([
                    attr(AttributeId::FileType, 0u32),
                    attr(AttributeId::Data, b"#!sh".to_vec()),
                    attr(AttributeId::FilePermissions, 0o755u32),
                    attr(AttributeId::FileMtime, 1_600_000_000u32),
                    attr(AttributeId::FileMtimeNanos, 5u32),
                ]),
                attr(AttributeId::DirectoryEntry, "sh").with_children([
                    attr(AttributeId::FileType, 2u32),
                    attr(AttributeId::SymlinkPath, "tool"),
                    // ignored for a symlink
                    attr(AttributeId::Data, b"x".to_vec()),
                ]),
            ]),
            attr(AttributeId::PackageName, "not an entry"),
        ];
        let attributes = vec![attr(AttributeId::PackageName, "p")];
        let package = with_reader(|reader| reader.read_package(&attributes, &toc)).unwrap();

        assert_eq!(package.directory_entries.len(), 1);
        let bin = &package.directory_entries[0];
        assert_eq!(bin.file_kind(), FileKind::Directory);
        assert!(bin.data().is_none());

        let tool = &bin.children()[0];
        assert_eq!(tool.data().unwrap().read_all().unwrap(), b"#!sh");
        assert_eq!(tool.permissions, Some(0o755));
        assert_eq!(tool.modified_time, Some(FileTimestamp::new(1_600_000_000, 5)));
        assert!(tool.children().is_empty());

        let link = &bin.children()[1];
        assert_eq!(link.target(), Some("tool"));
        assert!(link.data().is_none());
    }

    #[test]
    fn test_unknown_file_type() {
        let entry = attr(AttributeId::DirectoryEntry, "odd")
            .with_child(attr(AttributeId::FileType, 9u32));
        let err = with_reader(|reader| reader.read_directory_entry(&entry)).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_pkg_factory_requires_core_fields() {
        let heap: Arc<dyn HeapReader> = Arc::new(MemoryHeapReader::default());
        let table = HpkStringTable::empty(Arc::clone(&heap));
        let ctx = AttributeContext::new(&heap, &table);

        let package = attr(AttributeId::Package, "haiku").with_children([
            attr(AttributeId::PackageName, "haiku"),
            version_attribute(),
            attr(AttributeId::PackageArchitecture, 4u32),
            attr(AttributeId::PackageLicense, "MIT"),
        ]);
        let pkg = PkgFactory::new().create_package(&ctx, &package).unwrap();
        assert_eq!(pkg.to_string(), "haiku : 6.32.9~beta-8 : X86_64");
        assert_eq!(pkg.licenses, vec!["MIT"]);

        let no_arch = attr(AttributeId::Package, "haiku").with_children([
            attr(AttributeId::PackageName, "haiku"),
            version_attribute(),
        ]);
        assert!(matches!(
            PkgFactory::new().create_package(&ctx, &no_arch),
            Err(HpkError::MissingAttribute("package:architecture"))
        ));
    }
}
