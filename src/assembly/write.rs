//! Package model to attribute trees.

use crate::attribute::{Attribute, AttributeId, AttributeValue};
use crate::error::{HpkError, Result};
use crate::heap::ByteSource;
use crate::model::{
    CompatibleEntity, DirectoryEntry, EntryKind, FileTimestamp, GlobalWritableFile, Package,
    PackageUser, PkgVersion, ResolvableEntity, UserSettingsFile,
};

/// Top-level package attributes in write order.
pub fn package_attributes(package: &Package) -> Result<Vec<Attribute>> {
    if package.name.is_empty() {
        return Err(HpkError::Precondition("a package needs a name".to_string()));
    }

    let mut out = vec![Attribute::new(AttributeId::PackageName, package.name.as_str())?];
    let optional = [
        (AttributeId::PackageSummary, &package.summary),
        (AttributeId::PackageDescription, &package.description),
        (AttributeId::PackageVendor, &package.vendor),
        (AttributeId::PackagePackager, &package.packager),
        (AttributeId::PackageBasePackage, &package.base_package),
        (AttributeId::PackageInstallPath, &package.install_path),
    ];
    for (id, value) in optional {
        if let Some(value) = value {
            out.push(Attribute::new(id, value.as_str())?);
        }
    }

    out.push(Attribute::new(AttributeId::PackageFlags, package.flags.bits())?);
    if let Some(architecture) = package.architecture {
        out.push(Attribute::new(
            AttributeId::PackageArchitecture,
            u32::from(architecture.code()),
        )?);
    }
    if let Some(version) = &package.version {
        out.push(version_attribute(AttributeId::PackageVersionMajor, version)?);
    }

    push_strings(&mut out, AttributeId::PackageCopyright, &package.copyrights)?;
    push_strings(&mut out, AttributeId::PackageLicense, &package.licenses)?;
    for url in &package.urls {
        out.push(Attribute::new(AttributeId::PackageUrl, url.to_string())?);
    }
    for url in &package.source_urls {
        out.push(Attribute::new(AttributeId::PackageSourceUrl, url.to_string())?);
    }

    for entity in &package.provides {
        out.push(compatible_attribute(entity)?);
    }
    let resolvables = [
        (AttributeId::PackageRequires, &package.requires),
        (AttributeId::PackageSupplements, &package.supplements),
        (AttributeId::PackageConflicts, &package.conflicts),
        (AttributeId::PackageFreshens, &package.freshens),
    ];
    for (id, entities) in resolvables {
        for entity in entities {
            out.push(resolvable_attribute(id, entity)?);
        }
    }
    push_strings(&mut out, AttributeId::PackageReplaces, &package.replaces)?;

    for file in &package.global_writable_files {
        out.push(global_writable_file_attribute(file)?);
    }
    for file in &package.user_settings_files {
        out.push(user_settings_file_attribute(file)?);
    }
    for user in &package.users {
        out.push(user_attribute(user)?);
    }
    push_strings(&mut out, AttributeId::PackageGroup, &package.groups)?;
    push_strings(
        &mut out,
        AttributeId::PackagePostInstallScript,
        &package.post_install_scripts,
    )?;

    Ok(out)
}

fn push_strings(out: &mut Vec<Attribute>, id: AttributeId, values: &[String]) -> Result<()> {
    for value in values {
        out.push(Attribute::new(id, value.as_str())?);
    }
    Ok(())
}

/// A version node under `id`, which is `package:version.major` or
/// `package:provides.compatible`.
pub fn version_attribute(id: AttributeId, version: &PkgVersion) -> Result<Attribute> {
    let mut attribute = Attribute::new(id, version.major.as_str())?;
    if let Some(minor) = &version.minor {
        attribute = attribute.with_child(Attribute::new(
            AttributeId::PackageVersionMinor,
            minor.as_str(),
        )?);
    }
    if let Some(micro) = &version.micro {
        attribute = attribute.with_child(Attribute::new(
            AttributeId::PackageVersionMicro,
            micro.as_str(),
        )?);
    }
    if let Some(pre_release) = &version.pre_release {
        attribute = attribute.with_child(Attribute::new(
            AttributeId::PackageVersionPreRelease,
            pre_release.as_str(),
        )?);
    }
    if let Some(revision) = version.revision {
        attribute =
            attribute.with_child(Attribute::new(AttributeId::PackageVersionRevision, revision)?);
    }
    Ok(attribute)
}

fn resolvable_attribute(id: AttributeId, entity: &ResolvableEntity) -> Result<Attribute> {
    let mut attribute = Attribute::new(id, entity.name.as_str())?;
    if let Some(version) = &entity.version {
        attribute =
            attribute.with_child(version_attribute(AttributeId::PackageVersionMajor, version)?);
    }
    if let Some(operator) = entity.operator {
        attribute = attribute.with_child(Attribute::new(
            AttributeId::PackageResolvableOperator,
            u32::from(operator.code()),
        )?);
    }
    Ok(attribute)
}

fn compatible_attribute(entity: &CompatibleEntity) -> Result<Attribute> {
    let mut attribute = Attribute::new(AttributeId::PackageProvides, entity.name.as_str())?;
    if let Some(version) = &entity.version {
        attribute =
            attribute.with_child(version_attribute(AttributeId::PackageVersionMajor, version)?);
    }
    if let Some(compatible) = &entity.compatible_version {
        attribute = attribute.with_child(version_attribute(
            AttributeId::PackageProvidesCompatible,
            compatible,
        )?);
    }
    Ok(attribute)
}

fn global_writable_file_attribute(file: &GlobalWritableFile) -> Result<Attribute> {
    let mut attribute =
        Attribute::new(AttributeId::PackageGlobalWritableFile, file.path.as_str())?;
    if let Some(update_type) = file.update_type {
        attribute = attribute.with_child(Attribute::new(
            AttributeId::PackageWritableFileUpdateType,
            u32::from(update_type.code()),
        )?);
    }
    if file.is_directory {
        attribute =
            attribute.with_child(Attribute::new(AttributeId::PackageIsWritableDirectory, 1u32)?);
    }
    Ok(attribute)
}

fn user_settings_file_attribute(file: &UserSettingsFile) -> Result<Attribute> {
    let mut attribute = Attribute::new(AttributeId::PackageUserSettingsFile, file.path.as_str())?;
    if let Some(template) = &file.template_path {
        attribute = attribute.with_child(Attribute::new(
            AttributeId::PackageSettingsFileTemplate,
            template.as_str(),
        )?);
    }
    if file.is_directory {
        attribute =
            attribute.with_child(Attribute::new(AttributeId::PackageIsWritableDirectory, 1u32)?);
    }
    Ok(attribute)
}

fn user_attribute(user: &PackageUser) -> Result<Attribute> {
    let mut attribute = Attribute::new(AttributeId::PackageUser, user.name.as_str())?;
    let optional = [
        (AttributeId::PackageUserRealName, &user.real_name),
        (AttributeId::PackageUserHome, &user.home),
        (AttributeId::PackageUserShell, &user.shell),
    ];
    for (id, value) in optional {
        if let Some(value) = value {
            attribute = attribute.with_child(Attribute::new(id, value.as_str())?);
        }
    }
    for group in &user.groups {
        attribute =
            attribute.with_child(Attribute::new(AttributeId::PackageUserGroup, group.as_str())?);
    }
    Ok(attribute)
}

/// One `dir:entry` node and its subtree. `place_data` decides where each
/// file's content goes and returns the value that refers to it.
pub fn directory_entry_attribute<F>(entry: &DirectoryEntry, place_data: &mut F) -> Result<Attribute>
where
    F: FnMut(&ByteSource) -> Result<AttributeValue>,
{
    if entry.name.is_empty() || entry.name.contains('/') {
        return Err(HpkError::Precondition(format!(
            "invalid entry name {:?}",
            entry.name
        )));
    }

    let mut attribute = Attribute::new(AttributeId::DirectoryEntry, entry.name.as_str())?
        .with_child(Attribute::new(
            AttributeId::FileType,
            u32::from(entry.file_kind().code()),
        )?);

    match &entry.kind {
        EntryKind::File { data } => {
            if let Some(data) = data {
                attribute = attribute.with_child(Attribute::new(AttributeId::Data, place_data(data)?)?);
            }
        }
        EntryKind::Directory { children } => {
            for child in children {
                attribute = attribute.with_child(directory_entry_attribute(child, place_data)?);
            }
        }
        EntryKind::Symlink { target } => {
            if let Some(target) = target {
                attribute =
                    attribute.with_child(Attribute::new(AttributeId::SymlinkPath, target.as_str())?);
            }
        }
    }

    if let Some(permissions) = entry.permissions {
        attribute = attribute.with_child(Attribute::new(AttributeId::FilePermissions, permissions)?);
    }
    if let Some(user) = &entry.user {
        attribute = attribute.with_child(Attribute::new(AttributeId::FileUser, user.as_str())?);
    }
    if let Some(group) = &entry.group {
        attribute = attribute.with_child(Attribute::new(AttributeId::FileGroup, group.as_str())?);
    }

    let timestamps = [
        (
            AttributeId::FileAtime,
            AttributeId::FileAtimeNanos,
            entry.access_time,
        ),
        (
            AttributeId::FileMtime,
            AttributeId::FileMtimeNanos,
            entry.modified_time,
        ),
        (
            AttributeId::FileCrtime,
            AttributeId::FileCrtimeNanos,
            entry.creation_time,
        ),
    ];
    for (seconds_id, nanos_id, timestamp) in timestamps {
        if let Some(timestamp) = timestamp {
            attribute = attribute.with_children(timestamp_attributes(seconds_id, nanos_id, timestamp)?);
        }
    }

    for file_attribute in &entry.attributes {
        let mut node = Attribute::new(AttributeId::FileAttribute, file_attribute.name.as_str())?;
        if let Some(attribute_type) = file_attribute.attribute_type {
            node = node.with_child(Attribute::new(AttributeId::FileAttributeType, attribute_type)?);
        }
        if let Some(data) = &file_attribute.data {
            node = node.with_child(Attribute::new(AttributeId::Data, place_data(data)?)?);
        }
        attribute = attribute.with_child(node);
    }

    Ok(attribute)
}

/// Seconds are stored as an unsigned 32-bit value.
fn timestamp_attributes(
    seconds_id: AttributeId,
    nanos_id: AttributeId,
    timestamp: FileTimestamp,
) -> Result<[Attribute; 2]> {
    let seconds = u32::try_from(timestamp.seconds).map_err(|_| {
        HpkError::Precondition(format!(
            "timestamp {} for {} does not fit 32 bits",
            timestamp.seconds,
            seconds_id.name()
        ))
    })?;
    Ok([
        Attribute::new(seconds_id, seconds)?,
        Attribute::new(nanos_id, timestamp.nanos)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PkgArchitecture, PkgFlags, ResolvableOperator, WritableFileUpdateType};

    fn inline(data: &ByteSource) -> Result<AttributeValue> {
        Ok(AttributeValue::InlineRaw(data.read_all()?))
    }

    fn ids(attributes: &[Attribute]) -> Vec<AttributeId> {
        attributes.iter().map(Attribute::id).collect()
    }

    #[test]
    fn test_package_attribute_order() {
        let mut package = Package::new("testpkg");
        package.summary = Some("test".to_string());
        package.flags = PkgFlags::APPROVE_LICENSE;
        package.architecture = Some(PkgArchitecture::X86);
        package.version = Some(
            PkgVersion::new("6")
                .with_minor("32")
                .with_micro("9")
                .with_pre_release("beta")
                .with_revision(8),
        );
        package.licenses.push("MIT".to_string());
        package.requires.push(
            ResolvableEntity::new("haiku")
                .with_version(ResolvableOperator::GreaterEqual, PkgVersion::new("r1")),
        );

        let attributes = package_attributes(&package).unwrap();
        assert_eq!(
            ids(&attributes),
            vec![
                AttributeId::PackageName,
                AttributeId::PackageSummary,
                AttributeId::PackageFlags,
                AttributeId::PackageArchitecture,
                AttributeId::PackageVersionMajor,
                AttributeId::PackageLicense,
                AttributeId::PackageRequires,
            ]
        );
        assert_eq!(
            ids(attributes[4].children()),
            vec![
                AttributeId::PackageVersionMinor,
                AttributeId::PackageVersionMicro,
                AttributeId::PackageVersionPreRelease,
                AttributeId::PackageVersionRevision,
            ]
        );
        assert_eq!(
            ids(attributes[6].children()),
            vec![
                AttributeId::PackageVersionMajor,
                AttributeId::PackageResolvableOperator,
            ]
        );
    }

    #[test]
    fn test_nameless_package_rejected() {
        assert!(package_attributes(&Package::default())
            .unwrap_err()
            .is_precondition());
    }

    #[test]
    fn test_writable_files_and_users() {
        let mut package = Package::new("svc");
        package.global_writable_files.push(GlobalWritableFile {
            path: "settings/svc".to_string(),
            update_type: Some(WritableFileUpdateType::AutoMerge),
            is_directory: true,
        });
        package.users.push(PackageUser {
            name: "svc".to_string(),
            home: Some("/var/svc".to_string()),
            groups: vec!["a".to_string()],
            ..PackageUser::default()
        });

        let attributes = package_attributes(&package).unwrap();
        let file = &attributes[2];
        assert_eq!(file.id(), AttributeId::PackageGlobalWritableFile);
        assert_eq!(
            file.child(AttributeId::PackageWritableFileUpdateType)
                .unwrap()
                .uint_value()
                .unwrap(),
            2
        );
        assert_eq!(
            ids(attributes[3].children()),
            vec![AttributeId::PackageUserHome, AttributeId::PackageUserGroup]
        );
    }

    #[test]
    fn test_entry_children_order() {
        let mut file = DirectoryEntry::file("tool", b"bits".to_vec());
        file.permissions = Some(0o755);
        file.modified_time = Some(FileTimestamp::new(100, 7));
        file.attributes.push(crate::model::ExtendedFileAttribute {
            name: "BEOS:TYPE".to_string(),
            attribute_type: Some(0x4d494d53),
            data: Some(ByteSource::from(b"text/plain".to_vec())),
        });
        let tree = DirectoryEntry::directory("bin", vec![file]);

        let attribute = directory_entry_attribute(&tree, &mut inline).unwrap();
        assert_eq!(
            ids(attribute.children()),
            vec![AttributeId::FileType, AttributeId::DirectoryEntry]
        );
        let tool = &attribute.children()[1];
        assert_eq!(
            ids(tool.children()),
            vec![
                AttributeId::FileType,
                AttributeId::Data,
                AttributeId::FilePermissions,
                AttributeId::FileMtime,
                AttributeId::FileMtimeNanos,
                AttributeId::FileAttribute,
            ]
        );
        assert_eq!(
            ids(tool.children()[5].children()),
            vec![AttributeId::FileAttributeType, AttributeId::Data]
        );
    }

    #[test]
    fn test_entry_validation() {
        let bad_name = DirectoryEntry::symlink("a/b", "c");
        assert!(directory_entry_attribute(&bad_name, &mut inline).is_err());

        let mut old = DirectoryEntry::symlink("old", "x");
        old.access_time = Some(FileTimestamp::new(-1, 0));
        assert!(directory_entry_attribute(&old, &mut inline)
            .unwrap_err()
            .is_precondition());
    }
}
