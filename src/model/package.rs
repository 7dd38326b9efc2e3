use super::{
    CompatibleEntity, DirectoryEntry, GlobalWritableFile, PackageUser, PkgArchitecture, PkgFlags,
    PkgUrl, PkgVersion, ResolvableEntity, UserSettingsFile,
};
use crate::assembly::PackageReader;
use crate::error::Result;
use crate::extractor::HpkgFileExtractor;
use std::path::Path;

/// Everything an `.hpkg` describes: metadata plus the file tree.
///
/// File content inside [`DirectoryEntry`] values may still point into the
/// heap of the file it was read from; the heap stays open for as long as
/// any such entry is alive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Package {
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub packager: Option<String>,
    pub base_package: Option<String>,
    pub install_path: Option<String>,
    pub flags: PkgFlags,
    pub architecture: Option<PkgArchitecture>,
    pub version: Option<PkgVersion>,
    pub copyrights: Vec<String>,
    pub licenses: Vec<String>,
    pub urls: Vec<PkgUrl>,
    pub source_urls: Vec<PkgUrl>,
    pub provides: Vec<CompatibleEntity>,
    pub requires: Vec<ResolvableEntity>,
    pub supplements: Vec<ResolvableEntity>,
    pub conflicts: Vec<ResolvableEntity>,
    pub freshens: Vec<ResolvableEntity>,
    pub replaces: Vec<String>,
    pub global_writable_files: Vec<GlobalWritableFile>,
    pub user_settings_files: Vec<UserSettingsFile>,
    pub users: Vec<PackageUser>,
    pub groups: Vec<String>,
    pub post_install_scripts: Vec<String>,
    pub directory_entries: Vec<DirectoryEntry>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Read the package model from an open extractor.
    pub fn from_hpkg(extractor: &HpkgFileExtractor) -> Result<Self> {
        let reader = PackageReader::new(
            extractor.package_attributes_context(),
            extractor.toc_context(),
        );
        reader.read_package(
            &extractor.package_attributes()?,
            &extractor.toc()?,
        )
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_hpkg(&HpkgFileExtractor::open(path)?)
    }

    /// The first homepage URL.
    pub fn home_page_url(&self) -> Option<&PkgUrl> {
        self.urls.first()
    }
}
