use super::{PkgArchitecture, PkgUrl, PkgVersion};
use std::fmt;

/// Package summary as listed in a repository index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pkg {
    pub name: Option<String>,
    pub version: Option<PkgVersion>,
    pub architecture: Option<PkgArchitecture>,
    pub vendor: Option<String>,
    pub copyrights: Vec<String>,
    pub licenses: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub home_page_url: Option<PkgUrl>,
}

impl fmt::Display for Pkg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNKNOWN: &str = "???";
        match &self.name {
            Some(name) => f.write_str(name)?,
            None => f.write_str(UNKNOWN)?,
        }
        f.write_str(" : ")?;
        match &self.version {
            Some(version) => write!(f, "{version}")?,
            None => f.write_str(UNKNOWN)?,
        }
        f.write_str(" : ")?;
        match &self.architecture {
            Some(architecture) => write!(f, "{architecture}"),
            None => f.write_str(UNKNOWN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_placeholders() {
        assert_eq!(Pkg::default().to_string(), "??? : ??? : ???");

        let pkg = Pkg {
            name: Some("haiku".to_string()),
            version: Some(PkgVersion::new("r1").with_pre_release("beta4").with_revision(1)),
            architecture: Some(PkgArchitecture::X86_64),
            ..Pkg::default()
        };
        assert_eq!(pkg.to_string(), "haiku : r1~beta4-1 : X86_64");
    }
}
