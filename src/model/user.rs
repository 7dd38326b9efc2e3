use std::fmt;

/// A system user the package needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PackageUser {
    pub name: String,
    pub real_name: Option<String>,
    pub home: Option<String>,
    pub shell: Option<String>,
    pub groups: Vec<String>,
}

impl PackageUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for PackageUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.name)?;
        if let Some(real_name) = &self.real_name {
            write!(f, "real-name {real_name} ")?;
        }
        write!(f, "home {} ", self.home.as_deref().unwrap_or_default())?;
        if let Some(shell) = &self.shell {
            write!(f, "shell {shell} ")?;
        }
        if !self.groups.is_empty() {
            write!(f, "groups {{ {} }} ", self.groups.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let user = PackageUser {
            name: "sshd".to_string(),
            real_name: Some("sshd user".to_string()),
            home: Some("/var/empty".to_string()),
            shell: None,
            groups: vec!["sshd".to_string(), "net".to_string()],
        };
        assert_eq!(
            user.to_string(),
            "sshd real-name sshd user home /var/empty groups { sshd net } "
        );
    }
}
