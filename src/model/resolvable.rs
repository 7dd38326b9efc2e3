use super::version::PkgVersion;
use std::fmt;

/// Version comparison of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResolvableOperator {
    Less = 0,
    LessEqual = 1,
    Equal = 2,
    NotEqual = 3,
    GreaterEqual = 4,
    Greater = 5,
}

impl ResolvableOperator {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Less),
            1 => Some(Self::LessEqual),
            2 => Some(Self::Equal),
            3 => Some(Self::NotEqual),
            4 => Some(Self::GreaterEqual),
            5 => Some(Self::Greater),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterEqual => ">=",
            Self::Greater => ">",
        }
    }
}

impl fmt::Display for ResolvableOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A requires/supplements/conflicts/freshens entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvableEntity {
    pub name: String,
    pub operator: Option<ResolvableOperator>,
    pub version: Option<PkgVersion>,
}

impl ResolvableEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: None,
            version: None,
        }
    }

    pub fn with_version(mut self, operator: ResolvableOperator, version: PkgVersion) -> Self {
        self.operator = Some(operator);
        self.version = Some(version);
        self
    }
}

impl fmt::Display for ResolvableEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            match self.operator {
                Some(operator) => write!(f, " {operator} {version}")?,
                None => write!(f, " {version}")?,
            }
        }
        Ok(())
    }
}

/// A provides entry, with an optional backwards-compatible version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompatibleEntity {
    pub name: String,
    pub version: Option<PkgVersion>,
    pub compatible_version: Option<PkgVersion>,
}

impl CompatibleEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            compatible_version: None,
        }
    }

    pub fn with_version(mut self, version: PkgVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_compatible_version(mut self, version: PkgVersion) -> Self {
        self.compatible_version = Some(version);
        self
    }
}

impl fmt::Display for CompatibleEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, " = {version}")?;
        }
        if let Some(compatible) = &self.compatible_version {
            write!(f, " compat {compatible}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolvable_display() {
        assert_eq!(ResolvableEntity::new("lib").to_string(), "lib");
        let entity = ResolvableEntity::new("haiku")
            .with_version(ResolvableOperator::GreaterEqual, PkgVersion::new("r1").with_pre_release("beta5"));
        assert_eq!(entity.to_string(), "haiku >= r1~beta5");
    }

    #[test]
    fn test_compatible_display() {
        let entity = CompatibleEntity::new("lib:libfoo")
            .with_version(PkgVersion::new("2").with_minor("1"))
            .with_compatible_version(PkgVersion::new("2"));
        assert_eq!(entity.to_string(), "lib:libfoo = 2.1 compat 2");
    }

    #[test]
    fn test_operator_codes() {
        for code in 0..6 {
            let operator = ResolvableOperator::from_code(code).unwrap();
            assert_eq!(u64::from(operator.code()), code);
        }
        assert_eq!(ResolvableOperator::from_code(6), None);
        assert_eq!(ResolvableOperator::NotEqual.symbol(), "!=");
    }
}
