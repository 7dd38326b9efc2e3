use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Package flag bits. Unknown bits are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PkgFlags(u32);

impl PkgFlags {
    pub const APPROVE_LICENSE: Self = Self(1 << 0);
    pub const SYSTEM_PACKAGE: Self = Self(1 << 1);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PkgFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PkgFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for PkgFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::APPROVE_LICENSE) {
            names.push("approve_license".to_string());
        }
        if self.contains(Self::SYSTEM_PACKAGE) {
            names.push("system_package".to_string());
        }
        let unknown = self.0 & !(Self::APPROVE_LICENSE.0 | Self::SYSTEM_PACKAGE.0);
        if unknown != 0 {
            names.push(format!("{unknown:#x}"));
        }
        f.write_str(&names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits() {
        let flags = PkgFlags::APPROVE_LICENSE | PkgFlags::SYSTEM_PACKAGE;
        assert_eq!(flags.bits(), 3);
        assert!(flags.contains(PkgFlags::SYSTEM_PACKAGE));
        assert!(!PkgFlags::empty().contains(PkgFlags::APPROVE_LICENSE));
        assert_eq!(flags.to_string(), "approve_license | system_package");
        assert_eq!(PkgFlags::from_bits(0x12).to_string(), "system_package | 0x10");
    }
}
