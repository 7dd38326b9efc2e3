use std::fmt;

/// Target architecture, stored in packages as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PkgArchitecture {
    Any = 0,
    X86 = 1,
    X86Gcc2 = 2,
    Source = 3,
    X86_64 = 4,
    Ppc = 5,
    Arm = 6,
    M68k = 7,
    Sparc = 8,
    Arm64 = 9,
    Riscv64 = 10,
}

impl PkgArchitecture {
    pub const ALL: [Self; 11] = [
        Self::Any,
        Self::X86,
        Self::X86Gcc2,
        Self::Source,
        Self::X86_64,
        Self::Ppc,
        Self::Arm,
        Self::M68k,
        Self::Sparc,
        Self::Arm64,
        Self::Riscv64,
    ];

    pub fn from_code(code: u64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::X86 => "X86",
            Self::X86Gcc2 => "X86_GCC2",
            Self::Source => "SOURCE",
            Self::X86_64 => "X86_64",
            Self::Ppc => "PPC",
            Self::Arm => "ARM",
            Self::M68k => "M68K",
            Self::Sparc => "SPARC",
            Self::Arm64 => "ARM64",
            Self::Riscv64 => "RISCV64",
        }
    }
}

impl fmt::Display for PkgArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        for architecture in PkgArchitecture::ALL {
            assert_eq!(
                PkgArchitecture::from_code(u64::from(architecture.code())),
                Some(architecture)
            );
        }
        assert_eq!(PkgArchitecture::from_code(1), Some(PkgArchitecture::X86));
        assert_eq!(PkgArchitecture::from_code(11), None);
        assert_eq!(PkgArchitecture::X86Gcc2.to_string(), "X86_GCC2");
    }
}
