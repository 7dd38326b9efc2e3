use crate::error::{HpkError, Result};
use crate::model::Pkg;
use crate::pkg_iterator::PkgIterator;
use std::io::Write;

/// Writes one package summary per line.
#[derive(Debug)]
pub struct PkgWriter<W: Write> {
    out: W,
}

impl<W: Write> PkgWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_pkg(&mut self, pkg: &Pkg) -> Result<()> {
        writeln!(self.out, "{pkg}").map_err(HpkError::io("writing a package summary"))
    }

    /// Stops at the first package that fails to decode.
    pub fn write_packages(&mut self, packages: PkgIterator<'_>) -> Result<usize> {
        let mut count = 0;
        for pkg in packages {
            self.write_pkg(&pkg?)?;
            count += 1;
        }
        self.out
            .flush()
            .map_err(HpkError::io("flushing package output"))?;
        Ok(count)
    }
}
