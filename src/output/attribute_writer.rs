use crate::attribute::{Attribute, AttributeContext, AttributeIterator};
use crate::error::{HpkError, Result};
use std::io::Write;

const RULE: &str = "-------------------";

/// Writes attribute trees as indented `name : TYPE : value` lines.
#[derive(Debug)]
pub struct AttributeWriter<W: Write> {
    out: W,
}

impl<W: Write> AttributeWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// A section title followed by a rule.
    pub fn write_heading(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "{title}:\n{RULE}").map_err(HpkError::io("writing a heading"))
    }

    pub fn write_attribute(&mut self, ctx: &AttributeContext<'_>, attribute: &Attribute) -> Result<()> {
        self.write_at_depth(ctx, attribute, 0)
    }

    /// Drain `iterator`, writing every root and its subtree. Returns the
    /// number of roots written.
    pub fn write_attributes(&mut self, iterator: AttributeIterator<'_>) -> Result<usize> {
        let ctx = iterator.context();
        let mut count = 0;
        for attribute in iterator {
            self.write_attribute(&ctx, &attribute?)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(HpkError::io("flushing attribute output"))
    }

    fn write_at_depth(
        &mut self,
        ctx: &AttributeContext<'_>,
        attribute: &Attribute,
        depth: usize,
    ) -> Result<()> {
        let value = attribute.value(ctx)?;
        writeln!(
            self.out,
            "{:indent$}{} : {} : {}",
            "",
            attribute.id().name(),
            attribute.id().attribute_type(),
            value,
            indent = depth * 2
        )
        .map_err(HpkError::io("writing an attribute"))?;

        for child in attribute.children() {
            self.write_at_depth(ctx, child, depth + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeId;
    use crate::heap::{HeapCoordinates, HeapReader, MemoryHeapReader};
    use crate::string_table::HpkStringTable;
    use std::sync::Arc;

    #[test]
    fn test_indented_lines() {
        let heap: Arc<dyn HeapReader> = Arc::new(MemoryHeapReader::new(vec![0u8; 64]));
        let table = HpkStringTable::empty(Arc::clone(&heap));
        let ctx = AttributeContext::new(&heap, &table);

        let entry = Attribute::new(AttributeId::DirectoryEntry, "readme")
            .unwrap()
            .with_children([
                Attribute::new(AttributeId::FileType, 0u8).unwrap(),
                Attribute::new(AttributeId::Data, HeapCoordinates::new(16, 40)).unwrap(),
                Attribute::new(AttributeId::FileMtime, -2i32).unwrap(),
            ]);
        let link = Attribute::new(AttributeId::Data, vec![1u8, 2, 3]).unwrap();

        let mut writer = AttributeWriter::new(Vec::new());
        writer.write_heading("toc").unwrap();
        writer.write_attribute(&ctx, &entry).unwrap();
        writer.write_attribute(&ctx, &link).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            text,
            "toc:\n\
             -------------------\n\
             dir:entry : STRING : readme\n  \
             file:type : INT : 0\n  \
             data : RAW : 40 bytes {off:16, len:40}\n  \
             file:mtime : INT : -2\n\
             data : RAW : 3 bytes\n"
        );
    }
}
