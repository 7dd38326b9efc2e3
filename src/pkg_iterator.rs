use crate::assembly::PkgFactory;
use crate::attribute::AttributeIterator;
use crate::error::Result;
use crate::model::Pkg;

/// Yields one [`Pkg`] per top-level `package` attribute of a repository
/// index.
#[derive(Debug)]
pub struct PkgIterator<'a> {
    attributes: AttributeIterator<'a>,
    factory: PkgFactory,
}

impl<'a> PkgIterator<'a> {
    pub fn new(attributes: AttributeIterator<'a>) -> Self {
        Self {
            attributes,
            factory: PkgFactory::new(),
        }
    }

    pub fn has_next(&mut self) -> Result<bool> {
        self.attributes.has_next()
    }
}

impl Iterator for PkgIterator<'_> {
    type Item = Result<Pkg>;

    fn next(&mut self) -> Option<Self::Item> {
        let context = self.attributes.context();
        let attribute = match self.attributes.next()? {
            Ok(attribute) => attribute,
            Err(e) => return Some(Err(e)),
        };
        Some(self.factory.create_package(&context, &attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeContext, AttributeId};
    use crate::heap::{HeapBuilder, HeapBuilderOptions, HeapReader, MemoryHeapReader};
    use crate::formats::HeapCompression;
    use crate::string_table::HpkStringTable;
    use std::sync::Arc;

    fn package(name: &str, architecture: u32) -> Attribute {
        Attribute::new(AttributeId::Package, name)
            .unwrap()
            .with_children([
                Attribute::new(AttributeId::PackageName, name).unwrap(),
                Attribute::new(AttributeId::PackageVersionMajor, "1").unwrap(),
                Attribute::new(AttributeId::PackageArchitecture, architecture).unwrap(),
            ])
    }

    fn heap_with(attributes: &[Attribute]) -> Arc<dyn HeapReader> {
        let mut builder = HeapBuilder::new(HeapBuilderOptions {
            compression: HeapCompression::None,
            chunk_size: 1024,
        })
        .unwrap();
        builder.write_attributes(attributes).unwrap();
        builder.complete().unwrap();
        let mut bytes = Vec::new();
        builder.write_to_stream(&mut bytes).unwrap();
        Arc::new(MemoryHeapReader::new(bytes))
    }

    #[test]
    fn test_yields_each_package() {
        let heap = heap_with(&[package("a", 1), package("b", 4)]);
        let table = HpkStringTable::empty(Arc::clone(&heap));
        let iterator = AttributeIterator::new(AttributeContext::new(&heap, &table), 0);

        let names: Vec<_> = PkgIterator::new(iterator)
            .map(|pkg| pkg.unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a : 1 : X86", "b : 1 : X86_64"]);
    }

    #[test]
    fn test_bad_package_surfaces_error() {
        let heap = heap_with(&[package("a", 99)]);
        let table = HpkStringTable::empty(Arc::clone(&heap));
        let mut iterator =
            PkgIterator::new(AttributeIterator::new(AttributeContext::new(&heap, &table), 0));

        assert!(iterator.has_next().unwrap());
        assert!(iterator.next().unwrap().unwrap_err().is_format_error());
    }
}
