#![no_main]
use hpkg_stream::heap::{HeapReader, MemoryHeapReader};
use hpkg_stream::string_table::HpkStringTable;
use hpkg_stream::{AttributeContext, AttributeIterator};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // First byte picks how much of the heap is a string table
    let Some((&split, heap)) = data.split_first() else {
        return;
    };
    let strings_length = u64::from(split).min(heap.len() as u64);
    let reader: Arc<dyn HeapReader> = Arc::new(MemoryHeapReader::new(heap.to_vec()));
    let table = HpkStringTable::new(Arc::clone(&reader), 0, strings_length, u64::from(split));
    let context = AttributeContext::new(&reader, &table);

    for attribute in AttributeIterator::new(context, strings_length).take(64) {
        match attribute {
            Ok(attribute) => {
                let _ = attribute.value(&context);
            }
            Err(_) => break,
        }
    }
});
