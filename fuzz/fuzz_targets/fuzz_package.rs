#![no_main]
use hpkg_stream::{HpkgFileExtractor, Package};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(extractor) = HpkgFileExtractor::from_reader(Cursor::new(data.to_vec())) {
        let _ = Package::from_hpkg(&extractor);
    }
});
