#![no_main]
use hpkg_stream::parsing::{HpkgHeaderParser, HpkrHeaderParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = HpkgHeaderParser::parse(data) {
        let _ = header.toc_offset();
        let _ = header.attributes_offset();
    }
    if let Ok(header) = HpkrHeaderParser::parse(data) {
        let _ = header.packages_attributes_offset();
    }
});
