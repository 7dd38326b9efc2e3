//! Fixed header parsing and the varint codec.

pub mod header;
pub mod leb128;

pub use header::{HeapLayout, HpkgHeader, HpkgHeaderParser, HpkrHeader, HpkrHeaderParser};
pub use leb128::{
    decode_unsigned_leb128, encode_unsigned_leb128, read_unsigned_leb128, write_unsigned_leb128,
    ByteCursor,
};
