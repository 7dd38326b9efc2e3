//! Benchmarks for heap compression and attribute decoding.
//!
//! Run with: `cargo bench`
//! Compare with baseline: `cargo bench -- --save-baseline main`
//! Compare against baseline: `cargo bench -- --baseline main`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hpkg_stream::heap::{HeapBuilder, HeapBuilderOptions, HeapCoordinates, MemoryHeapReader};
use hpkg_stream::model::{DirectoryEntry, PkgArchitecture, PkgVersion};
use hpkg_stream::parsing::HeapLayout;
use hpkg_stream::{
    HeapCompression, HeapReader, HpkHeapReader, HpkgFileExtractor, HpkgWriter, Package,
};
use std::io::Cursor;
use std::sync::Arc;

/// Mildly compressible text, 1 MiB.
fn sample_data() -> Vec<u8> {
    b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. "
        .iter()
        .copied()
        .cycle()
        .take(1 << 20)
        .collect()
}

fn build_heap(data: &[u8], compression: HeapCompression) -> (Vec<u8>, HeapLayout) {
    let options = HeapBuilderOptions {
        compression,
        ..HeapBuilderOptions::default()
    };
    let mut builder = HeapBuilder::new(options).expect("builder");
    builder.write_bytes(data).expect("write");
    builder.complete().expect("complete");
    let mut out = Vec::new();
    let written = builder.write_to_stream(&mut out).expect("stream");
    let layout = HeapLayout {
        offset: 0,
        compression,
        chunk_size: options.chunk_size as u64,
        size_compressed: written,
        size_uncompressed: data.len() as u64,
    };
    (out, layout)
}

/// Benchmark chunking and deflating a heap
fn bench_build(c: &mut Criterion) {
    let data = sample_data();

    let mut group = c.benchmark_group("heap");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("build_zlib", |b| {
        b.iter(|| black_box(build_heap(black_box(&data), HeapCompression::Zlib)));
    });
    group.finish();
}

/// Benchmark reading the whole heap back through the chunk cache
fn bench_read(c: &mut Criterion) {
    let data = sample_data();
    let (bytes, layout) = build_heap(&data, HeapCompression::Zlib);

    let mut group = c.benchmark_group("heap");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("read_zlib", |b| {
        b.iter(|| {
            let reader = HpkHeapReader::new(Cursor::new(bytes.clone()), layout).expect("reader");
            let whole = HeapCoordinates::new(0, layout.size_uncompressed);
            black_box(reader.read_vec(whole).expect("read"))
        });
    });
    group.finish();
}

/// Benchmark decoding the package model of a file with many entries
fn bench_package(c: &mut Criterion) {
    let mut package = Package::new("bench");
    package.architecture = Some(PkgArchitecture::X86_64);
    package.version = Some(PkgVersion::new("1").with_minor("0"));
    let files = (0..2000)
        .map(|i| DirectoryEntry::file(format!("file{i}"), format!("content {i}").into_bytes()))
        .collect();
    package
        .directory_entries
        .push(DirectoryEntry::directory("data", files));

    let mut bytes = Vec::new();
    HpkgWriter::default()
        .write_to(&package, &mut bytes)
        .expect("write");

    c.bench_function("package_from_hpkg", |b| {
        b.iter(|| {
            let extractor =
                HpkgFileExtractor::from_reader(Cursor::new(bytes.clone())).expect("open");
            black_box(Package::from_hpkg(&extractor).expect("decode"))
        });
    });

    let heap: Arc<dyn HeapReader> = Arc::new(MemoryHeapReader::new(sample_data()));
    c.bench_function("memory_read_range", |b| {
        b.iter(|| black_box(heap.read_vec(HeapCoordinates::new(4096, 65536)).expect("read")));
    });
}

criterion_group!(benches, bench_build, bench_read, bench_package);
criterion_main!(benches);
