//! Benchmarks for layout computation, full builds and lookups

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use xrofs::{build_image, BuildConfig, ByteOrder, FileRecord, ImageLayout, ImageReader};

fn random_records(count: usize, rng: &mut StdRng) -> Vec<FileRecord> {
    (0..count)
        .map(|i| FileRecord {
            relative_path: format!("dir{:02}/file{:05}.bin", rng.gen_range(0..32), i),
            size: rng.gen_range(1..64 * 1024),
        })
        .collect()
}

/// Fill `root` with `count` random files spread over a few directories
fn random_tree(root: &Path, count: usize, max_size: usize, rng: &mut StdRng) -> u64 {
    let mut total = 0;
    for i in 0..count {
        let dir = root.join(format!("d{}", i % 8));
        fs::create_dir_all(&dir).unwrap();
        let mut content = vec![0u8; rng.gen_range(1..max_size)];
        rng.fill_bytes(&mut content);
        total += content.len() as u64;
        fs::write(dir.join(format!("f{}", i)), content).unwrap();
    }
    total
}

fn benchmark_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = BuildConfig::new("src", "out.img");

    for count in [100, 1000, 10000].iter() {
        let records = random_records(*count, &mut StdRng::seed_from_u64(7));
        group.bench_with_input(BenchmarkId::from_parameter(count), &records, |b, records| {
            b.iter(|| black_box(ImageLayout::build(records.clone(), &config).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);

    for count in [10, 100, 500].iter() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let total = random_tree(&src, *count, 32 * 1024, &mut StdRng::seed_from_u64(42));
        let config = BuildConfig::new(&src, temp.path().join("out.img"));

        group.throughput(Throughput::Bytes(total));
        group.bench_with_input(BenchmarkId::from_parameter(count), &config, |b, config| {
            b.iter(|| black_box(build_image(config).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let img = temp.path().join("out.img");
    random_tree(&src, 2000, 256, &mut StdRng::seed_from_u64(3));
    build_image(&BuildConfig::new(&src, &img)).unwrap();
    let bytes = fs::read(&img).unwrap();

    c.bench_function("lookup_2000_entries", |b| {
        let reader = ImageReader::new(&bytes, ByteOrder::Little).unwrap();
        let mut i = 0;
        b.iter(|| {
            let name = format!("d{}/f{}", i % 8, i);
            i = (i + 1) % 2000;
            black_box(reader.open(name.as_str()).map(|file| file.size()))
        });
    });
}

criterion_group!(benches, benchmark_layout, benchmark_build, benchmark_lookup);
criterion_main!(benches);
