use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hexandtabler::guess::{self, KnownPhrase};
use hexandtabler::search::{RelativePattern, exact, relative};

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

/// Random bytes with `needle` planted near the end.
fn with_needle(size: usize, seed: u64, needle: &[u8]) -> Vec<u8> {
    let mut data = gen_data(size, seed);
    let at = size.saturating_sub(needle.len() + 7);
    data[at..at + needle.len()].copy_from_slice(needle);
    data
}

fn bench_exact_find(c: &mut Criterion) {
    let mut g = c.benchmark_group("exact_find_mb_s");
    let needle = b"\xDE\xAD\xBE\xEF\x13\x37";
    for size in [64 * 1024usize, 1024 * 1024, 8 * 1024 * 1024] {
        let data = with_needle(size, 1, needle);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::new("case_sensitive", size), &size, |b, _| {
            b.iter(|| black_box(exact::find_forward(black_box(&data), needle, 0, true, false)));
        });
        g.bench_with_input(BenchmarkId::new("ignore_case", size), &size, |b, _| {
            b.iter(|| black_box(exact::find_forward(black_box(&data), needle, 0, false, false)));
        });
    }
    g.finish();
}

fn bench_replace_all(c: &mut Criterion) {
    let mut g = c.benchmark_group("replace_all");
    for size in [64 * 1024usize, 1024 * 1024] {
        // Small alphabet so matches are dense.
        let data: Vec<u8> = gen_data(size, 2).iter().map(|b| b % 4).collect();
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(exact::replace_all(black_box(&data), &[1, 2], &[9, 9, 9], true)));
        });
    }
    g.finish();
}

fn bench_relative_find(c: &mut Criterion) {
    let mut g = c.benchmark_group("relative_find_mb_s");
    let pattern = RelativePattern::parse("PRINCESS").unwrap();
    let planted: Vec<u8> = "PRINCESS".bytes().map(|b| b - b'A' + 0x20).collect();
    for size in [64 * 1024usize, 1024 * 1024] {
        let data = with_needle(size, 3, &planted);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(relative::find_next(black_box(&data), &pattern, 0, false, false)));
        });
    }
    g.finish();
}

fn bench_guess(c: &mut Criterion) {
    let mut g = c.benchmark_group("guess_scan");
    let phrases = [
        KnownPhrase::new("HELLO").unwrap(),
        KnownPhrase::new("PRINCESS").unwrap(),
    ];
    for size in [16 * 1024usize, 256 * 1024] {
        let data = gen_data(size, 4);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(guess::guess(black_box(&data), &phrases, 0..usize::MAX)));
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_exact_find,
    bench_replace_all,
    bench_relative_find,
    bench_guess
);
criterion_main!(benches);
