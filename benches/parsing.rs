//! Record parser and classifier benchmarks.
//!
//! Run with: cargo bench --bench parsing

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use tabload::ingestion::{CsvOptions, read_records};
use tabload::introspection::classify;

fn make_csv(rows: usize, cols: usize) -> Vec<u8> {
    let mut out = String::new();
    let header: Vec<String> = (0..cols).map(|c| format!("col_{c}")).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for r in 0..rows {
        let line: Vec<String> = (0..cols)
            .map(|c| match c % 3 {
                0 => r.to_string(),
                1 => format!("{r}.{c:02}"),
                _ => format!("\"value, {r}\""),
            })
            .collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

fn bench_read_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_records");
    for &(rows, cols) in &[(1_000, 4), (10_000, 4), (1_000, 32)] {
        let input = make_csv(rows, cols);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{rows}x{cols}")),
            &input,
            |b, input| {
                b.iter(|| read_records(black_box(input), &CsvOptions::default()));
            },
        );
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let samples = [Some("12345"), Some("10.50"), Some("1e5"), Some(""), None];
    c.bench_function("classify/mixed", |b| {
        b.iter(|| {
            for s in samples {
                black_box(classify(black_box(s)));
            }
        })
    });
}

criterion_group!(benches, bench_read_records, bench_classify);
criterion_main!(benches);
