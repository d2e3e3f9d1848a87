//! Criterion benchmarks for the rumble command parser.
//!
//! Run with:
//! ```bash
//! cargo bench --package rumble-core --bench parse_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rumble_core::{parse_command, parse_command_with, TrailingInput, MAX_COMMAND_LEN};

fn full_buffer() -> Vec<u8> {
    let mut buf = vec![0u8; MAX_COMMAND_LEN];
    let cmd = b"0 30000 30000 500";
    buf[..cmd.len()].copy_from_slice(cmd);
    buf
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_command");

    let inputs: [(&str, Vec<u8>); 4] = [
        ("minimal", b"0 1 2 3".to_vec()),
        ("typical", b"1 30000 45000 750\n".to_vec()),
        ("nul_padded_buffer", full_buffer()),
        ("malformed", b"abc 1 2 3".to_vec()),
    ];

    for (name, input) in &inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| parse_command(black_box(input)))
        });
    }

    group.finish();
}

fn bench_strict_parse(c: &mut Criterion) {
    let input = b"1 30000 45000 750 trailing".to_vec();
    c.bench_function("parse_command_strict_trailing", |b| {
        b.iter(|| parse_command_with(black_box(&input), TrailingInput::Reject))
    });
}

criterion_group!(benches, bench_parse, bench_strict_parse);
criterion_main!(benches);
