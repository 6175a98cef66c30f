use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sermon_core::receiver::LineFramer;
use sermon_core::{flatten, parse_line};
use serde_json::{json, Value};

const STATUS_LINE: &str = r#"{"uptime": 4211, "evse": {"state": "charging", "pilot": {"duty": 26, "volts": [6, -12]}}, "meter": {"amps": [16.0, 15.9, 16.1], "kwh": 3.42}, "errors": []}"#;

fn wide_document() -> Value {
    let channels: Vec<Value> =
        (0..64).map(|i| json!({"id": i, "temp": 21.5, "flags": [true, false, i % 2 == 0]})).collect();
    json!({"channels": channels, "fw": {"version": "1.4.2", "build": 512}})
}

fn bench_parse_and_flatten(c: &mut Criterion) {
    c.bench_function("status_line_parse_flatten", |b| {
        b.iter(|| {
            let value = parse_line(black_box(STATUS_LINE)).unwrap();
            black_box(flatten(&value));
        })
    });
}

fn bench_flatten_wide(c: &mut Criterion) {
    let value = wide_document();
    c.bench_function("flatten_64_channels", |b| {
        b.iter(|| {
            black_box(flatten(black_box(&value)));
        })
    });
}

fn bench_line_framing(c: &mut Criterion) {
    let stream = format!("{STATUS_LINE}\n").repeat(32);
    c.bench_function("frame_32_lines", |b| {
        b.iter(|| {
            let mut framer = LineFramer::new();
            framer.push(black_box(stream.as_bytes()));
            let mut lines = 0;
            while framer.next_line().is_some() {
                lines += 1;
            }
            black_box(lines)
        })
    });
}

criterion_group!(benches, bench_parse_and_flatten, bench_flatten_wide, bench_line_framing);
criterion_main!(benches);
