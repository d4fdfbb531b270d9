//! Benchmarks for generation, post-processing and playback

use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use powermon::{
    advance, process, process_series, GeneratorConfig, PlaybackCursor, RollingBuffer,
    SeriesGenerator, Table,
};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn week_batch() -> Table {
    let mut generator = SeriesGenerator::new(GeneratorConfig::new().with_seed(42));
    let series = generator
        .generate::<&str>(start(), start() + Duration::days(7), &[])
        .unwrap();
    process_series(&series).table
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    // 7 days, 15-minute interval, 3 sensors
    group.throughput(Throughput::Elements(2019));

    group.bench_function("generate_week", |b| {
        let mut generator = SeriesGenerator::new(GeneratorConfig::new().with_seed(1));
        b.iter(|| {
            let series = generator
                .generate::<&str>(start(), start() + Duration::days(7), &[])
                .unwrap();
            black_box(series);
        })
    });

    group.finish();
}

fn bench_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("processing");

    let mut generator = SeriesGenerator::new(GeneratorConfig::new().with_seed(2));
    let series = generator
        .generate::<&str>(start(), start() + Duration::days(7), &[])
        .unwrap();
    let records = series.to_records();

    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("process_week", |b| {
        b.iter(|| {
            let processed = process(black_box(&records));
            black_box(processed);
        })
    });

    group.finish();
}

fn bench_playback(c: &mut Criterion) {
    let mut group = c.benchmark_group("playback");

    let batch = week_batch();

    group.throughput(Throughput::Elements(1000));

    group.bench_function("advance_1000_ticks", |b| {
        b.iter(|| {
            let mut cursor = PlaybackCursor::default();
            let mut buffer = RollingBuffer::new();
            for _ in 0..1000 {
                let (slice, next) = advance(cursor, &batch, 10);
                buffer.append(&slice);
                cursor = next;
            }
            black_box(buffer);
        })
    });

    group.bench_function("buffer_snapshot", |b| {
        let mut buffer = RollingBuffer::new();
        buffer.append(&batch.tail(200));
        b.iter(|| {
            let table = buffer.to_table();
            black_box(table);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_generation, bench_processing, bench_playback);
criterion_main!(benches);
