//! Criterion benchmarks for log_fanout

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use log_fanout::prelude::*;
use log_fanout::MemoryTransport;
use std::sync::Arc;

struct NullSink;

#[async_trait]
impl Sink for NullSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        black_box(record);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn null_registry() -> Arc<LoggerRegistry> {
    let registry = Arc::new(LoggerRegistry::new());
    let mut sinks = SinkMap::new();
    sinks.insert("null".to_string(), Arc::new(NullSink) as Arc<dyn Sink>);
    registry
        .configure(
            sinks,
            vec![
                RegistryEntry::new("app", LogLevel::Info).sink("null"),
                RegistryEntry::new("app.auth.oauth", LogLevel::Debug).sink("null"),
            ],
        )
        .expect("valid configuration");
    registry
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let registry = null_registry();
    let shallow = registry.logger("app");
    let deep = registry.logger("app.auth.oauth.google.callback");
    let unrouted = registry.logger("worker");

    group.bench_function("routed", |b| {
        b.iter(|| shallow.info(black_box("Info message")));
    });

    group.bench_function("filtered", |b| {
        b.iter(|| shallow.debug(black_box("Debug message")));
    });

    group.bench_function("deep_category", |b| {
        b.iter(|| deep.info(black_box("Info message")));
    });

    group.bench_function("unrouted", |b| {
        b.iter(|| unrouted.fatal(black_box("Dropped message")));
    });

    group.bench_function("with_properties", |b| {
        b.iter(|| {
            shallow.info_with(
                black_box("Order placed"),
                Properties::new()
                    .with("order_id", 1042)
                    .with("amount", 99.5)
                    .with("currency", "EUR"),
            )
        });
    });

    group.finish();
}

fn bench_concurrent_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_dispatch");
    let registry = null_registry();

    group.bench_function("multi_thread_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let logger = registry.logger("app.worker");
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            logger.info(black_box("Concurrent message"));
                        }
                    })
                })
                .collect();
            for handle in handles {
                let _ = handle.join();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Sink Benchmarks
// ============================================================================

fn bench_record_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_line");
    group.throughput(Throughput::Elements(1));

    let record = LogRecord::new(Category::from("app.billing"), LogLevel::Error, "charge failed")
        .with_properties(
            Properties::new()
                .with("invoice_id", 1042)
                .with("customer", "c-77")
                .with("retryable", false),
        );

    group.bench_function("to_line", |b| {
        b.iter(|| black_box(record.to_line()));
    });

    group.finish();
}

fn bench_batching_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("batching_sink");
    group.throughput(Throughput::Elements(1));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .expect("runtime");
    let sink = BatchingNetworkSink::with_runtime(
        AggregatorConfig::new("http://loki.bench/push", "bench", "bench").with_batch_size(500),
        MemoryTransport::new(),
        runtime.handle().clone(),
    )
    .expect("valid config");
    let record = LogRecord::new(Category::from("app"), LogLevel::Info, "buffered");

    group.bench_function("write", |b| {
        b.iter(|| sink.write(black_box(&record)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_concurrent_dispatch,
    bench_record_line,
    bench_batching_write
);
criterion_main!(benches);
