use criterion::{BenchmarkId, Criterion};
use matchbook_rs::SpscQueue;
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

/// Register benchmarks for the SPSC event queue
pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("EventQueue - Throughput");
    group.sample_size(50);

    // Uncontended push/pop cycles on a single thread
    for batch in [64, 512].iter() {
        group.bench_with_input(
            BenchmarkId::new("push_pop_batch", batch),
            batch,
            |b, &batch| {
                let queue: SpscQueue<u64> = SpscQueue::with_capacity(1024);
                b.iter(|| {
                    for value in 0..batch {
                        let _ = black_box(queue.push(value));
                    }
                    for _ in 0..batch {
                        black_box(queue.pop());
                    }
                })
            },
        );
    }

    // Producer and consumer on separate threads handing off a fixed stream
    group.bench_function("cross_thread_handoff_100k", |b| {
        b.iter(|| {
            const COUNT: u64 = 100_000;
            let queue: Arc<SpscQueue<u64>> = Arc::new(SpscQueue::with_capacity(1024));

            let producer_queue = Arc::clone(&queue);
            let producer = thread::spawn(move || {
                for value in 0..COUNT {
                    let mut item = value;
                    while let Err(returned) = producer_queue.push(item) {
                        item = returned;
                        thread::yield_now();
                    }
                }
            });

            let mut received = 0u64;
            while received < COUNT {
                if queue.pop().is_some() {
                    received += 1;
                } else {
                    thread::yield_now();
                }
            }
            producer.join().expect("producer should finish");
            black_box(received)
        })
    });

    group.finish();
}
