use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use depthcharge::cache::MemoryLinkCache;
use depthcharge::graph::{CancelToken, TraversalEngine, TraversalOptions};
use depthcharge::report::RouteCollector;
use depthcharge::source::OfflineEdgeSource;
use depthcharge::types::TraversalParams;

/// Every page links to `fanout` pseudo-random pages out of `pages`, and
/// every seventh page links back to the root.
fn synthetic_cache(pages: usize, fanout: usize) -> MemoryLinkCache {
    let entries = (0..pages).map(|i| {
        let mut links: Vec<String> = (1..=fanout)
            .map(|k| format!("P{}", (i * 31 + k * 17) % pages))
            .collect();
        if i % 7 == 0 {
            links.push("P0".to_string());
        }
        (format!("P{i}"), links)
    });
    MemoryLinkCache::with_entries(entries)
}

fn bench_traversal(c: &mut Criterion) {
    let cache = synthetic_cache(2_000, 12);
    let mut group = c.benchmark_group("traversal");
    group.sample_size(20);

    for workers in [1usize, 4] {
        for depth in [2u32, 3] {
            let options = TraversalOptions {
                delay: Duration::ZERO,
                workers,
                oversize_threshold: 5000,
            };
            group.bench_with_input(
                BenchmarkId::new(format!("workers_{workers}"), depth),
                &depth,
                |b, &depth| {
                    b.iter(|| {
                        let collector = RouteCollector::new();
                        let engine =
                            TraversalEngine::new(&cache, &OfflineEdgeSource, &collector, options.clone());
                        let outcome = engine
                            .run(&TraversalParams::returning_to_root("P0", depth), &CancelToken::new())
                            .unwrap();
                        black_box((outcome.stats, collector.len()))
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
