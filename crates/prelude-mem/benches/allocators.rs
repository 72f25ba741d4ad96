//! Allocator strategy benchmarks.
//!
//! Measures the cost of the hot paths for each strategy:
//! - Bump allocation and bulk release (arena)
//! - Pop/push on the free list (pool)
//! - Heap passthrough with block bookkeeping (libc)
//! - Growing a buffer through `realloc`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use prelude_mem::{Allocator, Arena, LibcAllocator, Pool, allocator};

fn bench_arena_alloc(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_alloc");

    for count in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut arena = Arena::new(count * 64).unwrap();

            b.iter(|| {
                for _ in 0..count {
                    black_box(arena.alloc(48, 16));
                }
                arena.free_all();
            });
        });
    }

    group.finish();
}

fn bench_pool_alloc_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_alloc_free");

    for count in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut pool = Pool::new(count * 64, 64, 16).unwrap();
            let mut nodes = Vec::with_capacity(count);

            b.iter(|| {
                for _ in 0..count {
                    nodes.extend(pool.alloc(64, 16));
                }
                for node in nodes.drain(..) {
                    pool.free(node);
                }
            });
        });
    }

    group.finish();
}

fn bench_libc_alloc_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("libc_alloc_free");

    for count in [100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut heap = LibcAllocator::new();
            let mut blocks = Vec::with_capacity(count);

            b.iter(|| {
                for _ in 0..count {
                    blocks.extend(heap.alloc(64, 16));
                }
                for block in blocks.drain(..) {
                    heap.free(block);
                }
            });
        });
    }

    group.finish();
}

fn bench_realloc_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("realloc_growth");

    group.bench_function("arena_in_place", |b| {
        let mut arena = Arena::new(1 << 20).unwrap();
        b.iter(|| {
            let mut current = None;
            let mut size = 16;
            while size <= 1 << 16 {
                current = allocator::realloc(&mut arena, current, size, 8);
                size *= 2;
            }
            black_box(current);
            arena.free_all();
        });
    });

    group.bench_function("libc_moving", |b| {
        let mut heap = LibcAllocator::new();
        b.iter(|| {
            let mut current = None;
            let mut size = 16;
            while size <= 1 << 16 {
                current = allocator::realloc(&mut heap, current, size, 8);
                size *= 2;
            }
            allocator::free(&mut heap, black_box(current));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_arena_alloc,
    bench_pool_alloc_free,
    bench_libc_alloc_free,
    bench_realloc_growth
);
criterion_main!(benches);
