use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use valuetree::Tree;

/// Builds a complete tree where every node has `fanout` children.
fn make_wide_tree(size: usize, fanout: usize) -> Tree<usize> {
    let mut tree = Tree::with_capacity(size);
    let mut nodes = Vec::with_capacity(size);

    if size > 0 {
        nodes.push(tree.insert(0, None).unwrap());
    }

    for value in 1..size {
        let parent = nodes[(value - 1) / fanout];
        nodes.push(tree.insert_under(value, parent).unwrap());
    }

    tree
}

fn bench_make_tree(c: &mut Criterion) {
    let mut g = c.benchmark_group("tree creation");

    for size in [0, 100, 10_000, 1_000_000] {
        g.bench_with_input(BenchmarkId::new("make_wide_tree", size), &size, |b, size| {
            b.iter(|| black_box(make_wide_tree(*size, 4)))
        });
    }
}

fn bench_find(c: &mut Criterion) {
    let mut g = c.benchmark_group("tree search");

    for size in [100, 10_000, 100_000] {
        g.bench_with_input(BenchmarkId::new("find_last", size), &size, |b, size| {
            let tree = make_wide_tree(*size, 4);
            b.iter(|| black_box(tree.find_index(&(size - 1))))
        });
        g.bench_with_input(BenchmarkId::new("get_all_parents", size), &size, |b, size| {
            let tree = make_wide_tree(*size, 4);
            b.iter(|| black_box(tree.get_all_parents(&(size - 1)).len()))
        });
    }
}

fn bench_remove(c: &mut Criterion) {
    let mut g = c.benchmark_group("tree removal");

    for size in [100, 10_000, 100_000] {
        g.bench_with_input(BenchmarkId::new("remove_first_child", size), &size, |b, size| {
            let tree = make_wide_tree(*size, 4);
            b.iter_batched(
                || tree.clone(),
                |mut tree| black_box(tree.remove(&1)),
                criterion::BatchSize::LargeInput,
            )
        });
    }
}

criterion_group!(benches, bench_make_tree, bench_find, bench_remove);
criterion_main!(benches);
