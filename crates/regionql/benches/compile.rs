use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use regionql::{
    EntityMetadata, PageRequest, PagedResults, PartTree, PropertyKind, QueryCompiler, QueryMethod,
    QueryMethodMetadata, Sort,
};
use std::sync::Arc;

/// An entity with `n` integer properties `p0..pn`.
fn entity(n: usize) -> EntityMetadata {
    (0..n).fold(EntityMetadata::new("Bench"), |meta, i| {
        meta.with_property(format!("p{i}"), PropertyKind::Integer)
    })
}

/// `findByP0AndP1...` with `n` criteria.
fn method_name(n: usize) -> String {
    let criteria: Vec<String> = (0..n).map(|i| format!("P{i}GreaterThan")).collect();
    format!("findBy{}", criteria.join("And"))
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/parse");

    for n in [1, 5, 10, 25] {
        let name = method_name(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &name, |b, name| {
            b.iter(|| black_box(PartTree::parse(name).unwrap()));
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/compile");

    for n in [1, 5, 10, 25] {
        let meta = entity(n);
        let tree = PartTree::parse(&method_name(n)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &tree, |b, tree| {
            b.iter(|| {
                black_box(
                    QueryCompiler::new(&meta, tree)
                        .compile(&Sort::unsorted())
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_create_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/create_query");

    for n in [1, 10] {
        let metadata = QueryMethodMetadata::new()
            .with_hints(["Idx"])
            .with_limit(100)
            .distinct();
        let method = QueryMethod::new(method_name(n), n, Arc::new(entity(n)), metadata).unwrap();
        let sort = Sort::new().desc("p0").unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &method, |b, method| {
            b.iter(|| black_box(method.create_query(&sort).unwrap()));
        });
    }

    group.finish();
}

fn bench_paging(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/paging");

    for total in [100usize, 10_000] {
        let rows: Arc<Vec<u64>> = Arc::new((0..total as u64).collect());
        group.bench_with_input(BenchmarkId::from_parameter(total), &rows, |b, rows| {
            b.iter(|| {
                let page = PagedResults::new(rows.clone(), PageRequest::of(3, 20).unwrap());
                black_box(page.size())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_compile,
    bench_create_query,
    bench_paging
);
criterion_main!(benches);
