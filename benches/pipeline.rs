use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docsim::{
    compute_pairwise_graph, fingerprint_documents, BandIndex, PerceptualConfig, PipelineConfig,
    Session,
};

fn corpus(size: usize) -> Vec<String> {
    (0..size)
        .map(|i| {
            format!(
                "record {} shares a common prefix and a tail about subject {} variant {}",
                i,
                i % 17,
                i % 5
            )
        })
        .collect()
}

fn config() -> PipelineConfig {
    PipelineConfig::new()
        .with_k(5)
        .with_num_hashes(100)
        .with_num_bands(20)
        .with_seed(42)
}

fn perceptual_bench(c: &mut Criterion) {
    let docs = corpus(500);
    let cfg = PerceptualConfig::new().with_k(5).with_num_hashes(100).with_seed(42);

    c.bench_function("fingerprint_500_docs", |b| {
        b.iter(|| {
            let fps = fingerprint_documents(black_box(docs.as_slice()), &cfg).unwrap();
            black_box(fps);
        });
    });
}

fn index_bench(c: &mut Criterion) {
    let docs = corpus(500);
    let cfg = config();
    let fps = fingerprint_documents(docs.as_slice(), &cfg.perceptual).unwrap();

    c.bench_function("band_index_build_500_docs", |b| {
        b.iter(|| {
            let index = BandIndex::build_with(black_box(&fps.signatures), &cfg.index).unwrap();
            black_box(index);
        });
    });
}

fn process_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_process");
    for size in [100usize, 500, 2000] {
        let docs = corpus(size);
        let cfg = config();
        group.bench_with_input(BenchmarkId::from_parameter(size), &docs, |b, docs| {
            b.iter(|| {
                let mut session = Session::new();
                let report = session.process(black_box(docs.as_slice()), &cfg).unwrap();
                black_box(report);
            });
        });
    }
    group.finish();
}

fn query_bench(c: &mut Criterion) {
    let docs = corpus(2000);
    let mut session = Session::new();
    session.process(docs.as_slice(), &config()).unwrap();

    c.bench_function("run_query_2000_docs", |b| {
        let mut doc_id = 0;
        b.iter(|| {
            doc_id = (doc_id + 1) % docs.len();
            black_box(session.run_query(doc_id).unwrap());
        });
    });
}

fn graph_bench(c: &mut Criterion) {
    let docs = corpus(300);
    c.bench_function("pairwise_graph_300_docs", |b| {
        b.iter(|| {
            let edges = compute_pairwise_graph(black_box(docs.as_slice()), 5, 0.3).unwrap();
            black_box(edges);
        });
    });
}

criterion_group!(
    benches,
    perceptual_bench,
    index_bench,
    process_bench,
    query_bench,
    graph_bench
);
criterion_main!(benches);
