use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use graph_embed_eval::prelude::*;
use graph_embed_eval::{sample_negative, split, AgglomerativeClustering, Linkage};
use std::hint::black_box;

/// Benchmarks for the seeded stages of an evaluation run

fn fixture(communities: usize, size: usize) -> EvalGraph {
    planted_partition(communities, size, 0.2, 0.01, 42)
        .map(|p| p.graph)
        .unwrap_or_else(|e| panic!("fixture: {}", e))
}

fn benchmark_edge_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_split");

    for &size in &[25, 50, 100] {
        let graph = fixture(4, size);
        group.throughput(Throughput::Elements(graph.edge_count() as u64));
        group.bench_with_input(
            BenchmarkId::new("connectivity_preserving", graph.node_count()),
            &graph,
            |b, graph| {
                b.iter(|| black_box(split(graph, 0.5, 7)))
            },
        );
    }

    group.finish();
}

fn benchmark_negative_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("negative_sampling");

    for &size in &[25, 50, 100] {
        let graph = fixture(4, size);
        let count = graph.edge_count() / 2;
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("rejection", graph.node_count()),
            &graph,
            |b, graph| {
                b.iter(|| black_box(sample_negative(graph, count, 7)))
            },
        );
    }

    group.finish();
}

fn benchmark_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("agglomerative");
    group.sample_size(10);

    for &nodes in &[200, 400, 800] {
        let graph = fixture(4, nodes / 4);
        let embedding = match GaussianNoiseEmbedder.fit_transform(&graph, &EmbedConfig::new(32, 1)) {
            Ok(embedding) => embedding,
            Err(e) => panic!("embedding: {}", e),
        };

        for linkage in [Linkage::Ward, Linkage::Average] {
            group.bench_with_input(
                BenchmarkId::new(linkage.name(), nodes),
                &embedding,
                |b, embedding| {
                    let clustering = AgglomerativeClustering::new(linkage);
                    b.iter(|| black_box(clustering.fit_predict(embedding, 4)))
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_edge_split,
    benchmark_negative_sampling,
    benchmark_clustering
);
criterion_main!(benches);
