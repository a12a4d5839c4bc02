use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vorovox::{DiscreteVoronoi, InterfaceMatrix, TessellationConfigBuilder, VoxelGraph, random_seeds};

const RESOLUTIONS: [usize; 3] = [32, 64, 128];
const NUM_SEEDS: usize = 200;

fn benchmark_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("voxel_graph");
    group.sample_size(10);

    for &n in &RESOLUTIONS {
        let config = TessellationConfigBuilder::new()
            .resolution(&[n, n, n])
            .periodic(true)
            .method(vorovox::AssignmentMethod::Binned)
            .build()
            .unwrap();
        let seeds = random_seeds(NUM_SEEDS, &[1.0, 1.0, 1.0], 7);
        let labels = DiscreteVoronoi::new(&seeds, &config).unwrap().into_labels();

        group.bench_with_input(BenchmarkId::new("build", n), &n, |b, _| {
            b.iter(|| VoxelGraph::new(black_box(&labels), &[1.0, 1.0, 1.0], true).unwrap())
        });

        let graph = VoxelGraph::new(&labels, &[1.0, 1.0, 1.0], true).unwrap();
        let matrix = InterfaceMatrix::from_pairs(NUM_SEEDS, graph.adjacency_pairs()).unwrap();
        group.bench_with_input(BenchmarkId::new("interface_index", n), &n, |b, _| {
            b.iter(|| graph.interface_index(black_box(&matrix)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_graph);
criterion_main!(benches);
