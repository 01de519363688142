use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gannet::{
    network::{ActivationFunction, Network, NetworkBuilder},
    population::{Population, PopulationOptions},
    rng::RandomNumberGenerator,
};

const INPUTS: [[f64; 4]; 4] = [
    [0.0, 0.0, 1.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [1.0, 0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0, 0.0],
];

fn network() -> Network<f64> {
    NetworkBuilder::new()
        .input(4)
        .unwrap()
        .hidden_layer_count(2)
        .unwrap()
        .hidden_layer(8, ActivationFunction::Relu)
        .unwrap()
        .hidden_layer(8, ActivationFunction::Sigmoid)
        .unwrap()
        .output_layer(1, ActivationFunction::Identity)
        .unwrap()
}

fn score(network: &mut Network<f64>) -> gannet::Result<f64> {
    let mut total = 0.0;
    for input in &INPUTS {
        total -= network.forward_propagate(input)?[0].abs();
    }
    Ok(total)
}

fn seeded_population(size: usize, length: usize, threshold: usize) -> Population<f64, f64> {
    let mut population = Population::with_rng(RandomNumberGenerator::from_seed(42));
    population
        .reset(
            PopulationOptions::new(size, length, -1.0, 1.0, size / 10)
                .with_parallel_threshold(threshold),
        )
        .unwrap();
    population.set_individuals_random(-1.0, 1.0).unwrap();
    population
}

fn bench_next_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_generation");
    let length = network().weight_size();

    for size in [20, 200, 2000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut population = seeded_population(size, length, usize::MAX);
            let fitnesses: Vec<f64> = (0..size).map(|i| i as f64).collect();
            b.iter(|| {
                population.evaluate(black_box(&fitnesses)).unwrap();
                population.generate_next_generation().unwrap();
            })
        });
    }
    group.finish();
}

fn bench_evaluate_with(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_with");
    let network = network();

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, &size| {
            let mut population = seeded_population(size, network.weight_size(), usize::MAX);
            b.iter(|| population.evaluate_with(black_box(&network), score).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, &size| {
            let mut population = seeded_population(size, network.weight_size(), 1);
            b.iter(|| population.evaluate_with(black_box(&network), score).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_next_generation, bench_evaluate_with);
criterion_main!(benches);
