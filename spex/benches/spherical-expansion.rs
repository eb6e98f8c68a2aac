#![allow(clippy::needless_return)]
use spex::{Edges, RaggedTensors, SphericalExpansion, Vector3D};

use criterion::{BenchmarkGroup, Criterion, measurement::WallTime, SamplingMode};
use criterion::{criterion_group, criterion_main};

const CUTOFF: f64 = 4.0;

/// Slightly distorted simple cubic lattice with `n^3` atoms and three
/// species
fn cluster(n: usize) -> Edges {
    let mut positions = Vec::new();
    let mut species = Vec::new();
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let index = (i * n + j) * n + k;
                let jitter = 0.2 * f64::sin(index as f64);
                positions.push(Vector3D::new(
                    1.5 * i as f64 + jitter,
                    1.5 * j as f64 - jitter,
                    1.5 * k as f64 + 0.5 * jitter,
                ));
                species.push([1, 6, 8][index % 3]);
            }
        }
    }

    return Edges::from_positions(&positions, &species, CUTOFF).expect("failed to build neighbor list");
}

fn expansion(max_radial: usize, max_angular: usize) -> SphericalExpansion {
    let parameters = format!(r#"{{
        "cutoff": {CUTOFF},
        "max_angular": {max_angular},
        "radial": {{"Gto": {{"max_radial": {max_radial}, "cutoff": {CUTOFF}, "spline_accuracy": 1e-8}}}},
        "angular": {{"SphericalHarmonics": {{"max_angular": {max_angular}}}}},
        "species": {{"OneHot": {{"species": [1, 6, 8]}}}},
        "cutoff_function": {{"ShiftedCosine": {{"cutoff": {CUTOFF}, "width": 0.5}}}}
    }}"#);

    return SphericalExpansion::from_json(&parameters).expect("invalid expansion parameters");
}

fn run_spherical_expansion(mut group: BenchmarkGroup<WallTime>, backward: bool, test_mode: bool) {
    // keep the time required to test the benchmarks code under control
    let edges = if test_mode { cluster(3) } else { cluster(8) };
    let n_atoms = edges.n_atoms();

    for &(max_radial, max_angular) in &[(2, 1), (8, 7), (15, 14)] {
        let expansion = expansion(max_radial, max_angular);
        let output_gradient = RaggedTensors::zeros(n_atoms, max_angular, max_radial, 3);

        group.bench_function(&format!("n_max = {}, l_max = {}", max_radial, max_angular), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for _ in 0..repeat {
                if backward {
                    expansion.backward(&edges, &output_gradient).unwrap();
                } else {
                    expansion.compute(&edges).unwrap();
                }
            }
            start.elapsed() / n_atoms as u32
        }));
    }
}

fn spherical_expansion(c: &mut Criterion) {
    let test_mode = std::env::args().any(|arg| arg == "--test");

    let mut group = c.benchmark_group("Spherical expansion (per atom)/Distorted cubic cluster");
    group.noise_threshold(0.05);
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);

    run_spherical_expansion(group, false, test_mode);

    let mut group = c.benchmark_group("Spherical expansion backward (per atom)/Distorted cubic cluster");
    group.noise_threshold(0.05);
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);

    run_spherical_expansion(group, true, test_mode);
}

criterion_group!(all, spherical_expansion);
criterion_main!(all);
