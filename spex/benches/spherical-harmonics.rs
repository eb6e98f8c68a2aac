use ndarray::{Array1, Array2};

use spex::Vector3D;
use spex::math::{lm_size, SphericalHarmonics};

use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn directions() -> Vec<Vector3D> {
    let mut directions = vec![
        // randomly generated directions
        Vector3D::new(-0.762711, -0.145476, -0.630166),
        Vector3D::new(-0.291615, -0.637339, -0.713274),
        Vector3D::new(0.888404, 0.305854, 0.342332),
        Vector3D::new(-0.890056, 0.40123, -0.216367),
        Vector3D::new(-0.975884, -0.0897871, 0.19897),
        Vector3D::new(0.391125, -0.913027, 0.115768),
        Vector3D::new(-0.656982, -0.642407, 0.394572),
        Vector3D::new(0.623778, -0.236985, 0.744808),
        // a few specific values
        Vector3D::new(0.0, 0.0, 1.0),
        Vector3D::new(0.0, 0.0, -1.0),
        Vector3D::new(1.0, 0.0, 0.0),
    ];

    for d in &mut directions {
        *d /= d.norm();
    }
    return directions;
}

fn spherical_harmonics(c: &mut Criterion) {
    let mut group = c.benchmark_group("spherical harmonics (per direction)");
    group.noise_threshold(0.05);

    let directions = directions();
    for &max_angular in black_box(&[1, 3, 5, 7, 13, 21]) {
        let mut sph = SphericalHarmonics::new(max_angular);
        let mut values = Array1::zeros(lm_size(max_angular));

        group.bench_function(format!("l_max = {}", max_angular), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for _ in 0..repeat {
                for &direction in &directions {
                    sph.compute(direction, values.view_mut(), None);
                }
            }
            start.elapsed() / directions.len() as u32
        }));
    }
}

fn spherical_harmonics_with_gradients(c: &mut Criterion) {
    let mut group = c.benchmark_group("spherical harmonics with gradients (per direction)");
    group.noise_threshold(0.05);

    let directions = directions();
    for &max_angular in black_box(&[1, 3, 5, 7, 13, 21]) {
        let mut sph = SphericalHarmonics::new(max_angular);
        let mut values = Array1::zeros(lm_size(max_angular));
        let mut gradients = Array2::zeros((3, lm_size(max_angular)));

        group.bench_function(format!("l_max = {}", max_angular), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for _ in 0..repeat {
                for &direction in &directions {
                    sph.compute(direction, values.view_mut(), Some(gradients.view_mut()));
                }
            }
            start.elapsed() / directions.len() as u32
        }));
    }
}

criterion_group!(benches, spherical_harmonics, spherical_harmonics_with_gradients);
criterion_main!(benches);
