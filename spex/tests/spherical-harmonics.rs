use std::f64::consts::PI;

use approx::assert_relative_eq;
use ndarray::{Array1, Array2};

use spex::Vector3D;
use spex::math::{lm_index, lm_size, SphericalHarmonics};

mod utils;

#[test]
fn second_degree() {
    let mut sph = SphericalHarmonics::new(2);
    let mut values = Array1::zeros(lm_size(2));

    let directions = [
        Vector3D::new(0.3, -0.5, 0.8),
        Vector3D::new(-1.0, 2.0, 0.1),
        Vector3D::new(0.0, 0.0, -1.0),
        Vector3D::new(4.0, 3.0, 0.0),
    ];

    let c = 0.5 * f64::sqrt(15.0 / PI);
    for direction in directions {
        let direction = direction / direction.norm();
        let [x, y, z] = <[f64; 3]>::from(direction);
        sph.compute(direction, values.view_mut(), None);

        assert_relative_eq!(values[lm_index(2, -2)], c * x * y, epsilon = 1e-14);
        assert_relative_eq!(values[lm_index(2, -1)], c * y * z, epsilon = 1e-14);
        assert_relative_eq!(values[lm_index(2, 0)], 0.25 * f64::sqrt(5.0 / PI) * (3.0 * z * z - 1.0), epsilon = 1e-14);
        assert_relative_eq!(values[lm_index(2, 1)], c * x * z, epsilon = 1e-14);
        assert_relative_eq!(values[lm_index(2, 2)], 0.5 * c * (x * x - y * y), epsilon = 1e-14);
    }
}

#[test]
fn orthonormality() {
    let max_angular = 6;
    let size = lm_size(max_angular);
    let mut sph = SphericalHarmonics::new(max_angular);
    let mut values = Array1::zeros(size);

    let mut overlap = Array2::<f64>::zeros((size, size));
    for (direction, weight) in utils::sphere_quadrature(max_angular) {
        sph.compute(direction, values.view_mut(), None);
        for i in 0..size {
            for j in 0..size {
                overlap[[i, j]] += weight * values[i] * values[j];
            }
        }
    }

    assert_relative_eq!(overlap, Array2::<f64>::eye(size), epsilon = 1e-12);
}
