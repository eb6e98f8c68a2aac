#![allow(dead_code)]

use std::f64::consts::PI;

use spex::Vector3D;

/// Gauss-Legendre nodes and weights on `[-1, 1]`, using Newton iterations
/// on the Legendre polynomial
pub fn gauss_legendre(n: usize) -> Vec<(f64, f64)> {
    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let mut x = f64::cos(PI * (i as f64 + 0.75) / (n as f64 + 0.5));
        let mut derivative = 0.0;
        for _ in 0..100 {
            let mut p0 = 1.0;
            let mut p1 = x;
            for k in 2..=n {
                let k = k as f64;
                let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
                p0 = p1;
                p1 = p2;
            }
            derivative = n as f64 * (x * p1 - p0) / (x * x - 1.0);
            let dx = p1 / derivative;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        result.push((x, 2.0 / ((1.0 - x * x) * derivative * derivative)));
    }
    return result;
}

/// Quadrature points and weights on the unit sphere, integrating exactly all
/// polynomials in `(x, y, z)` of degree up to `2 * max_angular`
pub fn sphere_quadrature(max_angular: usize) -> Vec<(Vector3D, f64)> {
    let n_phi = 2 * max_angular + 2;
    let mut result = Vec::new();
    for (cos_theta, weight) in gauss_legendre(max_angular + 2) {
        let sin_theta = f64::sqrt(1.0 - cos_theta * cos_theta);
        for k in 0..n_phi {
            let phi = 2.0 * PI * k as f64 / n_phi as f64;
            result.push((
                Vector3D::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta),
                weight * 2.0 * PI / n_phi as f64,
            ));
        }
    }
    return result;
}
