use std::f64::consts::SQRT_2;

use ndarray::{ArrayViewMut1, ArrayViewMut2};

use crate::Vector3D;

/// `\sqrt{\frac{1}{2 \pi}}`
const SQRT_1_OVER_2PI: f64 = 0.3989422804014327;
/// `\sqrt{3}`
const SQRT_3: f64 = 1.7320508075688772;
/// `\sqrt{3 / 2}`
const SQRT_3_OVER_2: f64 = 1.224744871391589;

/// Number of `(l, m)` pairs with `0 <= l <= max_angular` and `-l <= m <= l`,
/// i.e. `(max_angular + 1)^2`.
#[inline]
pub const fn lm_size(max_angular: usize) -> usize {
    (max_angular + 1) * (max_angular + 1)
}

/// Position of the `(l, m)` spherical harmonic in arrays storing all
/// harmonics up to some `max_angular`, ordered as `(0, 0) (1, -1) (1, 0) (1,
/// 1) (2, -2) ...`. All `m` for a given `l` are contiguous, starting at
/// `lm_index(l, -l) = l^2`.
#[inline]
pub fn lm_index(l: usize, m: isize) -> usize {
    debug_assert!(m.unsigned_abs() <= l);
    return ((l * l + l) as isize + m) as usize;
}

/// Storage for associated Legendre polynomials and related coefficients, for
/// `0 <= l <= l_max` and `0 <= m <= l`.
#[derive(Debug, Clone)]
struct LegendreArray {
    max_angular: usize,
    data: Vec<f64>,
}

impl LegendreArray {
    fn new(max_angular: usize) -> LegendreArray {
        let size = (max_angular + 1) * (max_angular + 2) / 2;
        LegendreArray {
            max_angular: max_angular,
            data: vec![0.0; size],
        }
    }

    #[inline]
    fn linear_index(&self, index: [usize; 2]) -> usize {
        let [l, m] = index;
        debug_assert!(l <= self.max_angular && m <= l);
        return m + l * (l + 1) / 2;
    }
}

impl std::ops::Index<[usize; 2]> for LegendreArray {
    type Output = f64;
    fn index(&self, index: [usize; 2]) -> &f64 {
        &self.data[self.linear_index(index)]
    }
}

impl std::ops::IndexMut<[usize; 2]> for LegendreArray {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut f64 {
        let i = self.linear_index(index);
        &mut self.data[i]
    }
}

/// Real spherical harmonics `Y_l^m` and their cartesian gradients.
///
/// This uses the [Wikipedia convention][real-sph] for real spherical
/// harmonics, which are orthonormal when integrated over the unit sphere and
/// do not include the Condon-Shortley phase. Legendre polynomials are
/// evaluated with the recurrence from <https://arxiv.org/abs/1410.1748>.
///
/// An instance contains scratch buffers and is not meant to be shared between
/// threads; use one instance per thread instead.
///
/// [real-sph]: https://en.wikipedia.org/wiki/Spherical_harmonics#Real_form
#[derive(Debug, Clone)]
pub struct SphericalHarmonics {
    max_angular: usize,
    /// associated Legendre polynomials, including normalization
    legendre: LegendreArray,
    /// 'A' coefficient from the arxiv paper
    coefficient_a: LegendreArray,
    /// 'B' coefficient from the arxiv paper
    coefficient_b: LegendreArray,
    /// `sqrt((l + m) (l - m + 1)) P_l^{m - 1} - sqrt((l - m) (l + m + 1)) P_l^{m + 1}`
    delta_legendre: LegendreArray,
    /// either `m / sin(θ) P_l^m` or `- 1 / (2 cos(θ)) ∆P_l^m` depending on θ,
    /// moving the `1 / sin(θ)` singularity from the poles to the equator
    legendre_over_theta: LegendreArray,
}

impl SphericalHarmonics {
    /// Create a new `SphericalHarmonics` for all `l` up to `max_angular`
    /// (included), and pre-compute the recurrence coefficients.
    pub fn new(max_angular: usize) -> SphericalHarmonics {
        let mut coefficient_a = LegendreArray::new(max_angular);
        let mut coefficient_b = LegendreArray::new(max_angular);
        for l in 2..=max_angular {
            let ls = (l * l) as f64;
            let lm1s = ((l - 1) * (l - 1)) as f64;
            for m in 0..(l - 1) {
                let ms = (m * m) as f64;
                coefficient_a[[l, m]] = f64::sqrt((4.0 * ls - 1.0) / (ls - ms));
                coefficient_b[[l, m]] = -f64::sqrt((lm1s - ms) / (4.0 * lm1s - 1.0));
            }
        }

        SphericalHarmonics {
            max_angular: max_angular,
            legendre: LegendreArray::new(max_angular),
            coefficient_a: coefficient_a,
            coefficient_b: coefficient_b,
            delta_legendre: LegendreArray::new(max_angular),
            legendre_over_theta: LegendreArray::new(max_angular),
        }
    }

    /// Get the maximal angular degree computed by this instance
    pub fn max_angular(&self) -> usize {
        self.max_angular
    }

    fn compute_legendre(&mut self, cos_theta: f64, sin_theta: f64) {
        let mut value = SQRT_1_OVER_2PI;
        self.legendre[[0, 0]] = value;
        if self.max_angular == 0 {
            return;
        }

        self.legendre[[1, 0]] = cos_theta * SQRT_3 * value;
        value *= -SQRT_3_OVER_2 * sin_theta;
        self.legendre[[1, 1]] = value;

        let a = &self.coefficient_a;
        let b = &self.coefficient_b;
        let p = &mut self.legendre;
        for l in 2..=self.max_angular {
            for m in 0..(l - 1) {
                p[[l, m]] = a[[l, m]] * (cos_theta * p[[l - 1, m]] + b[[l, m]] * p[[l - 2, m]]);
            }

            p[[l, l - 1]] = cos_theta * f64::sqrt(2.0 * l as f64 + 1.0) * value;
            value *= -f64::sqrt(1.0 + 0.5 / l as f64) * sin_theta;
            p[[l, l]] = value;
        }
    }

    fn compute_derivative_factors(&mut self, cos_theta: f64, sin_theta: f64) {
        let delta = |l: usize, m: usize, p_minus: f64, p_plus: f64| {
            f64::sqrt(((l + m) * (l - m + 1)) as f64) * p_minus
            - f64::sqrt(((l - m) * (l + m + 1)) as f64) * p_plus
        };

        let p = &self.legendre;
        self.delta_legendre[[0, 0]] = 0.0;
        for l in 1..=self.max_angular {
            // P_l^{-1} = - (l - 1)! / (l + 1)! P_l^1
            let p_minus = -1.0 / ((l * l + l) as f64) * p[[l, 1]];
            self.delta_legendre[[l, 0]] = delta(l, 0, p_minus, p[[l, 1]]);

            for m in 1..l {
                self.delta_legendre[[l, m]] = delta(l, m, p[[l, m - 1]], p[[l, m + 1]]);
            }

            self.delta_legendre[[l, l]] = delta(l, l, p[[l, l - 1]], 0.0);
        }

        for l in 0..=self.max_angular {
            for m in 0..=l {
                self.legendre_over_theta[[l, m]] = if sin_theta > 0.1 {
                    m as f64 / sin_theta * p[[l, m]]
                } else {
                    -0.5 / cos_theta * self.delta_legendre[[l, m]]
                };
            }
        }
    }

    /// Evaluate all spherical harmonics for the given unit `direction`,
    /// storing `Y_l^m` in `values[lm_index(l, m)]`.
    ///
    /// If `gradients` is `Some`, this also stores the gradient of `Y_l^m(r /
    /// |r|)` with respect to the cartesian components of `r`, evaluated at `r =
    /// direction`, in `gradients[[α, lm_index(l, m)]]` for `α = x, y, z`. For
    /// a vector of norm `|r|`, the gradient has to be divided by `|r|`.
    pub fn compute(
        &mut self,
        direction: Vector3D,
        mut values: ArrayViewMut1<f64>,
        mut gradients: Option<ArrayViewMut2<f64>>,
    ) {
        assert!(
            (direction.norm2() - 1.0).abs() < 1e-9,
            "expected the direction vector to be normalized in spherical harmonics"
        );
        let size = lm_size(self.max_angular);
        assert_eq!(
            values.len(), size,
            "wrong size for the values array, expected {}, got {}",
            size, values.len(),
        );
        if let Some(ref gradients) = gradients {
            assert_eq!(
                gradients.shape(), [3, size],
                "wrong shape for the gradients array, expected [3, {}], got {:?}",
                size, gradients.shape(),
            );
        }

        let sin_theta = f64::hypot(direction[0], direction[1]);
        let cos_theta = direction[2];
        let (cos_phi, sin_phi) = if sin_theta > f64::EPSILON {
            (direction[0] / sin_theta, direction[1] / sin_theta)
        } else {
            (1.0, 0.0)
        };

        self.compute_legendre(cos_theta, sin_theta);
        if gradients.is_some() {
            self.compute_derivative_factors(cos_theta, sin_theta);
        }

        for l in 0..=self.max_angular {
            values[lm_index(l, 0)] = self.legendre[[l, 0]] / SQRT_2;
        }

        if let Some(ref mut gradients) = gradients {
            gradients.column_mut(0).fill(0.0);
            for l in 1..=self.max_angular {
                let factor = f64::sqrt(0.5 * (l * (l + 1)) as f64) * self.legendre[[l, 1]];
                let lm = lm_index(l, 0);
                gradients[[0, lm]] = cos_phi * cos_theta * factor;
                gradients[[1, lm]] = sin_phi * cos_theta * factor;
                gradients[[2, lm]] = -sin_theta * factor;
            }
        }

        // recurrence for cos(m ϕ) and sin(m ϕ), with signs flipped compared
        // to the arxiv paper to cancel the Condon-Shortley phase
        let mut cos_1 = 1.0;
        let mut sin_1 = 0.0;
        let mut cos_2 = -cos_phi;
        let mut sin_2 = sin_phi;
        let minus_two_cos = -2.0 * cos_phi;

        for m in 1..=self.max_angular {
            let sin_m_phi = minus_two_cos * sin_1 - sin_2;
            let cos_m_phi = minus_two_cos * cos_1 - cos_2;
            sin_2 = sin_1;
            sin_1 = sin_m_phi;
            cos_2 = cos_1;
            cos_1 = cos_m_phi;

            let im = m as isize;
            for l in m..=self.max_angular {
                let p_lm = self.legendre[[l, m]];
                values[lm_index(l, im)] = p_lm * cos_m_phi;
                values[lm_index(l, -im)] = p_lm * sin_m_phi;
            }

            if let Some(ref mut gradients) = gradients {
                for l in m..=self.max_angular {
                    let cos_delta = cos_m_phi * self.delta_legendre[[l, m]];
                    let sin_delta = sin_m_phi * self.delta_legendre[[l, m]];
                    let over_theta = self.legendre_over_theta[[l, m]];

                    let positive = lm_index(l, im);
                    let negative = lm_index(l, -im);

                    gradients[[0, positive]] = sin_phi * over_theta * sin_m_phi - 0.5 * cos_theta * cos_phi * cos_delta;
                    gradients[[0, negative]] = -sin_phi * over_theta * cos_m_phi - 0.5 * cos_theta * cos_phi * sin_delta;

                    gradients[[1, positive]] = -cos_phi * over_theta * sin_m_phi - 0.5 * cos_theta * sin_phi * cos_delta;
                    gradients[[1, negative]] = cos_phi * over_theta * cos_m_phi - 0.5 * cos_theta * sin_phi * sin_delta;

                    gradients[[2, positive]] = 0.5 * sin_theta * cos_delta;
                    gradients[[2, negative]] = 0.5 * sin_theta * sin_delta;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};

    use super::*;

    fn directions() -> Vec<Vector3D> {
        let mut directions = vec![
            Vector3D::new(1.0, 0.0, 0.0),
            Vector3D::new(0.0, 1.0, 0.0),
            Vector3D::new(0.0, 0.0, 1.0),
            Vector3D::new(0.0, 0.0, -1.0),
            Vector3D::new(1.0, 1.0, 1.0),
            Vector3D::new(1.0, -3.0, 9.0),
            Vector3D::new(1.0, 8.0, 12.0),
            Vector3D::new(-452.0, 825.0, 22.0),
        ];

        for d in &mut directions {
            *d /= d.norm();
        }
        return directions;
    }

    #[test]
    fn lm_indexes() {
        let max_angular = 20;
        let mut set = HashSet::new();
        for l in 0..=max_angular {
            for m in -(l as isize)..=(l as isize) {
                assert!(set.insert(lm_index(l, m)));
            }
        }
        assert_eq!(set.len(), lm_size(max_angular));
        assert_eq!(set.iter().max(), Some(&(lm_size(max_angular) - 1)));

        let legendre = LegendreArray::new(max_angular);
        let mut set = HashSet::new();
        for l in 0..=max_angular {
            for m in 0..=l {
                assert!(set.insert(legendre.linear_index([l, m])));
            }
        }
        assert_eq!(set.len(), legendre.data.len());
    }

    #[test]
    fn low_degrees() {
        let mut sph = SphericalHarmonics::new(1);
        let mut values = Array1::zeros(lm_size(1));

        let y00 = 0.5 / f64::sqrt(std::f64::consts::PI);
        let y1 = f64::sqrt(3.0 / (4.0 * std::f64::consts::PI));
        for direction in directions() {
            sph.compute(direction, values.view_mut(), None);
            assert_relative_eq!(values[0], y00, max_relative = 1e-14);
            // l = 1 harmonics are proportional to (y, z, x)
            assert_relative_eq!(values[1], y1 * direction[1], epsilon = 1e-14);
            assert_relative_eq!(values[2], y1 * direction[2], epsilon = 1e-14);
            assert_relative_eq!(values[3], y1 * direction[0], epsilon = 1e-14);
        }
    }

    #[test]
    fn addition_theorem() {
        // sum_m Y_l^m(r)^2 = (2l + 1) / 4π for all directions
        let max_angular = 12;
        let mut sph = SphericalHarmonics::new(max_angular);
        let mut values = Array1::zeros(lm_size(max_angular));

        for direction in directions() {
            sph.compute(direction, values.view_mut(), None);
            for l in 0..=max_angular {
                let start = lm_index(l, -(l as isize));
                let stop = lm_index(l, l as isize);
                let sum = values.slice(ndarray::s![start..=stop]).mapv(|v| v * v).sum();
                let expected = (2 * l + 1) as f64 / (4.0 * std::f64::consts::PI);
                assert_relative_eq!(sum, expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn finite_differences() {
        let max_angular = 25;
        let mut sph = SphericalHarmonics::new(max_angular);
        let mut values = Array1::zeros(lm_size(max_angular));
        let mut values_delta = Array1::zeros(lm_size(max_angular));
        let mut gradients = Array2::zeros((3, lm_size(max_angular)));

        let delta = 1e-9;
        for direction in directions() {
            sph.compute(direction, values.view_mut(), Some(gradients.view_mut()));

            for alpha in 0..3 {
                let mut displaced = direction;
                displaced[alpha] += delta;
                displaced /= displaced.norm();
                sph.compute(displaced, values_delta.view_mut(), None);

                for lm in 0..lm_size(max_angular) {
                    let finite_difference = (values_delta[lm] - values[lm]) / delta;
                    assert_relative_eq!(
                        finite_difference, gradients[[alpha, lm]],
                        epsilon = 1e-5, max_relative = 1e-5
                    );
                }
            }
        }
    }

    mod bad {
        use ndarray::{Array1, Array2};
        use super::super::{SphericalHarmonics, lm_size};
        use crate::Vector3D;

        #[test]
        #[should_panic = "wrong size for the values array, expected 16, got 36"]
        fn value_array_size() {
            let mut sph = SphericalHarmonics::new(3);
            let mut values = Array1::zeros(lm_size(5));
            sph.compute(Vector3D::new(1.0, 0.0, 0.0), values.view_mut(), None);
        }

        #[test]
        #[should_panic = "wrong shape for the gradients array, expected [3, 16], got [3, 36]"]
        fn gradient_array_size() {
            let mut sph = SphericalHarmonics::new(3);
            let mut values = Array1::zeros(lm_size(3));
            let mut gradients = Array2::zeros((3, lm_size(5)));
            sph.compute(Vector3D::new(1.0, 0.0, 0.0), values.view_mut(), Some(gradients.view_mut()));
        }

        #[test]
        #[should_panic = "expected the direction vector to be normalized"]
        fn non_normalized_direction() {
            let mut sph = SphericalHarmonics::new(3);
            let mut values = Array1::zeros(lm_size(3));
            sph.compute(Vector3D::new(1.0, 1.0, 1.0), values.view_mut(), None);
        }
    }
}
