use std::cell::RefCell;

use log::warn;
use ndarray::{Array2, Array3, ArrayView1, ArrayViewMut1, ArrayViewMut2, Axis, Zip, s};
use thread_local::ThreadLocal;

use crate::Vector3D;
use crate::math::{self, lm_size};
use super::AngularEmbedding;

/// Parameters for the real spherical harmonics angular embedding
#[derive(Debug, Clone, Copy)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SphericalHarmonicsParameters {
    /// Maximal angular degree to compute
    pub max_angular: usize,
}

/// Parameters for the real solid harmonics angular embedding
#[derive(Debug, Clone, Copy)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SolidHarmonicsParameters {
    /// Maximal angular degree to compute
    pub max_angular: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scaling {
    /// `Y_l^m(r / |r|)`
    Unit,
    /// `|r|^l Y_l^m(r / |r|)`
    Solid,
}

/// Shared implementation of the harmonics embeddings, keeping one set of
/// scratch buffers per thread.
struct Harmonics {
    max_angular: usize,
    scaling: Scaling,
    cache: ThreadLocal<RefCell<math::SphericalHarmonics>>,
}

impl std::fmt::Debug for Harmonics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harmonics")
            .field("max_angular", &self.max_angular)
            .field("scaling", &self.scaling)
            .finish_non_exhaustive()
    }
}

impl Harmonics {
    fn new(max_angular: usize, scaling: Scaling) -> Harmonics {
        Harmonics {
            max_angular,
            scaling,
            cache: ThreadLocal::new(),
        }
    }

    /// Compute the harmonics of all degrees for a single edge, and optionally
    /// their gradients with respect to the vector
    fn compute_edge(&self, vector: Vector3D, mut values: ArrayViewMut1<f64>, mut gradients: Option<ArrayViewMut2<f64>>) {
        let norm = vector.norm();
        let direction = if norm == 0.0 {
            Vector3D::new(0.0, 0.0, 1.0)
        } else {
            vector / norm
        };

        let mut harmonics = self.cache.get_or(|| {
            RefCell::new(math::SphericalHarmonics::new(self.max_angular))
        }).borrow_mut();
        harmonics.compute(direction, values.view_mut(), gradients.as_mut().map(|g| g.view_mut()));

        match self.scaling {
            Scaling::Unit => {
                if let Some(ref mut gradients) = gradients {
                    if norm == 0.0 {
                        gradients.fill(0.0);
                    } else {
                        *gradients /= norm;
                    }
                }
            }
            Scaling::Solid => {
                if let Some(ref mut gradients) = gradients {
                    // d/dr_α (r^l Y) = r^{l - 1} (l r̂_α Y + r ∂_α Y)
                    gradients.column_mut(0).fill(0.0);
                    for l in 1..=self.max_angular {
                        let r_l_minus_1 = norm.powi(l as i32 - 1);
                        for lm in (l * l)..lm_size(l) {
                            for alpha in 0..3 {
                                gradients[[alpha, lm]] = r_l_minus_1 * (
                                    l as f64 * direction[alpha] * values[lm] + gradients[[alpha, lm]]
                                );
                            }
                        }
                    }
                }

                for l in 1..=self.max_angular {
                    let r_l = norm.powi(l as i32);
                    values.slice_mut(s![(l * l)..lm_size(l)]).map_inplace(|v| *v *= r_l);
                }
            }
        }
    }

    fn check_max_angular(&self, max_angular: usize) {
        assert!(
            max_angular <= self.max_angular,
            "can not compute harmonics up to l={}, this embedding was created with max_angular={}",
            max_angular, self.max_angular
        );
    }

    fn warn_zero_vectors(&self, vectors: &[Vector3D]) {
        if self.scaling == Scaling::Solid {
            // solid harmonics are well defined for r = 0
            return;
        }

        let n_zero = vectors.iter().filter(|v| v.norm2() == 0.0).count();
        if n_zero != 0 {
            warn!(
                "found {} zero-length displacement vectors, using the +z direction \
                and zero gradients for them", n_zero
            );
        }
    }

    fn compute(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array2<f64>> {
        self.check_max_angular(max_angular);
        self.warn_zero_vectors(vectors);

        let mut values = Array2::zeros((vectors.len(), lm_size(self.max_angular)));
        Zip::from(values.rows_mut())
            .and(ArrayView1::from(vectors))
            .par_for_each(|values, &vector| self.compute_edge(vector, values, None));

        return (0..=max_angular).map(|l| {
            values.slice(s![.., (l * l)..lm_size(l)]).to_owned()
        }).collect();
    }

    fn compute_gradient(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array3<f64>> {
        self.check_max_angular(max_angular);
        self.warn_zero_vectors(vectors);

        let size = lm_size(self.max_angular);
        let mut values = Array2::zeros((vectors.len(), size));
        let mut gradients = Array3::zeros((vectors.len(), 3, size));
        Zip::from(values.rows_mut())
            .and(gradients.axis_iter_mut(Axis(0)))
            .and(ArrayView1::from(vectors))
            .par_for_each(|values, gradients, &vector| self.compute_edge(vector, values, Some(gradients)));

        return (0..=max_angular).map(|l| {
            gradients.slice(s![.., .., (l * l)..lm_size(l)]).to_owned()
        }).collect();
    }
}

/// Real spherical harmonics `Y_l^m(r / |r|)` of the edge direction, in the
/// real form without Condon-Shortley phase, and with `m` going from `-l` to
/// `l`. With this convention, `l = 1` harmonics are proportional to `(y, z,
/// x)`.
///
/// Zero-length vectors use the `+z` direction, with zero gradients.
#[derive(Debug)]
pub struct SphericalHarmonics {
    harmonics: Harmonics,
}

impl SphericalHarmonics {
    /// Create real spherical harmonics up to `max_angular`
    pub fn new(parameters: SphericalHarmonicsParameters) -> SphericalHarmonics {
        SphericalHarmonics {
            harmonics: Harmonics::new(parameters.max_angular, Scaling::Unit),
        }
    }
}

impl AngularEmbedding for SphericalHarmonics {
    fn max_angular(&self) -> usize {
        self.harmonics.max_angular
    }

    #[time_graph::instrument(name = "SphericalHarmonics::compute")]
    fn compute(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array2<f64>> {
        self.harmonics.compute(vectors, max_angular)
    }

    #[time_graph::instrument(name = "SphericalHarmonics::compute_gradient")]
    fn compute_gradient(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array3<f64>> {
        self.harmonics.compute_gradient(vectors, max_angular)
    }
}

/// Real solid harmonics `|r|^l Y_l^m(r / |r|)`, using the same conventions as
/// [`SphericalHarmonics`]. These are homogeneous polynomials in the cartesian
/// components of the vector.
#[derive(Debug)]
pub struct SolidHarmonics {
    harmonics: Harmonics,
}

impl SolidHarmonics {
    /// Create solid harmonics up to `max_angular`
    pub fn new(parameters: SolidHarmonicsParameters) -> SolidHarmonics {
        SolidHarmonics {
            harmonics: Harmonics::new(parameters.max_angular, Scaling::Solid),
        }
    }
}

impl AngularEmbedding for SolidHarmonics {
    fn max_angular(&self) -> usize {
        self.harmonics.max_angular
    }

    #[time_graph::instrument(name = "SolidHarmonics::compute")]
    fn compute(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array2<f64>> {
        self.harmonics.compute(vectors, max_angular)
    }

    #[time_graph::instrument(name = "SolidHarmonics::compute_gradient")]
    fn compute_gradient(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array3<f64>> {
        self.harmonics.compute_gradient(vectors, max_angular)
    }
}
