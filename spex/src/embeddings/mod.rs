//! Embedding strategies used by the spherical expansion.
//!
//! The expansion combines four independent per-edge embeddings, each defined
//! by a trait in this module: [`RadialEmbedding`] (function of the distance),
//! [`AngularEmbedding`] (function of the displacement vector),
//! [`SpeciesEmbedding`] (function of the neighbor species) and
//! [`CutoffFunction`] (function of the distance, going to zero at the cutoff).
//! Implementations provided by this crate live in the sub-modules, and users
//! can provide their own implementation of any of these traits.

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayViewMut2};

use crate::{Error, Vector3D};

pub mod radial;
pub mod angular;
pub mod species;
pub mod cutoff;

/// Embedding of the edge length into `size()` radial channels.
pub trait RadialEmbedding: Send + Sync + std::fmt::Debug {
    /// Get the cutoff radius for which this radial embedding was defined
    fn cutoff(&self) -> f64;

    /// Get the number of radial channels
    fn size(&self) -> usize;

    /// Evaluate the embedding for all `distances`, returning an array of
    /// shape `[distances.len(), self.size()]`
    fn compute(&self, distances: ArrayView1<f64>) -> Array2<f64>;

    /// Evaluate the derivative of the embedding with respect to the distance,
    /// returning an array of shape `[distances.len(), self.size()]`
    fn compute_gradient(&self, distances: ArrayView1<f64>) -> Array2<f64>;

    /// Get the learnable parameters of this embedding, if any
    fn parameters(&self) -> Option<ArrayView2<'_, f64>> {
        None
    }

    /// Get mutable access to the learnable parameters of this embedding, if
    /// any
    fn parameters_mut(&mut self) -> Option<ArrayViewMut2<'_, f64>> {
        None
    }

    /// Compute the gradient of some loss with respect to the learnable
    /// parameters, given the gradient of the same loss with respect to the
    /// output of `compute(distances)`. Returns `None` if there are no
    /// learnable parameters.
    fn parameters_gradient(&self, distances: ArrayView1<f64>, output_gradient: ArrayView2<f64>) -> Option<Array2<f64>> {
        let _ = (distances, output_gradient);
        None
    }
}

/// Embedding of the edge direction into irreducible representations of the
/// rotation group, one for each angular degree `l`.
pub trait AngularEmbedding: Send + Sync + std::fmt::Debug {
    /// Get the maximal angular degree this embedding can compute
    fn max_angular(&self) -> usize;

    /// Evaluate the embedding for all `vectors` and all degrees up to
    /// `max_angular`. Entry `l` of the result has shape `[vectors.len(), 2l +
    /// 1]`.
    fn compute(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array2<f64>>;

    /// Evaluate the gradients of the embedding with respect to the cartesian
    /// components of the vectors. Entry `l` of the result has shape
    /// `[vectors.len(), 3, 2l + 1]`.
    fn compute_gradient(&self, vectors: &[Vector3D], max_angular: usize) -> Vec<Array3<f64>>;
}

/// Embedding of the neighbor species into `size()` channels.
pub trait SpeciesEmbedding: Send + Sync + std::fmt::Debug {
    /// Get the number of species channels
    fn size(&self) -> usize;

    /// Evaluate the embedding for all `species`, returning an array of shape
    /// `[species.len(), self.size()]`. This fails if some of the species are
    /// not known to this embedding.
    fn compute(&self, species: &[i32]) -> Result<Array2<f64>, Error>;

    /// Get the learnable parameters of this embedding, if any
    fn parameters(&self) -> Option<ArrayView2<'_, f64>> {
        None
    }

    /// Get mutable access to the learnable parameters of this embedding, if
    /// any
    fn parameters_mut(&mut self) -> Option<ArrayViewMut2<'_, f64>> {
        None
    }

    /// Compute the gradient of some loss with respect to the learnable
    /// parameters, given the gradient of the same loss with respect to the
    /// output of `compute(species)`. Returns `None` if there are no learnable
    /// parameters.
    fn parameters_gradient(&self, species: &[i32], output_gradient: ArrayView2<f64>) -> Result<Option<Array2<f64>>, Error> {
        let _ = (species, output_gradient);
        Ok(None)
    }
}

/// Smooth (or not) weighting of the edges, going to zero at the cutoff.
pub trait CutoffFunction: Send + Sync + std::fmt::Debug {
    /// Get the cutoff radius
    fn cutoff(&self) -> f64;

    /// Evaluate the cutoff function for all `distances`. The result must be in
    /// `[0, 1]`, and exactly 0 for distances larger or equal to the cutoff.
    fn compute(&self, distances: ArrayView1<f64>) -> Array1<f64>;

    /// Evaluate the derivative of the cutoff function with respect to the
    /// distance
    fn compute_gradient(&self, distances: ArrayView1<f64>) -> Array1<f64>;

    /// Is this cutoff function continuous and differentiable at the cutoff?
    fn is_smooth(&self) -> bool {
        true
    }
}

/// Check that a cutoff radius is positive and finite
pub(crate) fn validate_cutoff(name: &str, cutoff: f64) -> Result<(), Error> {
    if !(cutoff > 0.0 && cutoff.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "expected a positive cutoff for {}, got {}", name, cutoff
        )));
    }
    return Ok(());
}
