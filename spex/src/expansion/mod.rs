//! The spherical expansion, combining per-edge embeddings into per-atom
//! equivariant features.

use log::{debug, info, warn};
use ndarray::{Array1, Array2, Array3, Axis, Zip};
use rayon::prelude::*;

use crate::{Edges, Error, RaggedTensors};
use crate::errors::check_size;
use crate::embeddings::{AngularEmbedding, CutoffFunction, RadialEmbedding, SpeciesEmbedding};
use crate::embeddings::validate_cutoff;

mod contributions;
pub use self::contributions::{EdgeEmbeddingsView, ContributionGradients};
pub use self::contributions::{edge_contributions, edge_contributions_backward};

mod reduction;
pub use self::reduction::CenterPartition;

mod state;
pub use self::state::ExpansionState;

/// Per-edge embeddings for a batch, computed once per call and shared by all
/// degrees
struct EdgeEmbeddings {
    angular: Vec<Array2<f64>>,
    radial: Array2<f64>,
    species: Array2<f64>,
    cutoff: Array1<f64>,
}

impl EdgeEmbeddings {
    fn view(&self, l: usize) -> EdgeEmbeddingsView<'_> {
        EdgeEmbeddingsView {
            angular: self.angular[l].view(),
            radial: self.radial.view(),
            species: self.species.view(),
            cutoff: self.cutoff.view(),
        }
    }
}

/// Derivatives of the per-edge embeddings with respect to the edge vector
/// (angular) or the edge length (radial and cutoff)
struct EdgeEmbeddingsDerivatives {
    angular: Vec<Array3<f64>>,
    radial: Array2<f64>,
    cutoff: Array1<f64>,
}

/// Gradients of some loss with respect to the inputs of a
/// [`SphericalExpansion`], as computed by [`SphericalExpansion::backward`]
#[derive(Debug, Clone)]
pub struct ExpansionGradients {
    /// Gradient with respect to the displacement vector of every edge, with
    /// shape `[edge, 3]`
    pub displacements: Array2<f64>,
    /// Gradient with respect to the learnable parameters of the radial
    /// embedding, if it has any
    pub radial_parameters: Option<Array2<f64>>,
    /// Gradient with respect to the learnable parameters of the species
    /// embedding, if it has any
    pub species_parameters: Option<Array2<f64>>,
}

/// Spherical expansion of the neighbor density around each atom.
///
/// For every degree `l` up to `max_angular`, the expansion of atom `i` is
///
/// `O_l[i, m, n, c] = Σ_{edges i -> j} A_l[m](r_ij) R[n](|r_ij|) C[c](s_j) w(|r_ij|)`
///
/// where `A` is the angular embedding, `R` the radial embedding, `C` the
/// species embedding and `w` the cutoff function. The result is a
/// [`RaggedTensors`], with one entry of shape `[atom, 2l + 1, n_radial,
/// n_species]` for every degree.
#[derive(Debug)]
pub struct SphericalExpansion {
    cutoff: f64,
    max_angular: usize,
    radial: Box<dyn RadialEmbedding>,
    angular: Box<dyn AngularEmbedding>,
    species: Box<dyn SpeciesEmbedding>,
    cutoff_function: Box<dyn CutoffFunction>,
}

impl SphericalExpansion {
    /// Create a new spherical expansion from the given embeddings, checking
    /// that they are consistent with each other.
    #[allow(clippy::float_cmp)]
    pub fn new(
        cutoff: f64,
        max_angular: usize,
        radial: Box<dyn RadialEmbedding>,
        angular: Box<dyn AngularEmbedding>,
        species: Box<dyn SpeciesEmbedding>,
        cutoff_function: Box<dyn CutoffFunction>,
    ) -> Result<SphericalExpansion, Error> {
        validate_cutoff("spherical expansion", cutoff)?;

        if angular.max_angular() < max_angular {
            return Err(Error::ConfigurationMismatch(format!(
                "the angular embedding can only compute up to l={}, but the expansion requires max_angular={}",
                angular.max_angular(), max_angular
            )));
        }

        if radial.cutoff() != cutoff {
            return Err(Error::ConfigurationMismatch(format!(
                "the radial embedding cutoff ({}) is different from the expansion cutoff ({})",
                radial.cutoff(), cutoff
            )));
        }

        if cutoff_function.cutoff() != cutoff {
            return Err(Error::ConfigurationMismatch(format!(
                "the cutoff function cutoff ({}) is different from the expansion cutoff ({})",
                cutoff_function.cutoff(), cutoff
            )));
        }

        if radial.size() == 0 {
            return Err(Error::InvalidParameter(
                "the radial embedding must have at least one channel".into()
            ));
        }

        if species.size() == 0 {
            return Err(Error::InvalidParameter(
                "the species embedding must have at least one channel".into()
            ));
        }

        if !cutoff_function.is_smooth() {
            warn!(
                "the cutoff function is not smooth at the cutoff, the expansion \
                and its gradients will be discontinuous when atoms cross the cutoff"
            );
        }

        info!(
            "created spherical expansion with max_angular={}, {} radial and {} species channels, cutoff={}",
            max_angular, radial.size(), species.size(), cutoff
        );

        return Ok(SphericalExpansion {
            cutoff,
            max_angular,
            radial,
            angular,
            species,
            cutoff_function,
        });
    }

    /// Create a new spherical expansion from its JSON description, using the
    /// default [`Registry`](crate::Registry) to create the embeddings.
    pub fn from_json(json: &str) -> Result<SphericalExpansion, Error> {
        crate::registry::DEFAULT_REGISTRY.build(json)
    }

    /// Get the cutoff radius of this expansion
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Get the maximal angular degree of this expansion
    pub fn max_angular(&self) -> usize {
        self.max_angular
    }

    /// Get the number of radial channels
    pub fn n_radial(&self) -> usize {
        self.radial.size()
    }

    /// Get the number of species channels
    pub fn n_species(&self) -> usize {
        self.species.size()
    }

    /// Get the radial embedding of this expansion
    pub fn radial(&self) -> &dyn RadialEmbedding {
        &*self.radial
    }

    /// Get mutable access to the radial embedding, e.g. to update its parameters
    pub fn radial_mut(&mut self) -> &mut dyn RadialEmbedding {
        &mut *self.radial
    }

    /// Get the angular embedding of this expansion
    pub fn angular(&self) -> &dyn AngularEmbedding {
        &*self.angular
    }

    /// Get the species embedding of this expansion
    pub fn species(&self) -> &dyn SpeciesEmbedding {
        &*self.species
    }

    /// Get mutable access to the species embedding, e.g. to update its parameters
    pub fn species_mut(&mut self) -> &mut dyn SpeciesEmbedding {
        &mut *self.species
    }

    /// Get the cutoff function of this expansion
    pub fn cutoff_function(&self) -> &dyn CutoffFunction {
        &*self.cutoff_function
    }

    /// Evaluate all embeddings on the edges, and check that their output has
    /// the expected shape
    fn embed(&self, edges: &Edges) -> Result<EdgeEmbeddings, Error> {
        let distances = edges.distances();
        let ((angular, radial), (species, cutoff)) = rayon::join(
            || rayon::join(
                || self.angular.compute(edges.vectors(), self.max_angular),
                || self.radial.compute(distances.view()),
            ),
            || rayon::join(
                || self.species.compute(edges.species()),
                || self.cutoff_function.compute(distances.view()),
            ),
        );
        let species = species?;

        let n_edges = edges.len();
        check_size("angular embedding", "degree", self.max_angular + 1, angular.len())?;
        for (l, angular) in angular.iter().enumerate() {
            check_size("angular embedding", "edge", n_edges, angular.nrows())?;
            check_size("angular embedding", "orientation", 2 * l + 1, angular.ncols())?;
        }

        check_size("radial embedding", "edge", n_edges, radial.nrows())?;
        check_size("radial embedding", "radial channel", self.radial.size(), radial.ncols())?;

        check_size("species embedding", "edge", n_edges, species.nrows())?;
        check_size("species embedding", "species channel", self.species.size(), species.ncols())?;

        check_size("cutoff function", "edge", n_edges, cutoff.len())?;

        return Ok(EdgeEmbeddings { angular, radial, species, cutoff });
    }

    /// Evaluate the derivatives of the embeddings on the edges, and check
    /// that their output has the expected shape
    fn embed_derivatives(&self, edges: &Edges) -> Result<EdgeEmbeddingsDerivatives, Error> {
        let distances = edges.distances();
        let (angular, (radial, cutoff)) = rayon::join(
            || self.angular.compute_gradient(edges.vectors(), self.max_angular),
            || rayon::join(
                || self.radial.compute_gradient(distances.view()),
                || self.cutoff_function.compute_gradient(distances.view()),
            ),
        );

        let n_edges = edges.len();
        check_size("angular embedding gradient", "degree", self.max_angular + 1, angular.len())?;
        for (l, angular) in angular.iter().enumerate() {
            let shape = angular.shape();
            check_size("angular embedding gradient", "edge", n_edges, shape[0])?;
            check_size("angular embedding gradient", "cartesian", 3, shape[1])?;
            check_size("angular embedding gradient", "orientation", 2 * l + 1, shape[2])?;
        }

        check_size("radial embedding gradient", "edge", n_edges, radial.nrows())?;
        check_size("radial embedding gradient", "radial channel", self.radial.size(), radial.ncols())?;

        check_size("cutoff function gradient", "edge", n_edges, cutoff.len())?;

        return Ok(EdgeEmbeddingsDerivatives { angular, radial, cutoff });
    }

    /// Compute the spherical expansion for all atoms in the given batch of
    /// `edges`. Atoms without any edge get an expansion equal to zero.
    #[time_graph::instrument(name = "SphericalExpansion::compute")]
    pub fn compute(&self, edges: &Edges) -> Result<RaggedTensors, Error> {
        debug!("computing spherical expansion for {} edges around {} atoms", edges.len(), edges.n_atoms());

        let embeddings = self.embed(edges)?;
        let partition = CenterPartition::new(edges.centers(), edges.n_atoms())?;

        let blocks = (0..=self.max_angular).into_par_iter().map(|l| {
            let contributions = edge_contributions(embeddings.view(l))?;
            partition.scatter_add(contributions.view())
        }).collect::<Result<Vec<_>, Error>>()?;

        return RaggedTensors::from_blocks(blocks);
    }

    /// Check that `output_gradient` has the same shape as the output of
    /// [`SphericalExpansion::compute`] for the given `edges`
    fn check_output_gradient(&self, edges: &Edges, output_gradient: &RaggedTensors) -> Result<(), Error> {
        check_size("output gradient", "degree", self.max_angular + 1, output_gradient.len())?;
        check_size("output gradient", "atom", edges.n_atoms(), output_gradient.n_atoms())?;
        check_size("output gradient", "radial channel", self.radial.size(), output_gradient.n_radial())?;
        check_size("output gradient", "species channel", self.species.size(), output_gradient.n_species())?;
        return Ok(());
    }

    /// Compute the gradient of some loss with respect to the displacement
    /// vectors of the `edges` and to the learnable parameters of the
    /// embeddings, given the gradient of the same loss with respect to the
    /// output of `compute(edges)`.
    #[allow(clippy::float_cmp)]
    #[time_graph::instrument(name = "SphericalExpansion::backward")]
    pub fn backward(&self, edges: &Edges, output_gradient: &RaggedTensors) -> Result<ExpansionGradients, Error> {
        self.check_output_gradient(edges, output_gradient)?;

        let (embeddings, derivatives) = rayon::join(
            || self.embed(edges),
            || self.embed_derivatives(edges),
        );
        let embeddings = embeddings?;
        let derivatives = derivatives?;

        let partition = CenterPartition::new(edges.centers(), edges.n_atoms())?;
        let per_degree = (0..=self.max_angular).into_par_iter().map(|l| {
            let contributions_gradient = partition.gather(output_gradient.block(l))?;
            edge_contributions_backward(embeddings.view(l), contributions_gradient.view())
        }).collect::<Result<Vec<_>, Error>>()?;

        // the radial, species and cutoff embeddings are shared by all degrees
        let mut d_radial = Array2::zeros(embeddings.radial.raw_dim());
        let mut d_species = Array2::zeros(embeddings.species.raw_dim());
        let mut d_cutoff = Array1::zeros(edges.len());
        for gradients in &per_degree {
            d_radial += &gradients.radial;
            d_species += &gradients.species;
            d_cutoff += &gradients.cutoff;
        }

        // chain rule through the distance for radial and cutoff embeddings
        let d_distances = (&d_radial * &derivatives.radial).sum_axis(Axis(1)) + &d_cutoff * &derivatives.cutoff;

        let mut displacements = Array2::zeros((edges.len(), 3));
        Zip::indexed(displacements.rows_mut())
            .and(&d_distances)
            .par_for_each(|e, mut displacement, &d_distance| {
                let vector = edges.vectors()[e];
                let distance = vector.norm();
                if distance != 0.0 {
                    for alpha in 0..3 {
                        displacement[alpha] = d_distance * vector[alpha] / distance;
                    }
                }

                for (gradients, angular_derivatives) in per_degree.iter().zip(&derivatives.angular) {
                    let d_angular = gradients.angular.row(e);
                    let angular_derivatives = angular_derivatives.index_axis(Axis(0), e);
                    for alpha in 0..3 {
                        displacement[alpha] += angular_derivatives.row(alpha).dot(&d_angular);
                    }
                }
            });

        let distances = edges.distances();
        let radial_parameters = self.radial.parameters_gradient(distances.view(), d_radial.view());
        let species_parameters = self.species.parameters_gradient(edges.species(), d_species.view())?;

        return Ok(ExpansionGradients {
            displacements,
            radial_parameters,
            species_parameters,
        });
    }
}
