use ndarray::{Array1, Array2, Array4, ArrayView1, ArrayView2, ArrayView4, Axis, Zip};

use crate::Error;
use crate::errors::check_size;

/// Per-edge embeddings entering the contribution of a single degree `l`
#[derive(Debug, Clone, Copy)]
pub struct EdgeEmbeddingsView<'a> {
    /// Angular embedding, `[edge, 2l + 1]`
    pub angular: ArrayView2<'a, f64>,
    /// Radial embedding, `[edge, n_radial]`
    pub radial: ArrayView2<'a, f64>,
    /// Species embedding, `[edge, n_species]`
    pub species: ArrayView2<'a, f64>,
    /// Cutoff function, `[edge]`
    pub cutoff: ArrayView1<'a, f64>,
}

impl<'a> EdgeEmbeddingsView<'a> {
    fn check_edges(&self) -> Result<usize, Error> {
        let n_edges = self.angular.nrows();
        check_size("edge contributions", "radial edge", n_edges, self.radial.nrows())?;
        check_size("edge contributions", "species edge", n_edges, self.species.nrows())?;
        check_size("edge contributions", "cutoff edge", n_edges, self.cutoff.len())?;
        return Ok(n_edges);
    }
}

/// Compute the contribution of every edge to the expansion of degree `l`:
///
/// `T[e, m, n, c] = A[e, m] R[e, n] C[e, c] w[e]`
///
/// Edges beyond the cutoff are not filtered out, the cutoff function is
/// expected to give them a zero weight.
#[time_graph::instrument(name = "edge_contributions")]
pub fn edge_contributions(embeddings: EdgeEmbeddingsView<'_>) -> Result<Array4<f64>, Error> {
    let n_edges = embeddings.check_edges()?;
    let shape = (
        n_edges,
        embeddings.angular.ncols(),
        embeddings.radial.ncols(),
        embeddings.species.ncols(),
    );

    let mut contributions = Array4::zeros(shape);
    Zip::from(contributions.axis_iter_mut(Axis(0)))
        .and(embeddings.angular.rows())
        .and(embeddings.radial.rows())
        .and(embeddings.species.rows())
        .and(&embeddings.cutoff)
        .par_for_each(|mut contribution, angular, radial, species, &cutoff| {
            for (m, &a) in angular.iter().enumerate() {
                let a = a * cutoff;
                for (n, &r) in radial.iter().enumerate() {
                    let ar = a * r;
                    for (c, &s) in species.iter().enumerate() {
                        contribution[[m, n, c]] = ar * s;
                    }
                }
            }
        });

    return Ok(contributions);
}

/// Gradients of some loss with respect to the per-edge embeddings, obtained
/// from the gradient with respect to the edge contributions.
#[derive(Debug, Clone)]
pub struct ContributionGradients {
    /// `[edge, 2l + 1]`
    pub angular: Array2<f64>,
    /// `[edge, n_radial]`
    pub radial: Array2<f64>,
    /// `[edge, n_species]`
    pub species: Array2<f64>,
    /// `[edge]`
    pub cutoff: Array1<f64>,
}

/// Backward of [`edge_contributions`]: given the gradient of some loss with
/// respect to `T[e, m, n, c]`, compute the gradient with respect to each one
/// of the embeddings using the product rule.
pub fn edge_contributions_backward(
    embeddings: EdgeEmbeddingsView<'_>,
    contributions_gradient: ArrayView4<f64>,
) -> Result<ContributionGradients, Error> {
    let n_edges = embeddings.check_edges()?;
    let shape = contributions_gradient.shape();
    check_size("contributions gradient", "edge", n_edges, shape[0])?;
    check_size("contributions gradient", "orientation", embeddings.angular.ncols(), shape[1])?;
    check_size("contributions gradient", "radial", embeddings.radial.ncols(), shape[2])?;
    check_size("contributions gradient", "species", embeddings.species.ncols(), shape[3])?;

    let mut gradients = ContributionGradients {
        angular: Array2::zeros(embeddings.angular.raw_dim()),
        radial: Array2::zeros(embeddings.radial.raw_dim()),
        species: Array2::zeros(embeddings.species.raw_dim()),
        cutoff: Array1::zeros(n_edges),
    };

    Zip::indexed(gradients.angular.rows_mut())
        .and(gradients.radial.rows_mut())
        .and(gradients.species.rows_mut())
        .and(&mut gradients.cutoff)
        .par_for_each(|e, mut d_angular, mut d_radial, mut d_species, d_cutoff| {
            let angular = embeddings.angular.row(e);
            let radial = embeddings.radial.row(e);
            let species = embeddings.species.row(e);
            let cutoff = embeddings.cutoff[e];
            let gradient = contributions_gradient.index_axis(Axis(0), e);

            let mut sum = 0.0;
            for (m, &a) in angular.iter().enumerate() {
                for (n, &r) in radial.iter().enumerate() {
                    for (c, &s) in species.iter().enumerate() {
                        let g = gradient[[m, n, c]];
                        d_angular[m] += g * r * s * cutoff;
                        d_radial[n] += g * a * s * cutoff;
                        d_species[c] += g * a * r * cutoff;
                        sum += g * a * r * s;
                    }
                }
            }
            *d_cutoff = sum;
        });

    return Ok(gradients);
}
