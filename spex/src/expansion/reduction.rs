use ndarray::{Array4, ArrayView4, Axis};
use ndarray::parallel::prelude::*;

use crate::Error;
use crate::errors::check_size;

/// Edges grouped by center atom, used to sum edge contributions onto the
/// atoms without concurrent writes to the same output row.
///
/// Edges of each center are kept in their original relative order, so the
/// summation order (and thus the result) does not depend on the number of
/// threads.
#[derive(Debug, Clone)]
pub struct CenterPartition {
    /// Edges of center `i` are `edges[offsets[i]..offsets[i + 1]]`
    offsets: Vec<usize>,
    edges: Vec<usize>,
}

impl CenterPartition {
    /// Group the edges with the given `centers` for a batch containing
    /// `n_atoms` atoms
    pub fn new(centers: &[usize], n_atoms: usize) -> Result<CenterPartition, Error> {
        let mut offsets = vec![0; n_atoms + 1];
        for &center in centers {
            if center >= n_atoms {
                return Err(Error::InvalidParameter(format!(
                    "center atom {} is out of bounds for a batch with {} atoms", center, n_atoms
                )));
            }
            offsets[center + 1] += 1;
        }

        for i in 0..n_atoms {
            offsets[i + 1] += offsets[i];
        }

        let mut next = offsets.clone();
        let mut edges = vec![0; centers.len()];
        for (edge, &center) in centers.iter().enumerate() {
            edges[next[center]] = edge;
            next[center] += 1;
        }

        return Ok(CenterPartition { offsets, edges });
    }

    /// Get the number of atoms in this partition
    pub fn n_atoms(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Get the total number of edges in this partition
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the edges with the given center atom
    pub fn edges_of(&self, center: usize) -> &[usize] {
        &self.edges[self.offsets[center]..self.offsets[center + 1]]
    }

    /// Sum the per-edge `contributions` (`[edge, m, n, c]`) onto their center
    /// atom, producing an array of shape `[atom, m, n, c]`. Atoms without
    /// edges get an all-zero row.
    #[time_graph::instrument(name = "CenterPartition::scatter_add")]
    pub fn scatter_add(&self, contributions: ArrayView4<f64>) -> Result<Array4<f64>, Error> {
        let shape = contributions.shape();
        check_size("edge contributions", "edge", self.n_edges(), shape[0])?;

        let mut output = Array4::zeros((self.n_atoms(), shape[1], shape[2], shape[3]));
        output.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(center, mut output)| {
                for &edge in self.edges_of(center) {
                    output += &contributions.index_axis(Axis(0), edge);
                }
            });

        return Ok(output);
    }

    /// Backward of [`CenterPartition::scatter_add`]: copy the gradient of
    /// each atom row (`[atom, m, n, c]`) to all the edges with this atom as
    /// center, producing an array of shape `[edge, m, n, c]`.
    pub fn gather(&self, output_gradient: ArrayView4<f64>) -> Result<Array4<f64>, Error> {
        let shape = output_gradient.shape();
        check_size("output gradient", "atom", self.n_atoms(), shape[0])?;

        let mut gradient = Array4::zeros((self.n_edges(), shape[1], shape[2], shape[3]));
        for center in 0..self.n_atoms() {
            let row = output_gradient.index_axis(Axis(0), center);
            for &edge in self.edges_of(center) {
                gradient.index_axis_mut(Axis(0), edge).assign(&row);
            }
        }

        return Ok(gradient);
    }
}
