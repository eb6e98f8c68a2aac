use ndarray::Array1;

use crate::{Error, Vector3D};
use crate::errors::check_size;

/// A batch of directed edges (center `i`, neighbor `j`) between atoms, with
/// the displacement vector `r_j - r_i` and the species of the neighbor.
///
/// A batch can contain edges coming from multiple structures, in which case
/// atoms from different structures must use different indexes. Edges do not
/// need to be sorted by center.
#[derive(Debug, Clone, PartialEq)]
pub struct Edges {
    centers: Vec<usize>,
    neighbors: Vec<usize>,
    vectors: Vec<Vector3D>,
    species: Vec<i32>,
    n_atoms: usize,
}

impl Edges {
    /// Create a new batch of edges, checking that all per-edge arrays have
    /// the same length and that all atom indexes are smaller than `n_atoms`.
    pub fn new(
        centers: Vec<usize>,
        neighbors: Vec<usize>,
        vectors: Vec<Vector3D>,
        species: Vec<i32>,
        n_atoms: usize,
    ) -> Result<Edges, Error> {
        let n_edges = centers.len();
        check_size("edges", "neighbor", n_edges, neighbors.len())?;
        check_size("edges", "vector", n_edges, vectors.len())?;
        check_size("edges", "species", n_edges, species.len())?;

        for (&center, &neighbor) in centers.iter().zip(&neighbors) {
            if center >= n_atoms || neighbor >= n_atoms {
                return Err(Error::InvalidParameter(format!(
                    "edge between atoms {} and {} is out of bounds for a batch with {} atoms",
                    center, neighbor, n_atoms
                )));
            }
        }

        if let Some(vector) = vectors.iter().find(|v| !(v[0].is_finite() && v[1].is_finite() && v[2].is_finite())) {
            return Err(Error::InvalidParameter(format!(
                "got a non-finite displacement vector: {:?}", vector
            )));
        }

        return Ok(Edges { centers, neighbors, vectors, species, n_atoms });
    }

    /// Create the full neighbor list of a non-periodic structure, containing
    /// both `(i, j)` and `(j, i)` for all pairs of distinct atoms closer than
    /// `cutoff`. Edges are sorted by center, then by neighbor.
    pub fn from_positions(positions: &[Vector3D], species: &[i32], cutoff: f64) -> Result<Edges, Error> {
        check_size("positions", "species", positions.len(), species.len())?;
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "expected a positive cutoff to build the neighbor list, got {}", cutoff
            )));
        }

        let cutoff_2 = cutoff * cutoff;
        let mut centers = Vec::new();
        let mut neighbors = Vec::new();
        let mut vectors = Vec::new();
        let mut neighbor_species = Vec::new();
        for (i, &position_i) in positions.iter().enumerate() {
            for (j, &position_j) in positions.iter().enumerate() {
                if i == j {
                    continue;
                }

                let vector = position_j - position_i;
                if vector.norm2() < cutoff_2 {
                    centers.push(i);
                    neighbors.push(j);
                    vectors.push(vector);
                    neighbor_species.push(species[j]);
                }
            }
        }

        return Edges::new(centers, neighbors, vectors, neighbor_species, positions.len());
    }

    /// Merge multiple batches into a single one. Atom indexes of each batch
    /// are shifted by the total number of atoms in the preceding batches.
    pub fn concatenate(batches: &[Edges]) -> Edges {
        let mut result = Edges {
            centers: Vec::new(),
            neighbors: Vec::new(),
            vectors: Vec::new(),
            species: Vec::new(),
            n_atoms: 0,
        };

        for batch in batches {
            let offset = result.n_atoms;
            result.centers.extend(batch.centers.iter().map(|i| i + offset));
            result.neighbors.extend(batch.neighbors.iter().map(|j| j + offset));
            result.vectors.extend_from_slice(&batch.vectors);
            result.species.extend_from_slice(&batch.species);
            result.n_atoms += batch.n_atoms;
        }

        return result;
    }

    /// Get the number of edges in this batch
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Is this batch free of edges?
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Get the total number of atoms in this batch, including atoms without
    /// any edge
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    /// Index of the center atom of every edge
    pub fn centers(&self) -> &[usize] {
        &self.centers
    }

    /// Index of the neighbor atom of every edge
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Displacement vector from the center to the neighbor for every edge
    pub fn vectors(&self) -> &[Vector3D] {
        &self.vectors
    }

    /// Species of the neighbor atom for every edge
    pub fn species(&self) -> &[i32] {
        &self.species
    }

    /// Length of the displacement vector for every edge
    pub fn distances(&self) -> Array1<f64> {
        self.vectors.iter().map(|v| v.norm()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> (Vec<Vector3D>, Vec<i32>) {
        let positions = vec![
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(0.0, 0.75, -0.5),
            Vector3D::new(0.0, -0.75, -0.5),
        ];
        (positions, vec![8, 1, 1])
    }

    #[test]
    fn neighbor_list() {
        let (positions, species) = water();

        let edges = Edges::from_positions(&positions, &species, 1.0).unwrap();
        assert_eq!(edges.n_atoms(), 3);
        assert_eq!(edges.centers(), [0, 0, 1, 2]);
        assert_eq!(edges.neighbors(), [1, 2, 0, 0]);
        assert_eq!(edges.species(), [1, 1, 8, 8]);
        assert_eq!(edges.vectors()[2], Vector3D::new(0.0, -0.75, 0.5));

        let edges = Edges::from_positions(&positions, &species, 2.0).unwrap();
        assert_eq!(edges.len(), 6);

        let edges = Edges::from_positions(&positions, &species, 0.5).unwrap();
        assert!(edges.is_empty());
        assert_eq!(edges.n_atoms(), 3);
    }

    #[test]
    fn concatenate() {
        let (positions, species) = water();
        let edges = Edges::from_positions(&positions, &species, 1.0).unwrap();

        let batch = Edges::concatenate(&[edges.clone(), edges]);
        assert_eq!(batch.n_atoms(), 6);
        assert_eq!(batch.len(), 8);
        assert_eq!(batch.centers(), [0, 0, 1, 2, 3, 3, 4, 5]);
        assert_eq!(batch.neighbors(), [1, 2, 0, 0, 4, 5, 3, 3]);
    }

    #[test]
    fn distances() {
        let edges = Edges::new(
            vec![0, 1],
            vec![1, 0],
            vec![Vector3D::new(3.0, 0.0, 4.0), Vector3D::new(-3.0, 0.0, -4.0)],
            vec![6, 6],
            2,
        ).unwrap();

        assert_eq!(edges.distances(), ndarray::arr1(&[5.0, 5.0]));
    }

    mod bad {
        use super::super::Edges;
        use crate::Vector3D;

        #[test]
        fn out_of_bounds() {
            let error = Edges::new(vec![0], vec![3], vec![Vector3D::new(1.0, 0.0, 0.0)], vec![1], 2).unwrap_err();
            assert_eq!(
                error.to_string(),
                "invalid parameter: edge between atoms 0 and 3 is out of bounds for a batch with 2 atoms"
            );
        }

        #[test]
        fn inconsistent_sizes() {
            let error = Edges::new(vec![0, 1], vec![1, 0], vec![Vector3D::new(1.0, 0.0, 0.0)], vec![1, 1], 2).unwrap_err();
            assert_eq!(
                error.to_string(),
                "shape mismatch: edges returned 1 entries along the vector axis, expected 2"
            );
        }

        #[test]
        fn non_finite() {
            let error = Edges::new(vec![0], vec![1], vec![Vector3D::new(f64::NAN, 0.0, 0.0)], vec![1], 2).unwrap_err();
            assert!(error.to_string().contains("non-finite displacement vector"));
        }
    }
}
