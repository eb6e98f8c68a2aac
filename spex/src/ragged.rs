use ndarray::{Array4, ArrayView4, ArrayViewMut4};

use crate::Error;
use crate::errors::check_size;

/// Degree-indexed list of equivariant tensors.
///
/// Entry `l` (for `0 <= l <= max_angular`) is an array of shape `[atoms, 2l +
/// 1, n_radial, n_species]`. The number of atoms, radial channels and species
/// channels is the same for all degrees, only the width of the orientation
/// axis (`m`, from `-l` to `l`) changes with the degree.
#[derive(Debug, Clone, PartialEq)]
pub struct RaggedTensors {
    blocks: Vec<Array4<f64>>,
}

impl RaggedTensors {
    /// Create a new `RaggedTensors` filled with zeros
    pub fn zeros(n_atoms: usize, max_angular: usize, n_radial: usize, n_species: usize) -> RaggedTensors {
        let blocks = (0..=max_angular)
            .map(|l| Array4::zeros((n_atoms, 2 * l + 1, n_radial, n_species)))
            .collect();

        RaggedTensors { blocks }
    }

    /// Create a new `RaggedTensors` from per-degree arrays, checking that
    /// `blocks[l]` has `2l + 1` orientations and that all blocks agree on the
    /// number of atoms, radial channels and species channels.
    pub fn from_blocks(blocks: Vec<Array4<f64>>) -> Result<RaggedTensors, Error> {
        let first = match blocks.first() {
            Some(first) => first.shape().to_vec(),
            None => {
                return Err(Error::InvalidParameter(
                    "can not create ragged tensors without any degree".into()
                ));
            }
        };

        for (l, block) in blocks.iter().enumerate() {
            let shape = block.shape();
            check_size("ragged tensors", "atom", first[0], shape[0])?;
            check_size("ragged tensors", "orientation", 2 * l + 1, shape[1])?;
            check_size("ragged tensors", "radial", first[2], shape[2])?;
            check_size("ragged tensors", "species", first[3], shape[3])?;
        }

        return Ok(RaggedTensors { blocks });
    }

    /// Get the maximal angular degree stored in these tensors
    pub fn max_angular(&self) -> usize {
        self.blocks.len() - 1
    }

    /// Get the number of degrees (i.e. `max_angular + 1`)
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `RaggedTensors` always contain at least the `l = 0` block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of atoms
    pub fn n_atoms(&self) -> usize {
        self.blocks[0].shape()[0]
    }

    /// Get the number of radial channels
    pub fn n_radial(&self) -> usize {
        self.blocks[0].shape()[2]
    }

    /// Get the number of species channels
    pub fn n_species(&self) -> usize {
        self.blocks[0].shape()[3]
    }

    /// Get the block for degree `l`
    pub fn block(&self, l: usize) -> ArrayView4<'_, f64> {
        self.blocks[l].view()
    }

    /// Get mutable access to the block for degree `l`. The shape of the block
    /// can not be changed through this view.
    pub fn block_mut(&mut self, l: usize) -> ArrayViewMut4<'_, f64> {
        self.blocks[l].view_mut()
    }

    /// Iterate over all blocks, in increasing degree
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ArrayView4<'_, f64>> + '_ {
        self.blocks.iter().map(|block| block.view())
    }

    /// Get the underlying per-degree arrays
    pub fn into_blocks(self) -> Vec<Array4<f64>> {
        self.blocks
    }

    /// Check that `other` has the same shape as `self` for all degrees
    pub fn check_same_shape(&self, other: &RaggedTensors) -> Result<(), Error> {
        check_size("ragged tensors", "degree", self.len(), other.len())?;
        for (mine, theirs) in self.blocks.iter().zip(&other.blocks) {
            check_size("ragged tensors", "atom", mine.shape()[0], theirs.shape()[0])?;
            check_size("ragged tensors", "radial", mine.shape()[2], theirs.shape()[2])?;
            check_size("ragged tensors", "species", mine.shape()[3], theirs.shape()[3])?;
        }
        return Ok(());
    }

    /// Compute the sum over all degrees and all entries of the element-wise
    /// product of `self` and `other`.
    pub fn dot(&self, other: &RaggedTensors) -> Result<f64, Error> {
        self.check_same_shape(other)?;
        let dot = self.blocks.iter()
            .zip(&other.blocks)
            .map(|(mine, theirs)| (mine * theirs).sum())
            .sum::<f64>();
        return Ok(dot);
    }
}

impl std::ops::Index<usize> for RaggedTensors {
    type Output = Array4<f64>;
    fn index(&self, l: usize) -> &Array4<f64> {
        &self.blocks[l]
    }
}
