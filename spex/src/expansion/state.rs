use ndarray::{Array2, ArrayViewMut2};

use crate::Error;
use crate::errors::check_size;
use super::SphericalExpansion;

/// Learnable parameters of a [`SphericalExpansion`], which can be saved and
/// loaded back in a new expansion created with the same configuration.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExpansionState {
    /// Parameters of the radial embedding, if any
    pub radial: Option<Array2<f64>>,
    /// Parameters of the species embedding, if any
    pub species: Option<Array2<f64>>,
}

/// Check that `parameters` (from the embedding) and `saved` (from the state)
/// are compatible
fn check_parameters(
    embedding: &'static str,
    parameters: Option<&ArrayViewMut2<'_, f64>>,
    saved: Option<&Array2<f64>>,
) -> Result<(), Error> {
    match (parameters, saved) {
        (None, None) => Ok(()),
        (Some(parameters), Some(saved)) => {
            check_size(embedding, "parameter row", parameters.nrows(), saved.nrows())?;
            check_size(embedding, "parameter column", parameters.ncols(), saved.ncols())?;
            Ok(())
        }
        (Some(_), None) => Err(Error::ConfigurationMismatch(format!(
            "the {} has learnable parameters, but the state does not contain any", embedding
        ))),
        (None, Some(_)) => Err(Error::ConfigurationMismatch(format!(
            "the state contains parameters for the {}, but it does not have learnable parameters", embedding
        ))),
    }
}

impl SphericalExpansion {
    /// Get a copy of the current learnable parameters of this expansion
    pub fn state(&self) -> ExpansionState {
        ExpansionState {
            radial: self.radial.parameters().map(|p| p.to_owned()),
            species: self.species.parameters().map(|p| p.to_owned()),
        }
    }

    /// Replace the learnable parameters of this expansion with the ones in
    /// `state`. Nothing is modified if the state does not match the
    /// embeddings of this expansion.
    pub fn load_state(&mut self, state: &ExpansionState) -> Result<(), Error> {
        let mut radial = self.radial.parameters_mut();
        let mut species = self.species.parameters_mut();
        check_parameters("radial embedding", radial.as_ref(), state.radial.as_ref())?;
        check_parameters("species embedding", species.as_ref(), state.species.as_ref())?;

        if let (Some(parameters), Some(saved)) = (&mut radial, &state.radial) {
            parameters.assign(saved);
        }

        if let (Some(parameters), Some(saved)) = (&mut species, &state.species) {
            parameters.assign(saved);
        }

        return Ok(());
    }
}
