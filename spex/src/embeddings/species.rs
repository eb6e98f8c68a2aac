use indexmap::IndexSet;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

use crate::Error;
use crate::errors::check_size;
use super::SpeciesEmbedding;

/// Parameters for the one-hot species embedding
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OneHotParameters {
    /// List of all the species labels, defining the order of the channels
    pub species: Vec<i32>,
}

/// One channel per species, with a 1 in the channel corresponding to the
/// neighbor species and 0 everywhere else.
#[derive(Debug, Clone)]
pub struct OneHot {
    species: IndexSet<i32>,
}

impl OneHot {
    /// Create a one-hot embedding, the species labels must be unique
    pub fn new(parameters: OneHotParameters) -> Result<OneHot, Error> {
        if parameters.species.is_empty() {
            return Err(Error::InvalidParameter(
                "expected at least one species for one-hot species embedding".into()
            ));
        }

        let mut species = IndexSet::new();
        for &label in &parameters.species {
            if !species.insert(label) {
                return Err(Error::InvalidParameter(format!(
                    "species {} is present multiple times in one-hot species embedding", label
                )));
            }
        }

        return Ok(OneHot { species });
    }

    /// Get the list of species, in the order of the channels
    pub fn species(&self) -> Vec<i32> {
        self.species.iter().copied().collect()
    }

    /// Get the channel corresponding to all the given species labels
    fn channels(&self, species: &[i32]) -> Result<Vec<usize>, Error> {
        species.iter().map(|label| {
            self.species.get_index_of(label).ok_or_else(|| Error::InvalidParameter(format!(
                "unknown species {} in species embedding, expected one of {:?}",
                label, self.species()
            )))
        }).collect()
    }
}

impl SpeciesEmbedding for OneHot {
    fn size(&self) -> usize {
        self.species.len()
    }

    fn compute(&self, species: &[i32]) -> Result<Array2<f64>, Error> {
        let mut values = Array2::zeros((species.len(), self.size()));
        for (e, channel) in self.channels(species)?.into_iter().enumerate() {
            values[[e, channel]] = 1.0;
        }
        return Ok(values);
    }
}

/// Parameters for the alchemical species embedding
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AlchemicalParameters {
    /// List of all the species labels
    pub species: Vec<i32>,
    /// Number of pseudo-species channels
    pub pseudo_species: usize,
    /// Initial value of the weights, one row per species and one column per
    /// pseudo-species. If missing, the weights get a deterministic
    /// initialization.
    #[serde(default)]
    pub weights: Option<Vec<Vec<f64>>>,
}

/// Learnable mixing of species into a smaller (or larger) number of
/// pseudo-species channels. The embedding of species `s` is the row of the
/// weight matrix corresponding to `s`.
#[derive(Debug, Clone)]
pub struct Alchemical {
    one_hot: OneHot,
    weights: Array2<f64>,
}

/// Cosine basis `W[i, k] ∝ cos(π (i + 1/2) k / n_species)`, with orthonormal
/// columns for `k < n_species`
fn initial_weights(n_species: usize, pseudo_species: usize) -> Array2<f64> {
    let n = n_species as f64;
    Array2::from_shape_fn((n_species, pseudo_species), |(i, k)| {
        let normalization = if k == 0 { f64::sqrt(1.0 / n) } else { f64::sqrt(2.0 / n) };
        normalization * f64::cos(std::f64::consts::PI * (i as f64 + 0.5) * k as f64 / n)
    })
}

impl Alchemical {
    /// Create an alchemical embedding, using the given weights if any and
    /// deterministic initial weights otherwise
    pub fn new(parameters: AlchemicalParameters) -> Result<Alchemical, Error> {
        let one_hot = OneHot::new(OneHotParameters { species: parameters.species })?;
        if parameters.pseudo_species == 0 {
            return Err(Error::InvalidParameter(
                "expected at least one pseudo-species for alchemical species embedding, got 0".into()
            ));
        }

        let n_species = one_hot.size();
        let weights = match parameters.weights {
            Some(rows) => {
                check_size("alchemical species embedding", "species", n_species, rows.len())?;
                let mut weights = Array2::zeros((n_species, parameters.pseudo_species));
                for (mut weights, row) in weights.rows_mut().into_iter().zip(rows) {
                    check_size("alchemical species embedding", "pseudo-species", parameters.pseudo_species, row.len())?;
                    weights.assign(&ndarray::Array1::from(row));
                }
                weights
            }
            None => initial_weights(n_species, parameters.pseudo_species),
        };

        return Ok(Alchemical { one_hot, weights });
    }

    /// Get the list of species, in the order of the weight matrix rows
    pub fn species(&self) -> Vec<i32> {
        self.one_hot.species()
    }
}

impl SpeciesEmbedding for Alchemical {
    fn size(&self) -> usize {
        self.weights.ncols()
    }

    fn compute(&self, species: &[i32]) -> Result<Array2<f64>, Error> {
        let mut values = Array2::zeros((species.len(), self.size()));
        let channels = self.one_hot.channels(species)?;
        for (mut values, channel) in values.rows_mut().into_iter().zip(channels) {
            values.assign(&self.weights.row(channel));
        }
        return Ok(values);
    }

    fn parameters(&self) -> Option<ArrayView2<'_, f64>> {
        Some(self.weights.view())
    }

    fn parameters_mut(&mut self) -> Option<ArrayViewMut2<'_, f64>> {
        Some(self.weights.view_mut())
    }

    fn parameters_gradient(&self, species: &[i32], output_gradient: ArrayView2<f64>) -> Result<Option<Array2<f64>>, Error> {
        check_size("alchemical species embedding gradient", "edge", species.len(), output_gradient.nrows())?;
        check_size("alchemical species embedding gradient", "pseudo-species", self.size(), output_gradient.ncols())?;

        let mut gradient = Array2::zeros(self.weights.raw_dim());
        let channels = self.one_hot.channels(species)?;
        for (output_gradient, channel) in output_gradient.rows().into_iter().zip(channels) {
            let mut row = gradient.row_mut(channel);
            row += &output_gradient;
        }
        return Ok(Some(gradient));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::arr2;

    use super::*;

    #[test]
    fn one_hot() {
        let embedding = OneHot::new(OneHotParameters { species: vec![8, 1, 6] }).unwrap();
        assert_eq!(embedding.size(), 3);
        assert_eq!(embedding.species(), [8, 1, 6]);

        let values = embedding.compute(&[1, 1, 6, 8]).unwrap();
        assert_eq!(values, arr2(&[
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
        ]));

        assert_eq!(embedding.compute(&[]).unwrap().shape(), [0, 3]);
        assert!(embedding.parameters().is_none());
    }

    #[test]
    fn alchemical_initialization() {
        let embedding = Alchemical::new(AlchemicalParameters {
            species: vec![1, 6, 7, 8],
            pseudo_species: 4,
            weights: None,
        }).unwrap();

        // the initial weights are orthogonal
        let weights = embedding.parameters().unwrap();
        assert_relative_eq!(weights.t().dot(&weights), Array2::<f64>::eye(4), epsilon = 1e-12);

        // and the initialization is deterministic
        let other = Alchemical::new(AlchemicalParameters {
            species: vec![1, 6, 7, 8],
            pseudo_species: 4,
            weights: None,
        }).unwrap();
        assert_eq!(other.parameters().unwrap(), weights);
    }

    #[test]
    fn alchemical() {
        let embedding = Alchemical::new(AlchemicalParameters {
            species: vec![1, 8],
            pseudo_species: 3,
            weights: Some(vec![vec![0.1, 0.2, 0.3], vec![-1.0, 0.5, 2.0]]),
        }).unwrap();
        assert_eq!(embedding.size(), 3);

        let values = embedding.compute(&[8, 1, 8]).unwrap();
        assert_eq!(values, arr2(&[
            [-1.0, 0.5, 2.0],
            [0.1, 0.2, 0.3],
            [-1.0, 0.5, 2.0],
        ]));

        let output_gradient = arr2(&[
            [1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0],
            [7.0, 8.0, 9.0],
        ]);
        let gradient = embedding.parameters_gradient(&[8, 1, 8], output_gradient.view()).unwrap().unwrap();
        assert_eq!(gradient, arr2(&[
            [4.0, 5.0, 6.0],
            [8.0, 10.0, 12.0],
        ]));
    }

    mod bad {
        use super::super::*;

        #[test]
        fn unknown_species() {
            let embedding = OneHot::new(OneHotParameters { species: vec![1, 8] }).unwrap();
            let error = embedding.compute(&[1, 6]).unwrap_err();
            assert_eq!(
                error.to_string(),
                "invalid parameter: unknown species 6 in species embedding, expected one of [1, 8]"
            );
        }

        #[test]
        fn duplicated_species() {
            let error = OneHot::new(OneHotParameters { species: vec![1, 8, 1] }).unwrap_err();
            assert_eq!(
                error.to_string(),
                "invalid parameter: species 1 is present multiple times in one-hot species embedding"
            );
        }

        #[test]
        fn wrong_weights() {
            let error = Alchemical::new(AlchemicalParameters {
                species: vec![1, 8],
                pseudo_species: 3,
                weights: Some(vec![vec![0.1, 0.2, 0.3], vec![-1.0, 0.5]]),
            }).unwrap_err();
            assert_eq!(
                error.to_string(),
                "shape mismatch: alchemical species embedding returned 2 entries along the pseudo-species axis, expected 3"
            );
        }
    }
}
