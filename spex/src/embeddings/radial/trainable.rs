use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2};

use crate::Error;
use crate::errors::check_size;
use crate::embeddings::RadialEmbedding;

/// Parameters for the trainable radial basis
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TrainableParameters {
    /// Definition of the underlying radial basis, as a single-key object
    /// `{"Name": {parameters}}`
    pub basis: serde_json::Value,
    /// Number of output channels
    pub size: usize,
    /// Initial weights, one row per channel of the underlying basis and one
    /// column per output channel. If missing, the weights are initialized to
    /// a truncated identity.
    #[serde(default)]
    pub weights: Option<Vec<Vec<f64>>>,
}

/// Learnable linear combination of another radial basis.
///
/// The output is `basis(r) · W`, with a weight matrix `W` of shape
/// `[basis.size(), size]`. New weights are initialized to a truncated
/// identity, so that the first channels reproduce the underlying basis.
#[derive(Debug)]
pub struct Trainable {
    basis: Box<dyn RadialEmbedding>,
    weights: Array2<f64>,
}

impl Trainable {
    /// Create a new trainable basis with `size` output channels on top of
    /// `basis`
    pub fn new(basis: Box<dyn RadialEmbedding>, size: usize) -> Result<Trainable, Error> {
        if size == 0 {
            return Err(Error::InvalidParameter(
                "expected at least one output channel for trainable radial basis, got 0".into()
            ));
        }

        let mut weights = Array2::zeros((basis.size(), size));
        for i in 0..usize::min(basis.size(), size) {
            weights[[i, i]] = 1.0;
        }

        return Ok(Trainable { basis, weights });
    }

    /// Create a new trainable basis on top of `basis` with explicit initial
    /// `weights`
    pub fn with_weights(basis: Box<dyn RadialEmbedding>, weights: Array2<f64>) -> Result<Trainable, Error> {
        check_size("trainable radial basis", "basis", basis.size(), weights.nrows())?;
        if weights.ncols() == 0 {
            return Err(Error::InvalidParameter(
                "expected at least one output channel for trainable radial basis, got 0".into()
            ));
        }

        return Ok(Trainable { basis, weights });
    }

    /// Get the underlying (fixed) radial basis
    pub fn basis(&self) -> &dyn RadialEmbedding {
        &*self.basis
    }
}

impl RadialEmbedding for Trainable {
    fn cutoff(&self) -> f64 {
        self.basis.cutoff()
    }

    fn size(&self) -> usize {
        self.weights.ncols()
    }

    fn compute(&self, distances: ArrayView1<f64>) -> Array2<f64> {
        self.basis.compute(distances).dot(&self.weights)
    }

    fn compute_gradient(&self, distances: ArrayView1<f64>) -> Array2<f64> {
        self.basis.compute_gradient(distances).dot(&self.weights)
    }

    fn parameters(&self) -> Option<ArrayView2<'_, f64>> {
        Some(self.weights.view())
    }

    fn parameters_mut(&mut self) -> Option<ArrayViewMut2<'_, f64>> {
        Some(self.weights.view_mut())
    }

    fn parameters_gradient(&self, distances: ArrayView1<f64>, output_gradient: ArrayView2<f64>) -> Option<Array2<f64>> {
        let basis = self.basis.compute(distances);
        Some(basis.t().dot(&output_gradient))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::arr1;

    use crate::embeddings::radial::{Bernstein, BernsteinParameters};
    use super::*;

    fn bernstein(num_radial: usize) -> Box<dyn RadialEmbedding> {
        Box::new(Bernstein::new(BernsteinParameters { num_radial, cutoff: 4.0 }).unwrap())
    }

    #[test]
    fn truncated_identity() {
        let distances = arr1(&[0.5, 1.5, 3.8]);
        let reference = bernstein(4).compute(distances.view());

        let trainable = Trainable::new(bernstein(4), 3).unwrap();
        assert_eq!(trainable.size(), 3);
        assert_eq!(trainable.cutoff(), 4.0);
        let values = trainable.compute(distances.view());
        assert_eq!(values, reference.slice(ndarray::s![.., ..3]));

        let trainable = Trainable::new(bernstein(4), 6).unwrap();
        let values = trainable.compute(distances.view());
        assert_eq!(values.slice(ndarray::s![.., ..4]), reference);
        assert_eq!(values.slice(ndarray::s![.., 4..]), Array2::<f64>::zeros((3, 2)));
    }

    #[test]
    fn parameters_gradient() {
        let mut trainable = Trainable::new(bernstein(5), 3).unwrap();
        trainable.parameters_mut().unwrap().assign(&ndarray::arr2(&[
            [0.3, -1.2, 0.5],
            [1.1, 0.2, 0.0],
            [-0.4, 0.8, 2.0],
            [0.7, 0.1, -0.6],
            [0.9, -0.3, 0.4],
        ]));

        let distances = arr1(&[0.5, 1.5, 2.2, 3.8]);
        // loss = sum(output * output_gradient)
        let output_gradient = ndarray::arr2(&[
            [1.0, 0.5, -0.2],
            [0.3, -1.0, 0.8],
            [0.0, 0.4, 1.5],
            [-0.7, 0.2, 0.1],
        ]);
        let loss = |trainable: &Trainable| {
            (trainable.compute(distances.view()) * &output_gradient).sum()
        };

        let gradient = trainable.parameters_gradient(distances.view(), output_gradient.view()).unwrap();
        assert_eq!(gradient.shape(), [5, 3]);

        let delta = 1e-6;
        let reference = loss(&trainable);
        for i in 0..5 {
            for j in 0..3 {
                trainable.parameters_mut().unwrap()[[i, j]] += delta;
                let finite_difference = (loss(&trainable) - reference) / delta;
                trainable.parameters_mut().unwrap()[[i, j]] -= delta;

                assert_relative_eq!(finite_difference, gradient[[i, j]], epsilon = 1e-6, max_relative = 1e-5);
            }
        }
    }

    mod bad {
        use super::*;

        #[test]
        fn wrong_weights() {
            let error = Trainable::with_weights(bernstein(5), Array2::zeros((4, 3))).unwrap_err();
            assert_eq!(
                error.to_string(),
                "shape mismatch: trainable radial basis returned 4 entries along the basis axis, expected 5"
            );
        }
    }
}
