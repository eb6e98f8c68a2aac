use ndarray::{Array2, ArrayView1, Zip};

use crate::Error;
use crate::embeddings::{RadialEmbedding, validate_cutoff};

/// Parameters for the Bernstein polynomial radial basis
#[derive(Debug, Clone, Copy)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BernsteinParameters {
    /// Number of basis functions, i.e. one more than the polynomial degree
    pub num_radial: usize,
    /// Cutoff radius, the polynomials are defined on `[0, cutoff]`
    pub cutoff: f64,
}

/// Bernstein polynomials of degree `N = num_radial - 1` in `x = r / cutoff`:
///
/// `b_k(r) = binomial(N, k) x^k (1 - x)^(N - k)`
///
/// The basis functions are positive, sum to 1 for all `r`, and are constant
/// (equal to their value at `r = cutoff`) beyond the cutoff.
#[derive(Debug, Clone)]
pub struct Bernstein {
    cutoff: f64,
    /// binomial(N, k) for k = 0..=N
    binomials: Vec<f64>,
    /// binomial(N - 1, k) for k = 0..N, used by the derivatives
    binomials_lower: Vec<f64>,
}

fn binomials(degree: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(degree + 1);
    let mut value = 1.0;
    for k in 0..=degree {
        result.push(value);
        value *= (degree - k) as f64 / (k + 1) as f64;
    }
    return result;
}

/// Evaluate the Bernstein polynomial `binomial * x^k (1 - x)^(degree - k)`
#[inline]
fn bernstein(binomial: f64, k: usize, degree: usize, x: f64) -> f64 {
    binomial * x.powi(k as i32) * (1.0 - x).powi((degree - k) as i32)
}

impl Bernstein {
    /// Create a Bernstein basis with `num_radial` polynomials of degree
    /// `num_radial - 1`
    pub fn new(parameters: BernsteinParameters) -> Result<Bernstein, Error> {
        validate_cutoff("Bernstein radial basis", parameters.cutoff)?;
        if parameters.num_radial == 0 {
            return Err(Error::InvalidParameter(
                "expected at least one radial basis function for Bernstein radial basis, got 0".into()
            ));
        }

        let degree = parameters.num_radial - 1;
        return Ok(Bernstein {
            cutoff: parameters.cutoff,
            binomials: binomials(degree),
            binomials_lower: if degree > 0 { binomials(degree - 1) } else { Vec::new() },
        });
    }

    fn degree(&self) -> usize {
        self.binomials.len() - 1
    }
}

impl RadialEmbedding for Bernstein {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn size(&self) -> usize {
        self.binomials.len()
    }

    #[time_graph::instrument(name = "Bernstein::compute")]
    fn compute(&self, distances: ArrayView1<f64>) -> Array2<f64> {
        let degree = self.degree();
        let mut values = Array2::zeros((distances.len(), self.size()));
        Zip::from(values.rows_mut()).and(&distances).par_for_each(|mut values, &r| {
            let x = f64::clamp(r / self.cutoff, 0.0, 1.0);
            for (k, value) in values.iter_mut().enumerate() {
                *value = bernstein(self.binomials[k], k, degree, x);
            }
        });
        return values;
    }

    fn compute_gradient(&self, distances: ArrayView1<f64>) -> Array2<f64> {
        let degree = self.degree();
        let mut gradients = Array2::zeros((distances.len(), self.size()));
        if degree == 0 {
            return gradients;
        }

        let factor = degree as f64 / self.cutoff;
        Zip::from(gradients.rows_mut()).and(&distances).par_for_each(|mut gradients, &r| {
            let x = r / self.cutoff;
            if !(0.0..=1.0).contains(&x) {
                // the basis is clamped outside of [0, cutoff]
                return;
            }

            // d b_{k, N} / dx = N (b_{k - 1, N - 1} - b_{k, N - 1})
            for (k, gradient) in gradients.iter_mut().enumerate() {
                let lower = if k > 0 {
                    bernstein(self.binomials_lower[k - 1], k - 1, degree - 1, x)
                } else {
                    0.0
                };
                let same = if k < degree {
                    bernstein(self.binomials_lower[k], k, degree - 1, x)
                } else {
                    0.0
                };
                *gradient = factor * (lower - same);
            }
        });
        return gradients;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{arr1, Axis};

    use super::*;

    #[test]
    fn binomial_coefficients() {
        assert_eq!(binomials(0), [1.0]);
        assert_eq!(binomials(4), [1.0, 4.0, 6.0, 4.0, 1.0]);
    }

    #[test]
    fn partition_of_unity() {
        let basis = Bernstein::new(BernsteinParameters { num_radial: 8, cutoff: 5.0 }).unwrap();
        assert_eq!(basis.size(), 8);

        let distances = arr1(&[0.0, 0.3, 1.7, 2.5, 4.99, 5.0, 7.0]);
        let values = basis.compute(distances.view());
        assert_eq!(values.shape(), [7, 8]);
        for sum in values.sum_axis(Axis(1)) {
            assert_relative_eq!(sum, 1.0, max_relative = 1e-12);
        }
        assert!(values.iter().all(|&v| v >= 0.0));

        // first function is 1 at r = 0, last function is 1 at r = cutoff
        assert_eq!(values[[0, 0]], 1.0);
        assert_eq!(values[[5, 7]], 1.0);

        let gradients = basis.compute_gradient(distances.view());
        for sum in gradients.sum_axis(Axis(1)) {
            assert_relative_eq!(sum, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn single_function() {
        let basis = Bernstein::new(BernsteinParameters { num_radial: 1, cutoff: 2.0 }).unwrap();
        let distances = arr1(&[0.0, 1.0, 3.0]);
        assert_eq!(basis.compute(distances.view()), Array2::<f64>::ones((3, 1)));
        assert_eq!(basis.compute_gradient(distances.view()), Array2::<f64>::zeros((3, 1)));
    }

    #[test]
    fn finite_differences() {
        let basis = Bernstein::new(BernsteinParameters { num_radial: 6, cutoff: 4.5 }).unwrap();
        let distances = arr1(&[0.1, 0.8, 2.2, 3.1, 4.4]);
        let delta = 1e-7;

        let values = basis.compute(distances.view());
        let displaced = basis.compute((&distances + delta).view());
        let gradients = basis.compute_gradient(distances.view());

        let finite_differences = (displaced - values) / delta;
        assert_relative_eq!(finite_differences, gradients, epsilon = 1e-5, max_relative = 1e-5);
    }

    #[test]
    fn invalid_parameters() {
        let error = Bernstein::new(BernsteinParameters { num_radial: 0, cutoff: 2.0 }).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid parameter: expected at least one radial basis function for Bernstein radial basis, got 0"
        );

        let error = Bernstein::new(BernsteinParameters { num_radial: 4, cutoff: 0.0 }).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid parameter: expected a positive cutoff for Bernstein radial basis, got 0"
        );
    }
}
