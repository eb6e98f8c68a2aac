use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, Zip};

use crate::Error;
use crate::math::{HermitCubicSpline, SplineParameters};
use crate::embeddings::{RadialEmbedding, validate_cutoff};

/// Parameters for the Gaussian-Type Orbitals radial basis
#[derive(Debug, Clone, Copy)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GtoParameters {
    /// Number of radial basis functions
    pub max_radial: usize,
    /// Cutoff radius, the basis functions are zero beyond this value
    pub cutoff: f64,
    /// If set, evaluate the basis through a Hermit cubic spline with this
    /// accuracy instead of evaluating the functions directly
    #[serde(default)]
    pub spline_accuracy: Option<f64>,
}

/// Radial basis similar to Gaussian-Type Orbitals.
///
/// The basis is defined as `R_n(r) = N_n r^n e^{- r^2 / (2 σ_n^2)}`, where `σ_n
/// = cutoff * max(√n, 1) / n_max` and `N_n = sqrt(2 / (σ_n^{2n + 3} Γ(n +
/// 3/2)))` normalizes each function on `[0, ∞)` with the `r^2` measure. The
/// functions are set to zero beyond the cutoff.
#[derive(Debug, Clone)]
pub struct Gto {
    cutoff: f64,
    widths: Vec<f64>,
    normalizations: Vec<f64>,
    spline: Option<HermitCubicSpline>,
}

/// Γ(n + 3/2), using the recurrence Γ(x + 1) = x Γ(x) from Γ(3/2) = √π / 2
fn gamma_half_integer(n: usize) -> f64 {
    let mut value = 0.5 * f64::sqrt(std::f64::consts::PI);
    for k in 0..n {
        value *= k as f64 + 1.5;
    }
    return value;
}

impl Gto {
    /// Create a normalized GTO basis with `max_radial` functions
    pub fn new(parameters: GtoParameters) -> Result<Gto, Error> {
        validate_cutoff("GTO radial basis", parameters.cutoff)?;
        if parameters.max_radial == 0 {
            return Err(Error::InvalidParameter(
                "expected at least one radial basis function for GTO radial basis, got 0".into()
            ));
        }

        let n_max = parameters.max_radial as f64;
        let widths = (0..parameters.max_radial).map(|n| {
            parameters.cutoff * f64::max(f64::sqrt(n as f64), 1.0) / n_max
        }).collect::<Vec<_>>();

        let normalizations = widths.iter().enumerate().map(|(n, &sigma)| {
            f64::sqrt(2.0 / (sigma.powi(2 * n as i32 + 3) * gamma_half_integer(n)))
        }).collect();

        let mut gto = Gto {
            cutoff: parameters.cutoff,
            widths,
            normalizations,
            spline: None,
        };

        if let Some(accuracy) = parameters.spline_accuracy {
            let spline_parameters = SplineParameters {
                start: 0.0,
                stop: gto.cutoff,
                size: gto.size(),
            };

            let spline = HermitCubicSpline::with_accuracy(accuracy, spline_parameters, |r| {
                let mut values = Array1::zeros(gto.size());
                let mut gradients = Array1::zeros(gto.size());
                gto.evaluate(r, values.view_mut(), Some(gradients.view_mut()));
                (values, gradients)
            })?;
            gto.spline = Some(spline);
        }

        return Ok(gto);
    }

    /// Is this basis evaluated through a spline?
    pub fn is_splined(&self) -> bool {
        self.spline.is_some()
    }

    /// Evaluate the basis functions and optionally their derivatives at `r`
    /// directly from their definition
    fn evaluate(&self, r: f64, mut values: ArrayViewMut1<f64>, mut gradients: Option<ArrayViewMut1<f64>>) {
        for (n, (&sigma, &normalization)) in self.widths.iter().zip(&self.normalizations).enumerate() {
            let exponential = f64::exp(-0.5 * r * r / (sigma * sigma));
            let r_n = r.powi(n as i32);
            values[n] = normalization * r_n * exponential;

            if let Some(ref mut gradients) = gradients {
                let r_n_minus_1 = if n == 0 { 0.0 } else { n as f64 * r.powi(n as i32 - 1) };
                gradients[n] = normalization * exponential * (r_n_minus_1 - r_n * r / (sigma * sigma));
            }
        }
    }

    fn evaluate_row(&self, r: f64, values: ArrayViewMut1<f64>, gradients: Option<ArrayViewMut1<f64>>) {
        if r >= self.cutoff {
            // rows are zero-initialized
            return;
        }

        if let Some(ref spline) = self.spline {
            spline.compute(r, values, gradients);
        } else {
            self.evaluate(r, values, gradients);
        }
    }
}

impl RadialEmbedding for Gto {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn size(&self) -> usize {
        self.widths.len()
    }

    #[time_graph::instrument(name = "Gto::compute")]
    fn compute(&self, distances: ArrayView1<f64>) -> Array2<f64> {
        let mut values = Array2::zeros((distances.len(), self.size()));
        Zip::from(values.rows_mut()).and(&distances).par_for_each(|values, &r| {
            self.evaluate_row(r, values, None);
        });
        return values;
    }

    fn compute_gradient(&self, distances: ArrayView1<f64>) -> Array2<f64> {
        let mut values = Array2::zeros((distances.len(), self.size()));
        let mut gradients = Array2::zeros((distances.len(), self.size()));
        Zip::from(values.rows_mut())
            .and(gradients.rows_mut())
            .and(&distances)
            .par_for_each(|values, gradients, &r| {
                self.evaluate_row(r, values, Some(gradients));
            });
        return gradients;
    }
}
