use std::f64::consts::PI;

use ndarray::{Array1, ArrayView1};

use crate::Error;
use super::{CutoffFunction, validate_cutoff};

/// Parameters for the shifted cosine cutoff function
#[derive(Debug, Clone, Copy)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ShiftedCosineParameters {
    /// Radius of the spherical cutoff
    pub cutoff: f64,
    /// Width of the switching region, just before the cutoff radius
    pub width: f64,
}

/// Shifted cosine switching function
///
/// `f(r) = 1/2 * (1 + cos(π (r - cutoff + width) / width))` for `cutoff -
/// width < r < cutoff`, 1 below this region and 0 above.
#[derive(Debug, Clone)]
pub struct ShiftedCosine {
    cutoff: f64,
    width: f64,
}

impl ShiftedCosine {
    /// Create a shifted cosine cutoff function, checking that the width is
    /// positive and not larger than the cutoff
    pub fn new(parameters: ShiftedCosineParameters) -> Result<ShiftedCosine, Error> {
        validate_cutoff("shifted cosine cutoff function", parameters.cutoff)?;
        let width = parameters.width;
        if !(width > 0.0 && width <= parameters.cutoff) {
            return Err(Error::InvalidParameter(format!(
                "expected positive width smaller than the cutoff for shifted cosine cutoff function, got {}",
                width
            )));
        }

        return Ok(ShiftedCosine { cutoff: parameters.cutoff, width });
    }

    fn value(&self, r: f64) -> f64 {
        if r <= (self.cutoff - self.width) {
            1.0
        } else if r >= self.cutoff {
            0.0
        } else {
            let s = PI * (r - self.cutoff + self.width) / self.width;
            0.5 * (1.0 + f64::cos(s))
        }
    }

    fn derivative(&self, r: f64) -> f64 {
        if r <= (self.cutoff - self.width) || r >= self.cutoff {
            0.0
        } else {
            let s = PI * (r - self.cutoff + self.width) / self.width;
            -0.5 * PI * f64::sin(s) / self.width
        }
    }
}

impl CutoffFunction for ShiftedCosine {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn compute(&self, distances: ArrayView1<f64>) -> Array1<f64> {
        distances.mapv(|r| self.value(r))
    }

    fn compute_gradient(&self, distances: ArrayView1<f64>) -> Array1<f64> {
        distances.mapv(|r| self.derivative(r))
    }
}

/// Parameters for the step cutoff function
#[derive(Debug, Clone, Copy)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StepParameters {
    /// Radius of the spherical cutoff
    pub cutoff: f64,
}

/// Step function, 1 if `r < cutoff` and 0 if `r >= cutoff`.
///
/// This function is not continuous at the cutoff, which makes it a poor fit
/// for models trained on derivatives of the expansion.
#[derive(Debug, Clone)]
pub struct Step {
    cutoff: f64,
}

impl Step {
    /// Create a step cutoff function
    pub fn new(parameters: StepParameters) -> Result<Step, Error> {
        validate_cutoff("step cutoff function", parameters.cutoff)?;
        return Ok(Step { cutoff: parameters.cutoff });
    }
}

impl CutoffFunction for Step {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn compute(&self, distances: ArrayView1<f64>) -> Array1<f64> {
        distances.mapv(|r| if r >= self.cutoff { 0.0 } else { 1.0 })
    }

    fn compute_gradient(&self, distances: ArrayView1<f64>) -> Array1<f64> {
        Array1::zeros(distances.len())
    }

    fn is_smooth(&self) -> bool {
        false
    }
}
