use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};
use log::info;

use crate::Error;

/// Maximal number of control points in the splines
const MAX_SPLINE_SIZE: usize = 10_000;

/// Number of equally spaced control points used to start the spline
const INITIAL_GRID_SIZE: usize = 11;

/// Parameters controlling a `HermitCubicSpline`
#[derive(Debug, Clone, Copy)]
pub struct SplineParameters {
    /// Beginning of the interpolation range
    pub start: f64,
    /// End of the interpolation range
    pub stop: f64,
    /// Number of values returned by the splined function
    pub size: usize,
}

/// A single control point in the spline
#[derive(Debug, Clone)]
struct ControlPoint {
    position: f64,
    value: Array1<f64>,
    derivative: Array1<f64>,
}

/// [Hermit cubic spline][splines-wiki] interpolating a function `R -> R^n`
/// from its values and derivatives at a set of control points.
///
/// [splines-wiki]: https://en.wikipedia.org/wiki/Cubic_Hermite_spline
#[derive(Debug, Clone)]
pub struct HermitCubicSpline {
    parameters: SplineParameters,
    points: Vec<ControlPoint>,
}

impl HermitCubicSpline {
    /// Create a new `HermitCubicSpline` from the given `function`, adding
    /// control points until the requested accuracy is reached.
    ///
    /// The `function` should return a tuple of `(value, derivative)` at the
    /// input position, both with `parameters.size` entries. The accuracy is
    /// reached when either the mean absolute error or the mean relative error
    /// at the middle of all intervals gets below `accuracy`.
    pub fn with_accuracy<F>(
        accuracy: f64,
        parameters: SplineParameters,
        function: F,
    ) -> Result<HermitCubicSpline, Error> where
        F: Fn(f64) -> (Array1<f64>, Array1<f64>),
    {
        if !(accuracy > 0.0 && accuracy.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "got invalid accuracy in spline ({}), it must be positive", accuracy
            )));
        }

        if !(parameters.start < parameters.stop) {
            return Err(Error::InvalidParameter(format!(
                "invalid spline range: start ({}) must be smaller than stop ({})",
                parameters.start, parameters.stop
            )));
        }

        let evaluate = |position: f64| -> Result<ControlPoint, Error> {
            let (value, derivative) = function(position);
            if value.len() != parameters.size || derivative.len() != parameters.size {
                return Err(Error::InvalidParameter(format!(
                    "splined function returned {} values and {} derivatives, expected {}",
                    value.len(), derivative.len(), parameters.size
                )));
            }
            Ok(ControlPoint { position, value, derivative })
        };

        let step = (parameters.stop - parameters.start) / (INITIAL_GRID_SIZE - 1) as f64;
        let points = (0..INITIAL_GRID_SIZE)
            .map(|k| evaluate(parameters.start + k as f64 * step))
            .collect::<Result<Vec<_>, _>>()?;

        let mut spline = HermitCubicSpline { parameters, points };
        let mut interpolated = Array1::zeros(parameters.size);

        loop {
            let mut max_absolute_error = 0.0;
            let mut mean_absolute_error = 0.0;
            let mut mean_relative_error = 0.0;
            let mut count = 0;

            // the error is largest in the middle of the intervals
            let mut new_points = Vec::with_capacity(spline.points.len() - 1);
            for window in spline.points.windows(2) {
                let position = 0.5 * (window[0].position + window[1].position);
                let reference = evaluate(position)?;

                spline.compute(position, interpolated.view_mut(), None);
                Zip::from(&interpolated).and(&reference.value).for_each(|&interpolated, &value| {
                    let absolute_error = f64::abs(interpolated - value);
                    max_absolute_error = f64::max(max_absolute_error, absolute_error);
                    mean_absolute_error += absolute_error;
                    if value != 0.0 {
                        mean_relative_error += f64::abs(absolute_error / value);
                    }
                    count += 1;
                });

                new_points.push(reference);
            }
            mean_absolute_error /= count as f64;
            mean_relative_error /= count as f64;

            if mean_absolute_error < accuracy || mean_relative_error < accuracy {
                info!(
                    "spline reached requested accuracy ({:.3e}) with {} control points (max absolute error is {:.3e})",
                    accuracy, spline.points.len(), max_absolute_error,
                );
                return Ok(spline);
            }

            if spline.points.len() + new_points.len() > MAX_SPLINE_SIZE {
                return Err(Error::Internal(format!(
                    "failed to reach requested accuracy ({:e}) in spline interpolation, \
                    mean absolute error is {:e} and mean relative error is {:e}",
                    accuracy, mean_absolute_error, mean_relative_error
                )));
            }

            spline.points.extend(new_points);
            spline.points.sort_unstable_by(|a, b| a.position.total_cmp(&b.position));
        }
    }

    /// Get the number of control points in this spline
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Is this spline empty? This is always false, since construction
    /// requires at least two control points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get the parameters used to create this spline
    pub fn parameters(&self) -> &SplineParameters {
        &self.parameters
    }

    /// Evaluate the spline at `x`, storing the results in `values` and
    /// optionally the derivatives with respect to `x` in `gradients`. `x` must
    /// be inside `[start, stop]`.
    pub fn compute(&self, x: f64, values: ArrayViewMut1<f64>, gradients: Option<ArrayViewMut1<f64>>) {
        debug_assert!(x >= self.parameters.start && x <= self.parameters.stop, "{} is outside of the spline range", x);
        debug_assert_eq!(values.len(), self.parameters.size);

        // index of the interval containing x, the last interval is closed
        let k = self.points.partition_point(|point| point.position <= x);
        let k = k.clamp(1, self.points.len() - 1) - 1;

        let left = &self.points[k];
        let right = &self.points[k + 1];

        let delta = right.position - left.position;
        let t = (x - left.position) / delta;
        let t_2 = t * t;
        let t_3 = t_2 * t;

        // Hermit base polynomials
        let h00 = 2.0 * t_3 - 3.0 * t_2 + 1.0;
        let h10 = t_3 - 2.0 * t_2 + t;
        let h01 = -2.0 * t_3 + 3.0 * t_2;
        let h11 = t_3 - t_2;

        let interpolate = |output: ArrayViewMut1<f64>, c00: f64, c10: f64, c01: f64, c11: f64| {
            Zip::from(output)
                .and(&left.value)
                .and(&left.derivative)
                .and(&right.value)
                .and(&right.derivative)
                .for_each(|o, &p_k, &m_k, &p_k_1, &m_k_1| {
                    *o = c00 * p_k + c10 * m_k + c01 * p_k_1 + c11 * m_k_1;
                });
        };

        interpolate(values, h00, h10 * delta, h01, h11 * delta);

        if let Some(gradients) = gradients {
            debug_assert_eq!(gradients.len(), self.parameters.size);
            let d_h00 = 6.0 * (t_2 - t) / delta;
            let d_h10 = 3.0 * t_2 - 4.0 * t + 1.0;
            let d_h01 = -d_h00;
            let d_h11 = 3.0 * t_2 - 2.0 * t;
            interpolate(gradients, d_h00, d_h10, d_h01, d_h11);
        }
    }

    /// Get the positions of all control points
    pub fn positions(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.position).collect()
    }

    /// Get the value of the splined function at the control point `k`
    pub fn control_value(&self, k: usize) -> ArrayView1<'_, f64> {
        self.points[k].value.view()
    }
}
