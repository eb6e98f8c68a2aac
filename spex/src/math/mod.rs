//! Numerical kernels used by the embedding strategies.

mod splines;
pub use self::splines::{HermitCubicSpline, SplineParameters};

mod spherical_harmonics;
pub use self::spherical_harmonics::{SphericalHarmonics, lm_index, lm_size};
