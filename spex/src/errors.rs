#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// Two embedding strategies (or a strategy and the expansion) disagree on
    /// a shared parameter such as the cutoff radius
    ConfigurationMismatch(String),
    /// An array produced or consumed during the calculation does not have the
    /// expected size along one of its axes
    ShapeMismatch {
        /// which strategy or array is responsible for the mismatch
        strategy: &'static str,
        /// which axis of the array has the wrong size
        axis: &'static str,
        /// expected size along this axis
        expected: usize,
        /// actual size along this axis
        got: usize,
    },
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// Numerical error in an internal computation
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::ConfigurationMismatch(e) => write!(f, "configuration mismatch: {}", e),
            Error::ShapeMismatch { strategy, axis, expected, got } => write!(f,
                "shape mismatch: {} returned {} entries along the {} axis, expected {}",
                strategy, got, axis, expected
            ),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::ConfigurationMismatch(_) |
            Error::ShapeMismatch { .. } |
            Error::Internal(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

/// Check that `got` is equal to `expected`, returning a `ShapeMismatch` error
/// naming `strategy` and `axis` otherwise.
pub(crate) fn check_size(strategy: &'static str, axis: &'static str, expected: usize, got: usize) -> Result<(), Error> {
    if expected != got {
        return Err(Error::ShapeMismatch { strategy, axis, expected, got });
    }
    return Ok(());
}
