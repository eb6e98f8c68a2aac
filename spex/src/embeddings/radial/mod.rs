//! Radial embeddings, mapping the edge length to radial channels.

mod bernstein;
pub use self::bernstein::{Bernstein, BernsteinParameters};

mod gto;
pub use self::gto::{Gto, GtoParameters};

mod trainable;
pub use self::trainable::{Trainable, TrainableParameters};
