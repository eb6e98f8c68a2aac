#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::must_use_candidate, clippy::comparison_chain)]
#![allow(clippy::redundant_field_names, clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unreadable_literal, clippy::option_if_let_else, clippy::range_plus_one)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions)]

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap, clippy::cast_lossless, clippy::cast_sign_loss)]
#![allow(clippy::default_trait_access, clippy::many_single_char_names)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

//! Equivariant spherical expansion of labelled point clouds.
//!
//! For each edge `(i, j)` of a neighbor list, the expansion combines a radial
//! embedding of the distance, an angular embedding of the direction and a
//! species embedding of the neighbor label, weighted by a cutoff function,
//! and sums the result over the neighbors of every center atom. The output is
//! a [`RaggedTensors`], containing one `[atom, 2l + 1, radial, species]` array
//! for each angular degree `l`.

pub mod types;
pub use types::*;

pub mod math;

mod errors;
pub use self::errors::Error;

mod ragged;
pub use self::ragged::RaggedTensors;

mod edges;
pub use self::edges::Edges;

pub mod embeddings;

pub mod expansion;
pub use self::expansion::{SphericalExpansion, ExpansionGradients, ExpansionState};

pub mod registry;
pub use self::registry::Registry;
