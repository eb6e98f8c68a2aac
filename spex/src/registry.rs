//! Creation of embeddings and expansions from their JSON description.
//!
//! Every embedding is described by a single-key JSON object, associating the
//! name of the embedding with its parameters, e.g. `{"Bernstein":
//! {"num_radial": 8, "cutoff": 5.0}}`. A full expansion is described by
//!
//! ```json
//! {
//!     "cutoff": 5.0,
//!     "max_angular": 3,
//!     "radial": {"Bernstein": {"num_radial": 8, "cutoff": 5.0}},
//!     "angular": {"SphericalHarmonics": {"max_angular": 3}},
//!     "species": {"OneHot": {"species": [1, 6, 8]}},
//!     "cutoff_function": {"ShiftedCosine": {"cutoff": 5.0, "width": 0.5}}
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::{Array1, Array2};
use once_cell::sync::Lazy;
use schemars::schema::RootSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, SphericalExpansion};
use crate::errors::check_size;
use crate::embeddings::{AngularEmbedding, CutoffFunction, RadialEmbedding, SpeciesEmbedding};
use crate::embeddings::radial::{Bernstein, BernsteinParameters, Gto, GtoParameters};
use crate::embeddings::radial::{Trainable, TrainableParameters};
use crate::embeddings::angular::{SphericalHarmonics, SphericalHarmonicsParameters};
use crate::embeddings::angular::{SolidHarmonics, SolidHarmonicsParameters};
use crate::embeddings::species::{OneHot, OneHotParameters, Alchemical, AlchemicalParameters};
use crate::embeddings::cutoff::{ShiftedCosine, ShiftedCosineParameters, Step, StepParameters};

/// The different kinds of embedding strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Radial,
    Angular,
    Species,
    Cutoff,
}

impl StrategyKind {
    fn name(self) -> &'static str {
        match self {
            StrategyKind::Radial => "radial embedding",
            StrategyKind::Angular => "angular embedding",
            StrategyKind::Species => "species embedding",
            StrategyKind::Cutoff => "cutoff function",
        }
    }
}

/// A registered strategy: how to create it and how to describe its
/// parameters
struct Entry<T: ?Sized> {
    create: Arc<dyn Fn(Value, &Registry) -> Result<Box<T>, Error> + Send + Sync>,
    schema: fn() -> RootSchema,
}

impl<T: ?Sized> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Entry {
            create: Arc::clone(&self.create),
            schema: self.schema,
        }
    }
}

fn schema<P: schemars::JsonSchema>() -> RootSchema {
    schemars::schema_for!(P)
}

fn insert<T, P, F>(
    map: &mut BTreeMap<String, Entry<T>>,
    kind: StrategyKind,
    name: &str,
    create: F,
) -> Result<(), Error> where
    T: ?Sized,
    P: DeserializeOwned + schemars::JsonSchema,
    F: Fn(P, &Registry) -> Result<Box<T>, Error> + Send + Sync + 'static,
{
    if map.contains_key(name) {
        return Err(Error::InvalidParameter(format!(
            "a {} named '{}' is already registered", kind.name(), name
        )));
    }

    let create = move |json: Value, registry: &Registry| -> Result<Box<T>, Error> {
        let parameters = serde_json::from_value::<P>(json)?;
        create(parameters, registry)
    };

    map.insert(name.into(), Entry {
        create: Arc::new(create),
        schema: schema::<P>,
    });

    return Ok(());
}

/// Split a single-key object `{"Name": {parameters}}` into the name and the
/// parameters
fn split_name(kind: StrategyKind, json: &Value) -> Result<(&str, Value), Error> {
    if let Value::Object(map) = json {
        if map.len() == 1 {
            if let Some((name, parameters)) = map.iter().next() {
                return Ok((name, parameters.clone()));
            }
        }
    }

    return Err(Error::InvalidParameter(format!(
        "expected a single-key object {{\"Name\": {{parameters}}}} to define the {}, got {}",
        kind.name(), json
    )));
}

fn lookup<'a, T: ?Sized>(map: &'a BTreeMap<String, Entry<T>>, kind: StrategyKind, name: &str) -> Result<&'a Entry<T>, Error> {
    map.get(name).ok_or_else(|| Error::InvalidParameter(format!(
        "unknown {} '{}', available ones are {:?}",
        kind.name(), name, map.keys().collect::<Vec<_>>()
    )))
}

/// Parameters of a full spherical expansion, with each embedding given as a
/// single-key object
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExpansionParameters {
    /// Cutoff radius, must be the same as the one of the radial embedding and
    /// the cutoff function
    pub cutoff: f64,
    /// Maximal angular degree to compute
    pub max_angular: usize,
    /// Definition of the radial embedding
    pub radial: Value,
    /// Definition of the angular embedding
    pub angular: Value,
    /// Definition of the species embedding
    pub species: Value,
    /// Definition of the cutoff function
    pub cutoff_function: Value,
}

/// Mapping from names to constructors for all kinds of embedding strategies.
///
/// The default registry contains all the strategies defined in this crate,
/// and additional ones can be added with the `register_*` functions.
#[derive(Clone)]
pub struct Registry {
    radial: BTreeMap<String, Entry<dyn RadialEmbedding>>,
    angular: BTreeMap<String, Entry<dyn AngularEmbedding>>,
    species: BTreeMap<String, Entry<dyn SpeciesEmbedding>>,
    cutoff: BTreeMap<String, Entry<dyn CutoffFunction>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("radial", &self.radial.keys().collect::<Vec<_>>())
            .field("angular", &self.angular.keys().collect::<Vec<_>>())
            .field("species", &self.species.keys().collect::<Vec<_>>())
            .field("cutoff", &self.cutoff.keys().collect::<Vec<_>>())
            .finish()
    }
}

macro_rules! add_strategy {
    ($registry :expr, $register :ident, $name :literal, infallible $type :ty, $parameters :ty) => (
        $registry.$register($name, |parameters: $parameters, _: &Registry| {
            Ok(Box::new(<$type>::new(parameters)))
        }).expect("duplicated built-in strategy");
    );
    ($registry :expr, $register :ident, $name :literal, $type :ty, $parameters :ty) => (
        $registry.$register($name, |parameters: $parameters, _: &Registry| {
            Ok(Box::new(<$type>::new(parameters)?))
        }).expect("duplicated built-in strategy");
    );
}

pub(crate) static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::empty();

    add_strategy!(registry, register_radial, "Bernstein", Bernstein, BernsteinParameters);
    add_strategy!(registry, register_radial, "Gto", Gto, GtoParameters);
    registry.register_radial("Trainable", create_trainable).expect("duplicated built-in strategy");

    add_strategy!(registry, register_angular, "SphericalHarmonics", infallible SphericalHarmonics, SphericalHarmonicsParameters);
    add_strategy!(registry, register_angular, "SolidHarmonics", infallible SolidHarmonics, SolidHarmonicsParameters);

    add_strategy!(registry, register_species, "OneHot", OneHot, OneHotParameters);
    add_strategy!(registry, register_species, "Alchemical", Alchemical, AlchemicalParameters);

    add_strategy!(registry, register_cutoff, "ShiftedCosine", ShiftedCosine, ShiftedCosineParameters);
    add_strategy!(registry, register_cutoff, "Step", Step, StepParameters);

    return registry;
});

fn create_trainable(parameters: TrainableParameters, registry: &Registry) -> Result<Box<dyn RadialEmbedding>, Error> {
    let basis = registry.create_radial(&parameters.basis)?;
    let trainable = match parameters.weights {
        Some(rows) => {
            let mut weights = Array2::zeros((rows.len(), parameters.size));
            for (mut weights, row) in weights.rows_mut().into_iter().zip(rows) {
                check_size("trainable radial basis", "output channel", parameters.size, row.len())?;
                weights.assign(&Array1::from(row));
            }
            Trainable::with_weights(basis, weights)?
        }
        None => Trainable::new(basis, parameters.size)?,
    };
    return Ok(Box::new(trainable));
}

impl Default for Registry {
    fn default() -> Registry {
        DEFAULT_REGISTRY.clone()
    }
}

impl Registry {
    /// Create a registry without any strategy
    pub fn empty() -> Registry {
        Registry {
            radial: BTreeMap::new(),
            angular: BTreeMap::new(),
            species: BTreeMap::new(),
            cutoff: BTreeMap::new(),
        }
    }

    /// Register a new radial embedding with the given `name`. The `create`
    /// function gets the deserialized parameters and this registry, to create
    /// nested strategies if needed.
    pub fn register_radial<P, F>(&mut self, name: &str, create: F) -> Result<(), Error> where
        P: DeserializeOwned + schemars::JsonSchema,
        F: Fn(P, &Registry) -> Result<Box<dyn RadialEmbedding>, Error> + Send + Sync + 'static,
    {
        insert(&mut self.radial, StrategyKind::Radial, name, create)
    }

    /// Register a new angular embedding with the given `name`
    pub fn register_angular<P, F>(&mut self, name: &str, create: F) -> Result<(), Error> where
        P: DeserializeOwned + schemars::JsonSchema,
        F: Fn(P, &Registry) -> Result<Box<dyn AngularEmbedding>, Error> + Send + Sync + 'static,
    {
        insert(&mut self.angular, StrategyKind::Angular, name, create)
    }

    /// Register a new species embedding with the given `name`
    pub fn register_species<P, F>(&mut self, name: &str, create: F) -> Result<(), Error> where
        P: DeserializeOwned + schemars::JsonSchema,
        F: Fn(P, &Registry) -> Result<Box<dyn SpeciesEmbedding>, Error> + Send + Sync + 'static,
    {
        insert(&mut self.species, StrategyKind::Species, name, create)
    }

    /// Register a new cutoff function with the given `name`
    pub fn register_cutoff<P, F>(&mut self, name: &str, create: F) -> Result<(), Error> where
        P: DeserializeOwned + schemars::JsonSchema,
        F: Fn(P, &Registry) -> Result<Box<dyn CutoffFunction>, Error> + Send + Sync + 'static,
    {
        insert(&mut self.cutoff, StrategyKind::Cutoff, name, create)
    }

    /// Get the names of all registered strategies of the given `kind`
    pub fn names(&self, kind: StrategyKind) -> Vec<&str> {
        match kind {
            StrategyKind::Radial => self.radial.keys().map(|k| &**k).collect(),
            StrategyKind::Angular => self.angular.keys().map(|k| &**k).collect(),
            StrategyKind::Species => self.species.keys().map(|k| &**k).collect(),
            StrategyKind::Cutoff => self.cutoff.keys().map(|k| &**k).collect(),
        }
    }

    /// Get the JSON schema for the parameters of the strategy with the given
    /// `kind` and `name`
    pub fn json_schema(&self, kind: StrategyKind, name: &str) -> Result<RootSchema, Error> {
        let schema = match kind {
            StrategyKind::Radial => lookup(&self.radial, kind, name)?.schema,
            StrategyKind::Angular => lookup(&self.angular, kind, name)?.schema,
            StrategyKind::Species => lookup(&self.species, kind, name)?.schema,
            StrategyKind::Cutoff => lookup(&self.cutoff, kind, name)?.schema,
        };
        return Ok(schema());
    }

    /// Create a radial embedding from its `{"Name": {parameters}}` definition
    pub fn create_radial(&self, json: &Value) -> Result<Box<dyn RadialEmbedding>, Error> {
        let (name, parameters) = split_name(StrategyKind::Radial, json)?;
        let entry = lookup(&self.radial, StrategyKind::Radial, name)?;
        (entry.create)(parameters, self)
    }

    /// Create an angular embedding from its `{"Name": {parameters}}` definition
    pub fn create_angular(&self, json: &Value) -> Result<Box<dyn AngularEmbedding>, Error> {
        let (name, parameters) = split_name(StrategyKind::Angular, json)?;
        let entry = lookup(&self.angular, StrategyKind::Angular, name)?;
        (entry.create)(parameters, self)
    }

    /// Create a species embedding from its `{"Name": {parameters}}` definition
    pub fn create_species(&self, json: &Value) -> Result<Box<dyn SpeciesEmbedding>, Error> {
        let (name, parameters) = split_name(StrategyKind::Species, json)?;
        let entry = lookup(&self.species, StrategyKind::Species, name)?;
        (entry.create)(parameters, self)
    }

    /// Create a cutoff function from its `{"Name": {parameters}}` definition
    pub fn create_cutoff(&self, json: &Value) -> Result<Box<dyn CutoffFunction>, Error> {
        let (name, parameters) = split_name(StrategyKind::Cutoff, json)?;
        let entry = lookup(&self.cutoff, StrategyKind::Cutoff, name)?;
        (entry.create)(parameters, self)
    }

    /// Create a full spherical expansion from its JSON description
    pub fn build(&self, json: &str) -> Result<SphericalExpansion, Error> {
        let parameters = serde_json::from_str::<ExpansionParameters>(json)?;
        self.build_from_parameters(&parameters)
    }

    /// Create a full spherical expansion from already parsed parameters
    pub fn build_from_parameters(&self, parameters: &ExpansionParameters) -> Result<SphericalExpansion, Error> {
        SphericalExpansion::new(
            parameters.cutoff,
            parameters.max_angular,
            self.create_radial(&parameters.radial)?,
            self.create_angular(&parameters.angular)?,
            self.create_species(&parameters.species)?,
            self.create_cutoff(&parameters.cutoff_function)?,
        )
    }
}
