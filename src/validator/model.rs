use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ConfigError, SchemaError};
use crate::metadata::OwnerType;

type ModelFactory = Arc<dyn Fn() -> Result<Value, SchemaError> + Send + Sync>;

/// Reference to the model an endpoint body is validated against.
///
/// A model is a JSON template: its object keys are the expected payload keys and
/// nested objects are nested shapes. Rules come from the metadata registry under the
/// reference's [`OwnerType`].
#[derive(Clone)]
pub enum ModelRef {
    /// Build a fresh template per request from `T::default()`.
    Constructor { owner: OwnerType, factory: ModelFactory },
    /// A template captured once when the endpoint is declared.
    Instance { owner: OwnerType, template: Value },
}

impl ModelRef {
    #[must_use]
    pub fn constructor<T>() -> Self
    where
        T: Default + Serialize + 'static,
    {
        let owner = OwnerType::of::<T>();
        let name = owner.name().to_string();
        let factory: ModelFactory = Arc::new(move || {
            serde_json::to_value(T::default()).map_err(|err| SchemaError::ModelConstruction {
                owner: name.clone(),
                message: err.to_string(),
            })
        });
        ModelRef::Constructor { owner, factory }
    }

    pub fn instance<T>(value: &T) -> Result<Self, ConfigError>
    where
        T: Serialize + 'static,
    {
        let owner = OwnerType::of::<T>();
        let template = serde_json::to_value(value).map_err(|source| ConfigError::BodyModel {
            owner: owner.name().to_string(),
            source,
        })?;
        Ok(ModelRef::Instance { owner, template })
    }

    /// A model without a Rust type, e.g. loaded from a model definition file.
    #[must_use]
    pub fn named(owner: OwnerType, template: Value) -> Self {
        ModelRef::Instance { owner, template }
    }

    #[must_use]
    pub fn owner(&self) -> &OwnerType {
        match self {
            ModelRef::Constructor { owner, .. } | ModelRef::Instance { owner, .. } => owner,
        }
    }

    #[must_use]
    pub fn into_schema(self) -> BodySchema {
        match self {
            ModelRef::Constructor { owner, factory } => BodySchema { owner, factory },
            ModelRef::Instance { owner, template } => BodySchema {
                owner,
                factory: Arc::new(move || Ok(template.clone())),
            },
        }
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelRef::Constructor { owner, .. } => f.debug_tuple("Constructor").field(owner).finish(),
            ModelRef::Instance { owner, .. } => f.debug_tuple("Instance").field(owner).finish(),
        }
    }
}

/// Resolved body model attached to an endpoint.
#[derive(Clone)]
pub struct BodySchema {
    owner: OwnerType,
    factory: ModelFactory,
}

impl BodySchema {
    #[must_use]
    pub fn owner(&self) -> &OwnerType {
        &self.owner
    }

    /// A fresh model template.
    pub fn instantiate(&self) -> Result<Value, SchemaError> {
        (self.factory)()
    }
}

impl fmt::Debug for BodySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySchema").field("owner", &self.owner).finish()
    }
}
