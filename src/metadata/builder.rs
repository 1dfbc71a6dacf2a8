use crate::controller::{ControllerOptions, EndpointOptions, HttpVerb};
use crate::error::RuleDefinitionError;
use crate::rules::Rule;

use super::core::{MetadataKey, MetadataPayload, MetadataRegistry, OwnerType};

impl MetadataRegistry {
    /// Declare `C` as a controller and start declaring its endpoints.
    ///
    /// ```ignore
    /// registry
    ///     .controller::<ProductsController>(ControllerOptions::new())
    ///     .endpoint("default", HttpVerb::Get, EndpointOptions::new().params(":id?"))
    ///     .endpoint("delete", HttpVerb::Delete, EndpointOptions::new().params(":id"));
    /// ```
    pub fn controller<C: ?Sized + 'static>(
        &mut self,
        options: ControllerOptions,
    ) -> ControllerRegistration<'_> {
        self.controller_for(OwnerType::of::<C>(), options)
    }

    pub fn controller_for(
        &mut self,
        owner: OwnerType,
        options: ControllerOptions,
    ) -> ControllerRegistration<'_> {
        self.define(
            owner.clone(),
            MetadataKey::Controller,
            MetadataPayload::Controller(options),
        );
        ControllerRegistration {
            registry: self,
            owner,
        }
    }

    /// Start declaring field rules on the model type `T`.
    pub fn model<T: ?Sized + 'static>(&mut self) -> ModelRegistration<'_> {
        ModelRegistration {
            registry: self,
            owner: OwnerType::of::<T>(),
        }
    }

    pub fn model_named(&mut self, name: &str) -> ModelRegistration<'_> {
        ModelRegistration {
            registry: self,
            owner: OwnerType::named(name),
        }
    }
}

/// Builder returned by [`MetadataRegistry::controller`].
pub struct ControllerRegistration<'a> {
    registry: &'a mut MetadataRegistry,
    owner: OwnerType,
}

impl ControllerRegistration<'_> {
    /// Declare one verb on one member. Repeat the call for several verbs.
    pub fn endpoint(&mut self, member: &str, verb: HttpVerb, options: EndpointOptions) -> &mut Self {
        self.registry.define(
            self.owner.clone(),
            MetadataKey::Endpoint {
                member: member.to_string(),
                verb,
            },
            MetadataPayload::Endpoint(options),
        );
        self
    }

    #[must_use]
    pub fn owner(&self) -> &OwnerType {
        &self.owner
    }
}

/// Builder returned by [`MetadataRegistry::model`].
pub struct ModelRegistration<'a> {
    registry: &'a mut MetadataRegistry,
    owner: OwnerType,
}

impl ModelRegistration<'_> {
    /// Attach a rule to a field. Rule options are checked here, so a malformed
    /// rule never reaches request time.
    pub fn rule(&mut self, field: &str, rule: Rule) -> Result<&mut Self, RuleDefinitionError> {
        rule.check(field)?;
        self.registry.define(
            self.owner.clone(),
            MetadataKey::Field {
                kind: rule.kind(),
                member: field.to_string(),
            },
            MetadataPayload::Rule(rule),
        );
        Ok(self)
    }

    pub fn rules(
        &mut self,
        field: &str,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<&mut Self, RuleDefinitionError> {
        for rule in rules {
            self.rule(field, rule)?;
        }
        Ok(self)
    }

    /// Field `field` holds a value of model `U`; its rules are applied when nested
    /// shapes are walked.
    pub fn nested<U: ?Sized + 'static>(&mut self, field: &str) -> &mut Self {
        self.nested_owner(field, OwnerType::of::<U>())
    }

    pub fn nested_owner(&mut self, field: &str, target: OwnerType) -> &mut Self {
        self.registry.define(
            self.owner.clone(),
            MetadataKey::Nested {
                member: field.to_string(),
            },
            MetadataPayload::Nested(target),
        );
        self
    }

    #[must_use]
    pub fn owner(&self) -> &OwnerType {
        &self.owner
    }
}
