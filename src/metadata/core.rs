use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::controller::{ControllerOptions, EndpointOptions, HttpVerb};
use crate::rules::{Rule, RuleKind};

/// Identity of a metadata target: a Rust type or a named declarative model.
///
/// Equality and hashing use the full key; [`OwnerType::name`] is the short display
/// name used for controller route derivation and messages.
#[derive(Clone)]
pub struct OwnerType {
    key: Arc<str>,
    name: Arc<str>,
}

impl OwnerType {
    /// Owner for a Rust type. Keyed by the fully qualified type path.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = type_name::<T>();
        Self {
            key: Arc::from(full),
            name: Arc::from(short_type_name(full)),
        }
    }

    /// Owner for a model defined outside Rust (model definition files).
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            key: Arc::from(format!("model::{name}")),
            name: Arc::from(name),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for OwnerType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for OwnerType {}

impl Hash for OwnerType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnerType").field(&self.key).finish()
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `my_crate::api::ProductsController<T>` -> `ProductsController`
fn short_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Typed key of one metadata entry within an owner's namespace.
///
/// Several kinds share the namespace; enumeration plus filtering on the kind
/// discovers e.g. every endpoint of a controller without a dedicated index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// Controller options for the owner itself.
    Controller,
    /// One HTTP verb declared on one controller member.
    Endpoint { member: String, verb: HttpVerb },
    /// One validation rule on one model field.
    Field { kind: RuleKind, member: String },
    /// A model field whose value is itself a registered model.
    Nested { member: String },
}

impl MetadataKey {
    #[must_use]
    pub fn kind_prefix(&self) -> &'static str {
        match self {
            MetadataKey::Controller => "controller",
            MetadataKey::Endpoint { .. } => "endpoint",
            MetadataKey::Field { .. } => "rule",
            MetadataKey::Nested { .. } => "nested",
        }
    }

    /// Member name the key refers to, if any.
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        match self {
            MetadataKey::Controller => None,
            MetadataKey::Endpoint { member, .. }
            | MetadataKey::Field { member, .. }
            | MetadataKey::Nested { member } => Some(member),
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataKey::Controller => f.write_str("controller"),
            MetadataKey::Endpoint { member, verb } => write!(f, "endpoint:{member}:{verb}"),
            MetadataKey::Field { kind, member } => write!(f, "rule:{}:{member}", kind.prefix()),
            MetadataKey::Nested { member } => write!(f, "nested:{member}"),
        }
    }
}

/// Payload stored against a key.
#[derive(Debug, Clone)]
pub enum MetadataPayload {
    Controller(ControllerOptions),
    Endpoint(EndpointOptions),
    Rule(Rule),
    Nested(OwnerType),
}

#[derive(Debug, Clone)]
pub struct MetadataEntry {
    pub owner: OwnerType,
    pub key: MetadataKey,
    pub payload: MetadataPayload,
}

/// Append-only metadata table.
///
/// Entries live in a single arena; a per-owner index lists the arena positions in
/// insertion order. Duplicate keys are kept: [`MetadataRegistry::query`] returns the
/// last write, [`MetadataRegistry::query_all`] lists each key once.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: Vec<MetadataEntry>,
    index: HashMap<OwnerType, Vec<usize>>,
}

impl MetadataRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. There is no removal.
    pub fn define(&mut self, owner: OwnerType, key: MetadataKey, payload: MetadataPayload) {
        tracing::trace!(owner = %owner, key = %key, "metadata defined");
        let position = self.entries.len();
        self.index.entry(owner.clone()).or_default().push(position);
        self.entries.push(MetadataEntry {
            owner,
            key,
            payload,
        });
    }

    /// Distinct keys defined for `owner`, in first-insertion order.
    #[must_use]
    pub fn query_all(&self, owner: &OwnerType) -> Vec<&MetadataKey> {
        let mut keys: Vec<&MetadataKey> = Vec::new();
        for entry in self.entries_for(owner) {
            if !keys.contains(&&entry.key) {
                keys.push(&entry.key);
            }
        }
        keys
    }

    /// Payload for an exact key. Last write wins.
    #[must_use]
    pub fn query(&self, owner: &OwnerType, key: &MetadataKey) -> Option<&MetadataPayload> {
        self.entries_for(owner)
            .filter(|entry| &entry.key == key)
            .last()
            .map(|entry| &entry.payload)
    }

    /// All raw entries for `owner`, duplicates included, in insertion order.
    pub fn entries_for<'a>(
        &'a self,
        owner: &OwnerType,
    ) -> impl Iterator<Item = &'a MetadataEntry> + 'a {
        self.index
            .get(owner)
            .map(|positions| positions.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&position| self.entries.get(position))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn controller_options(&self, owner: &OwnerType) -> Option<&ControllerOptions> {
        match self.query(owner, &MetadataKey::Controller)? {
            MetadataPayload::Controller(options) => Some(options),
            _ => None,
        }
    }

    /// Endpoint keys of a controller with their effective options.
    #[must_use]
    pub fn endpoints(&self, owner: &OwnerType) -> Vec<(&str, HttpVerb, &EndpointOptions)> {
        self.query_all(owner)
            .into_iter()
            .filter_map(|key| match key {
                MetadataKey::Endpoint { member, verb } => match self.query(owner, key)? {
                    MetadataPayload::Endpoint(options) => Some((member.as_str(), *verb, options)),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    /// Field rules of a model, one per (kind, field), in first-declaration order.
    #[must_use]
    pub fn field_rules(&self, owner: &OwnerType) -> Vec<(&str, &Rule)> {
        self.query_all(owner)
            .into_iter()
            .filter_map(|key| match key {
                MetadataKey::Field { member, .. } => match self.query(owner, key)? {
                    MetadataPayload::Rule(rule) => Some((member.as_str(), rule)),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn is_optional(&self, owner: &OwnerType, member: &str) -> bool {
        self.entries_for(owner).any(|entry| {
            matches!(
                &entry.key,
                MetadataKey::Field { kind: RuleKind::Optional, member: m } if m == member
            )
        })
    }

    #[must_use]
    pub fn nested_owner(&self, owner: &OwnerType, member: &str) -> Option<&OwnerType> {
        let key = MetadataKey::Nested {
            member: member.to_string(),
        };
        match self.query(owner, &key)? {
            MetadataPayload::Nested(target) => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;
    mod inner {
        pub struct Gadget<T>(pub T);
    }

    #[test]
    fn test_owner_short_name() {
        assert_eq!(OwnerType::of::<Widget>().name(), "Widget");
        assert_eq!(OwnerType::of::<inner::Gadget<u8>>().name(), "Gadget");
        assert_eq!(OwnerType::named("Product").name(), "Product");
        assert_ne!(OwnerType::named("Widget"), OwnerType::of::<Widget>());
    }

    #[test]
    fn test_last_write_wins_and_keys_are_distinct() {
        let owner = OwnerType::of::<Widget>();
        let mut reg = MetadataRegistry::new();
        let key = MetadataKey::Field {
            kind: RuleKind::Range,
            member: "id".to_string(),
        };
        reg.define(owner.clone(), key.clone(), MetadataPayload::Rule(Rule::range(1.0, 2.0)));
        reg.define(
            owner.clone(),
            MetadataKey::Field {
                kind: RuleKind::Required,
                member: "id".to_string(),
            },
            MetadataPayload::Rule(Rule::Required),
        );
        reg.define(owner.clone(), key.clone(), MetadataPayload::Rule(Rule::range(1.0, 9.0)));

        assert_eq!(reg.len(), 3);
        assert_eq!(reg.query_all(&owner).len(), 2);
        match reg.query(&owner, &key) {
            Some(MetadataPayload::Rule(Rule::Range(bound))) => assert!(bound.contains(9.0)),
            other => panic!("unexpected payload {other:?}"),
        }
        let rules = reg.field_rules(&owner);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].1.kind(), RuleKind::Range);
    }

    #[test]
    fn test_key_display_uses_colon_form() {
        let key = MetadataKey::Endpoint {
            member: "default".to_string(),
            verb: HttpVerb::Get,
        };
        assert_eq!(key.to_string(), "endpoint:default:GET");
        assert_eq!(key.kind_prefix(), "endpoint");
        let key = MetadataKey::Field {
            kind: RuleKind::StringLength,
            member: "name".to_string(),
        };
        assert_eq!(key.to_string(), "rule:strlength:name");
    }

    #[test]
    fn test_unknown_owner_is_empty() {
        let reg = MetadataRegistry::new();
        assert!(reg.query_all(&OwnerType::of::<Widget>()).is_empty());
        assert!(reg.controller_options(&OwnerType::of::<Widget>()).is_none());
    }
}
