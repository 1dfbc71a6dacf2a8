//! Declarative model definition files.
//!
//! Models that have no Rust type can be declared in YAML (or JSON, which is valid
//! YAML) and loaded into a registry at startup:
//!
//! ```yaml
//! models:
//!   Product:
//!     fields:
//!       id:
//!         default: 0
//!         rules: [required, { range: { min: 1, max: 100 } }]
//!       name:
//!         default: ""
//!         rules: [required, { string_length: { min: 1, max: 40 } }]
//!       note:
//!         rules: [optional]
//!       address:
//!         model: Address
//!   Address:
//!     fields:
//!       street: { default: "" }
//! ```
//!
//! `default` becomes the field's value in the model template (`null` when omitted);
//! `model` makes the field a nested model.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::RuleDefinitionError;
use crate::metadata::{MetadataRegistry, OwnerType};
use crate::rules::RuleSpec;
use crate::validator::ModelRef;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelFile {
    #[serde(default)]
    pub models: BTreeMap<String, ModelDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDef {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Name of another model in the same file.
    #[serde(default)]
    pub model: Option<String>,
}

impl ModelFile {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid model definition document")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model definitions {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("failed to parse model definitions {}", path.display()))
    }

    /// Register every model's rules and nested references.
    ///
    /// Nothing is written to `registry` unless the whole file is valid.
    pub fn register(&self, registry: &mut MetadataRegistry) -> Result<(), RuleDefinitionError> {
        self.check_references()?;

        let mut staged = registry.clone();
        for (name, model) in &self.models {
            let mut declared = staged.model_named(name);
            for (field, def) in &model.fields {
                for spec in &def.rules {
                    let rule = spec.build(field)?;
                    declared.rule(field, rule)?;
                }
                if let Some(target) = &def.model {
                    declared.nested_owner(field, OwnerType::named(target));
                }
            }
        }
        *registry = staged;
        Ok(())
    }

    /// Body model reference for a declared model, with nested templates expanded.
    #[must_use]
    pub fn model_ref(&self, name: &str) -> Option<ModelRef> {
        let template = self.template(name, &mut Vec::new())?;
        Some(ModelRef::named(OwnerType::named(name), template))
    }

    #[must_use]
    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    fn template<'a>(&'a self, name: &'a str, stack: &mut Vec<&'a str>) -> Option<Value> {
        let model = self.models.get(name)?;
        stack.push(name);
        let mut object = Map::new();
        for (field, def) in &model.fields {
            let value = match def.model.as_deref() {
                Some(target) if !stack.contains(&target) => self
                    .template(target, stack)
                    .unwrap_or_else(|| def.default.clone()),
                _ => def.default.clone(),
            };
            object.insert(field.clone(), value);
        }
        stack.pop();
        Some(Value::Object(object))
    }

    fn check_references(&self) -> Result<(), RuleDefinitionError> {
        for (name, model) in &self.models {
            for (field, def) in &model.fields {
                let Some(target) = def.model.as_deref() else {
                    continue;
                };
                if !self.models.contains_key(target) {
                    return Err(RuleDefinitionError::UnknownModel {
                        model: name.clone(),
                        field: field.clone(),
                        target: target.to_string(),
                    });
                }
                if self.reaches(target, name, &mut Vec::new()) {
                    return Err(RuleDefinitionError::CyclicModel {
                        model: name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn reaches<'a>(&'a self, from: &'a str, goal: &str, seen: &mut Vec<&'a str>) -> bool {
        if from == goal {
            return true;
        }
        if seen.contains(&from) {
            return false;
        }
        seen.push(from);
        self.models.get(from).is_some_and(|model| {
            model
                .fields
                .values()
                .filter_map(|def| def.model.as_deref())
                .any(|next| self.reaches(next, goal, seen))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleKind;
    use serde_json::json;

    const PRODUCTS: &str = r#"
models:
  Product:
    fields:
      id:
        default: 0
        rules: [required, { range: { min: 1, max: 100 } }]
      note:
        rules: [optional]
      address:
        model: Address
  Address:
    fields:
      street: { default: "" }
"#;

    #[test]
    fn test_register_and_template() {
        let file = ModelFile::from_yaml_str(PRODUCTS).unwrap();
        let mut reg = MetadataRegistry::new();
        file.register(&mut reg).unwrap();

        let owner = OwnerType::named("Product");
        let kinds: Vec<RuleKind> = reg.field_rules(&owner).iter().map(|(_, r)| r.kind()).collect();
        assert_eq!(kinds, vec![RuleKind::Required, RuleKind::Range, RuleKind::Optional]);
        assert_eq!(reg.nested_owner(&owner, "address"), Some(&OwnerType::named("Address")));

        let template = file
            .model_ref("Product")
            .unwrap()
            .into_schema()
            .instantiate()
            .unwrap();
        assert_eq!(template, json!({"address": {"street": ""}, "id": 0, "note": null}));
    }

    #[test]
    fn test_unknown_nested_model() {
        let file = ModelFile::from_yaml_str("models:\n  A:\n    fields:\n      b: { model: Missing }\n").unwrap();
        let mut reg = MetadataRegistry::new();
        let err = file.register(&mut reg).unwrap_err();
        assert!(matches!(err, RuleDefinitionError::UnknownModel { target, .. } if target == "Missing"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let text = "models:\n  A:\n    fields:\n      b: { model: B }\n  B:\n    fields:\n      a: { model: A }\n";
        let file = ModelFile::from_yaml_str(text).unwrap();
        let err = file.register(&mut MetadataRegistry::new()).unwrap_err();
        assert!(matches!(err, RuleDefinitionError::CyclicModel { .. }));
    }

    #[test]
    fn test_bad_rule_leaves_registry_untouched() {
        let text = "models:\n  A:\n    fields:\n      x: { rules: [required, { range: { min: 5, max: 1 } }] }\n";
        let file = ModelFile::from_yaml_str(text).unwrap();
        let mut reg = MetadataRegistry::new();
        assert!(file.register(&mut reg).is_err());
        assert!(reg.is_empty());
    }
}
