use serde_json::{Map, Value};
use tracing::debug;

use crate::controller::ContentType;
use crate::error::{ApplicationError, SchemaError};
use crate::metadata::{MetadataRegistry, OwnerType};
use crate::rules::RuleKind;
use crate::server::HttpRequest;

use super::model::BodySchema;
use super::report::ValidationReport;

pub const JSON_CONTENT_TYPE_REQUIRED: &str = "Expected Content-Type header of application/json";
pub const INCOMPATIBLE_BODY: &str = "Incompatible body types";

/// Validate a payload against a body model.
///
/// Two passes, both feeding one report:
///
/// 1. shape: every key of the model template must be present in the payload,
///    unless the model marks it `Optional`. Nested object templates are walked
///    recursively when the payload has the key.
/// 2. rules: the model's top-level field rules run against present keys,
///    `Required` rules first.
///
/// `Err` means validation itself could not complete (a rule met a value of the
/// wrong type, or the template could not be built).
pub fn validate(
    payload: &Value,
    schema: &BodySchema,
    registry: &MetadataRegistry,
) -> Result<ValidationReport, SchemaError> {
    let template = schema.instantiate()?;
    let mut report = ValidationReport::new();
    walk_shape(
        payload,
        &template,
        Some(schema.owner()),
        "",
        registry,
        &mut report,
    );
    apply_rules(payload, schema.owner(), registry, &mut report)?;
    Ok(report)
}

fn walk_shape(
    target: &Value,
    template: &Value,
    owner: Option<&OwnerType>,
    path: &str,
    registry: &MetadataRegistry,
    report: &mut ValidationReport,
) {
    let Some(expected) = template.as_object() else {
        return;
    };
    if expected.is_empty() {
        return;
    }
    if target.is_null() {
        report.push_missing(null_message(path));
        return;
    }

    let present: Option<&Map<String, Value>> = target.as_object();
    for (key, child_template) in expected {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        let optional = owner.is_some_and(|o| registry.is_optional(o, key));

        match present.and_then(|object| object.get(key)) {
            None if optional => {}
            None => report.push_missing(format!(
                "Missing or undefined property in payload: {child_path}"
            )),
            Some(child) if child_template.is_object() => {
                let nested = owner.and_then(|o| registry.nested_owner(o, key));
                walk_shape(child, child_template, nested, &child_path, registry, report);
            }
            Some(_) => {}
        }
    }
}

fn null_message(path: &str) -> String {
    if path.is_empty() {
        "Invalid schema error: Object expected, received null".to_string()
    } else {
        format!("Invalid schema error: Object expected, received null at: {path}")
    }
}

fn apply_rules(
    payload: &Value,
    owner: &OwnerType,
    registry: &MetadataRegistry,
    report: &mut ValidationReport,
) -> Result<(), SchemaError> {
    let Some(object) = payload.as_object() else {
        return Ok(());
    };

    let mut rules = registry.field_rules(owner);
    // Stable: declaration order is kept within each group.
    rules.sort_by_key(|(_, rule)| rule.kind() != RuleKind::Required);

    for (field, rule) in rules {
        let Some(value) = object.get(field) else {
            continue;
        };
        if !rule.evaluate(field, value)? {
            report.push_invalid(rule.failure_message(field));
        }
    }
    Ok(())
}

/// Request-level body validation as run before an endpoint with a body model.
///
/// Requires a JSON content type; an absent body is validated as `{}`.
pub fn validate_body(
    request: &HttpRequest,
    schema: &BodySchema,
    registry: &MetadataRegistry,
) -> Result<(), ApplicationError> {
    if !ContentType::Json.accepts(request.content_type()) {
        return Err(ApplicationError::bad_request(JSON_CONTENT_TYPE_REQUIRED));
    }

    let empty = Value::Object(Map::new());
    let payload = request.body.as_ref().unwrap_or(&empty);
    if !(payload.is_object() || payload.is_null()) {
        return Err(ApplicationError::bad_request(INCOMPATIBLE_BODY));
    }

    let report = validate(payload, schema, registry)?;
    match report.to_message() {
        None => Ok(()),
        Some(message) => {
            debug!(
                model = %schema.owner(),
                missing = report.missing().len(),
                invalid = report.invalid().len(),
                "body validation failed"
            );
            Err(ApplicationError::bad_request(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use crate::validator::ModelRef;
    use serde_json::json;

    fn schema(name: &str, template: Value) -> BodySchema {
        ModelRef::named(OwnerType::named(name), template).into_schema()
    }

    #[test]
    fn test_missing_keys_are_all_reported() {
        let reg = MetadataRegistry::new();
        let schema = schema("Pair", json!({"id": 0, "value": ""}));
        let report = validate(&json!({}), &schema, &reg).unwrap();
        assert_eq!(
            report.missing(),
            [
                "Missing or undefined property in payload: id",
                "Missing or undefined property in payload: value"
            ]
        );
    }

    #[test]
    fn test_optional_key_may_be_absent() {
        let mut reg = MetadataRegistry::new();
        reg.model_named("Note").rule("note", Rule::Optional).unwrap();
        let schema = schema("Note", json!({"note": ""}));
        assert!(validate(&json!({}), &schema, &reg).unwrap().is_empty());
    }

    #[test]
    fn test_nested_null_and_missing_paths() {
        let reg = MetadataRegistry::new();
        let schema = schema("Customer", json!({"address": {"street": "", "geo": {"lat": 0}}}));

        let report = validate(&json!({"address": null}), &schema, &reg).unwrap();
        assert_eq!(
            report.missing(),
            ["Invalid schema error: Object expected, received null at: address"]
        );

        let report = validate(&json!({"address": {"geo": {}}}), &schema, &reg).unwrap();
        assert_eq!(
            report.missing(),
            [
                "Missing or undefined property in payload: address.geo.lat",
                "Missing or undefined property in payload: address.street"
            ]
        );
    }

    #[test]
    fn test_nested_optional_follows_nested_link() {
        let template = json!({"address": {"street": "", "line2": ""}});
        let payload = json!({"address": {"street": "x"}});

        let mut reg = MetadataRegistry::new();
        reg.model_named("Address").rule("line2", Rule::Optional).unwrap();
        reg.model_named("Customer")
            .nested_owner("address", OwnerType::named("Address"));
        let report = validate(&payload, &schema("Customer", template.clone()), &reg).unwrap();
        assert!(report.is_empty());

        let mut unlinked = MetadataRegistry::new();
        unlinked.model_named("Address").rule("line2", Rule::Optional).unwrap();
        let report = validate(&payload, &schema("Customer", template), &unlinked).unwrap();
        assert_eq!(
            report.missing(),
            ["Missing or undefined property in payload: address.line2"]
        );
    }

    #[test]
    fn test_required_rules_run_first() {
        let mut reg = MetadataRegistry::new();
        reg.model_named("Pair")
            .rule("id", Rule::range(1.0, 5.0))
            .unwrap()
            .rule("value", Rule::Required)
            .unwrap();
        let schema = schema("Pair", json!({"id": 0, "value": ""}));
        let report = validate(&json!({"id": 9, "value": ""}), &schema, &reg).unwrap();
        assert_eq!(
            report.invalid(),
            [
                "Invalid format parameter [value] was not supplied",
                "Invalid format [Range] on id"
            ]
        );
    }

    #[test]
    fn test_type_mismatch_is_schema_error() {
        let mut reg = MetadataRegistry::new();
        reg.model_named("Pair").rule("id", Rule::range(1.0, 5.0)).unwrap();
        let schema = schema("Pair", json!({"id": 0}));
        let err = validate(&json!({"id": "three"}), &schema, &reg).unwrap_err();
        assert!(matches!(err, SchemaError::ValueType { expected: "numeric", .. }));
    }
}
