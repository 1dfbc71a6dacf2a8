//! # Rule Vocabulary
//!
//! The fixed set of field-level validation rules a body model can carry:
//! `Required`, `Optional`, `Email`, `Range`, `StringLength` and `RegexMatch`.
//!
//! Rules are immutable once registered. A field may carry several of them
//! (for example `Required` + `StringLength`); each is stored as its own metadata
//! entry and evaluated independently.
//!
//! ## Truthiness
//!
//! `Required` is a truthiness check, not a presence check: `null`, `false`, `0` and
//! `""` all fail it even though the key exists. Every other rule treats a falsy value
//! as valid, so an empty optional email is not an `Email` failure.
//!
//! ## Declarative form
//!
//! [`RuleSpec`] is the serde representation used by model definition files:
//!
//! ```yaml
//! rules:
//!   - required
//!   - range: { min: 1, max: 5 }
//!   - string_length: positive
//!   - regex: "^[a-z]+$"
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{RuleDefinitionError, SchemaError};

/// `local@domain.tld` or `local@[a.b.c.d]`, optionally with a quoted local part.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email regex should be valid")
});

/// Discriminant of a [`Rule`], used in metadata keys and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKind {
    Required,
    Optional,
    Email,
    Range,
    StringLength,
    RegexMatch,
}

impl RuleKind {
    /// Label used inside `Invalid format [<label>]` messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RuleKind::Required => "Required",
            RuleKind::Optional => "Optional",
            RuleKind::Email => "Email",
            RuleKind::Range => "Range",
            RuleKind::StringLength => "StringLength",
            RuleKind::RegexMatch => "Regex",
        }
    }

    /// Short prefix used when a metadata key is rendered as a string.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Optional => "optional",
            RuleKind::Email => "email",
            RuleKind::Range => "range",
            RuleKind::StringLength => "strlength",
            RuleKind::RegexMatch => "regex",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Predicate form of a numeric bound.
pub type BoundPredicate = Arc<dyn Fn(f64) -> bool + Send + Sync>;

/// Inclusive `[min, max]` bounds or a predicate, shared by `Range` (value) and
/// `StringLength` (length).
#[derive(Clone)]
pub enum NumericBound {
    Bounds { min: f64, max: f64 },
    Predicate(BoundPredicate),
}

impl NumericBound {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        match self {
            NumericBound::Bounds { min, max } => value >= *min && value <= *max,
            NumericBound::Predicate(pred) => pred(value),
        }
    }

    /// Wrap a closure as a predicate bound.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(f64) -> bool + Send + Sync + 'static,
    {
        NumericBound::Predicate(Arc::new(f))
    }

    fn check(&self, kind: RuleKind, field: &str) -> Result<(), RuleDefinitionError> {
        if let NumericBound::Bounds { min, max } = self {
            if min.is_nan() || max.is_nan() {
                return Err(RuleDefinitionError::InvalidOptions {
                    kind,
                    field: field.to_string(),
                    detail: "bounds must be numbers".to_string(),
                });
            }
            if min > max {
                return Err(RuleDefinitionError::InvertedBounds {
                    kind,
                    field: field.to_string(),
                    min: *min,
                    max: *max,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NumericBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericBound::Bounds { min, max } => f
                .debug_struct("Bounds")
                .field("min", min)
                .field("max", max)
                .finish(),
            NumericBound::Predicate(_) => write!(f, "Predicate(<function>)"),
        }
    }
}

/// A single field-level validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    Optional,
    Email,
    Range(NumericBound),
    StringLength(NumericBound),
    RegexMatch(Regex),
}

impl Rule {
    #[must_use]
    pub fn range(min: f64, max: f64) -> Self {
        Rule::Range(NumericBound::Bounds { min, max })
    }

    #[must_use]
    pub fn string_length(min: usize, max: usize) -> Self {
        Rule::StringLength(NumericBound::Bounds {
            min: min as f64,
            max: max as f64,
        })
    }

    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Required => RuleKind::Required,
            Rule::Optional => RuleKind::Optional,
            Rule::Email => RuleKind::Email,
            Rule::Range(_) => RuleKind::Range,
            Rule::StringLength(_) => RuleKind::StringLength,
            Rule::RegexMatch(_) => RuleKind::RegexMatch,
        }
    }

    /// Reject definitions that can never be evaluated meaningfully.
    pub fn check(&self, field: &str) -> Result<(), RuleDefinitionError> {
        match self {
            Rule::Range(bound) => bound.check(RuleKind::Range, field),
            Rule::StringLength(bound) => bound.check(RuleKind::StringLength, field),
            _ => Ok(()),
        }
    }

    /// Evaluate the rule against a present value. `Ok(true)` means the value passes.
    ///
    /// `Optional` always passes; it only influences the shape walk.
    pub fn evaluate(&self, field: &str, value: &Value) -> Result<bool, SchemaError> {
        match self {
            Rule::Required => Ok(is_truthy(value)),
            Rule::Optional => Ok(true),
            Rule::Email => {
                if !is_truthy(value) {
                    return Ok(true);
                }
                Ok(value.as_str().is_some_and(|s| EMAIL_REGEX.is_match(s)))
            }
            Rule::Range(bound) => {
                if !is_truthy(value) {
                    return Ok(true);
                }
                let n = value.as_f64().ok_or_else(|| SchemaError::ValueType {
                    kind: RuleKind::Range,
                    field: field.to_string(),
                    expected: "numeric",
                })?;
                Ok(bound.contains(n))
            }
            Rule::StringLength(bound) => {
                if !is_truthy(value) {
                    return Ok(true);
                }
                let s = value.as_str().ok_or_else(|| SchemaError::ValueType {
                    kind: RuleKind::StringLength,
                    field: field.to_string(),
                    expected: "string",
                })?;
                Ok(bound.contains(s.chars().count() as f64))
            }
            Rule::RegexMatch(re) => {
                if !is_truthy(value) {
                    return Ok(true);
                }
                Ok(match value {
                    Value::String(s) => re.is_match(s),
                    other => re.is_match(&other.to_string()),
                })
            }
        }
    }

    /// Message appended to a report's `invalid` list when this rule fails.
    #[must_use]
    pub fn failure_message(&self, field: &str) -> String {
        match self.kind() {
            RuleKind::Required => format!("Invalid format parameter [{field}] was not supplied"),
            kind => format!("Invalid format [{}] on {field}", kind.label()),
        }
    }
}

/// JSON truthiness: `null`, `false`, zero and the empty string are falsy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Serde form of a rule as written in a model definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// Option-less rule: `required`, `optional`, `email`.
    Name(String),
    /// Single-key map from rule name to its options.
    WithOptions(BTreeMap<String, Value>),
}

impl RuleSpec {
    /// Build the runtime rule, surfacing malformed options as a definition error.
    pub fn build(&self, field: &str) -> Result<Rule, RuleDefinitionError> {
        let rule = match self {
            RuleSpec::Name(name) => match normalize(name).as_str() {
                "required" => Rule::Required,
                "optional" => Rule::Optional,
                "email" | "emailaddress" => Rule::Email,
                "range" => return Err(missing_options(RuleKind::Range, field)),
                "stringlength" | "strlength" => {
                    return Err(missing_options(RuleKind::StringLength, field))
                }
                "regex" | "regexmatch" => {
                    return Err(missing_options(RuleKind::RegexMatch, field))
                }
                _ => {
                    return Err(RuleDefinitionError::UnknownRule {
                        field: field.to_string(),
                        name: name.clone(),
                    })
                }
            },
            RuleSpec::WithOptions(map) => {
                let mut entries = map.iter();
                let (name, options) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(RuleDefinitionError::UnknownRule {
                            field: field.to_string(),
                            name: map.keys().cloned().collect::<Vec<_>>().join("+"),
                        })
                    }
                };
                match normalize(name).as_str() {
                    "required" => Rule::Required,
                    "optional" => Rule::Optional,
                    "email" | "emailaddress" => Rule::Email,
                    "range" => Rule::Range(bound_from_value(RuleKind::Range, field, options)?),
                    "stringlength" | "strlength" => Rule::StringLength(bound_from_value(
                        RuleKind::StringLength,
                        field,
                        options,
                    )?),
                    "regex" | "regexmatch" => {
                        let pattern = options.as_str().ok_or_else(|| {
                            RuleDefinitionError::InvalidOptions {
                                kind: RuleKind::RegexMatch,
                                field: field.to_string(),
                                detail: "expected a pattern string".to_string(),
                            }
                        })?;
                        let re = Regex::new(pattern).map_err(|source| {
                            RuleDefinitionError::InvalidPattern {
                                field: field.to_string(),
                                source,
                            }
                        })?;
                        Rule::RegexMatch(re)
                    }
                    _ => {
                        return Err(RuleDefinitionError::UnknownRule {
                            field: field.to_string(),
                            name: name.clone(),
                        })
                    }
                }
            }
        };
        rule.check(field)?;
        Ok(rule)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn missing_options(kind: RuleKind, field: &str) -> RuleDefinitionError {
    RuleDefinitionError::InvalidOptions {
        kind,
        field: field.to_string(),
        detail: "options are required".to_string(),
    }
}

/// `{min, max}` (or `{start, end}`) bounds, or the name of a built-in predicate.
fn bound_from_value(
    kind: RuleKind,
    field: &str,
    options: &Value,
) -> Result<NumericBound, RuleDefinitionError> {
    let invalid = |detail: &str| RuleDefinitionError::InvalidOptions {
        kind,
        field: field.to_string(),
        detail: detail.to_string(),
    };
    match options {
        Value::Object(map) => {
            let min = map.get("min").or_else(|| map.get("start"));
            let max = map.get("max").or_else(|| map.get("end"));
            match (min.and_then(Value::as_f64), max.and_then(Value::as_f64)) {
                (Some(min), Some(max)) => Ok(NumericBound::Bounds { min, max }),
                _ => Err(invalid("expected numeric min and max")),
            }
        }
        Value::String(name) => named_predicate(name)
            .ok_or_else(|| invalid("expected {min, max} bounds or a named predicate")),
        _ => Err(invalid("expected {min, max} bounds or a named predicate")),
    }
}

/// Built-in predicates available to declarative definitions.
fn named_predicate(name: &str) -> Option<NumericBound> {
    let bound = match normalize(name).as_str() {
        "positive" => NumericBound::predicate(|v| v > 0.0),
        "nonnegative" => NumericBound::predicate(|v| v >= 0.0),
        "nonzero" => NumericBound::predicate(|v| v != 0.0),
        "integer" => NumericBound::predicate(|v| v.fract() == 0.0),
        _ => return None,
    };
    Some(bound)
}
