//! Declarative request validation for the todo API.
//!
//! # Design
//! Each `Schema` is a static table of `FieldRule`s. `validate` walks the
//! table once and collects every violation instead of stopping at the first,
//! so a client sees all problems with its payload in one response. Errors
//! come back in the order the fields are declared.
//!
//! The validator also normalizes: unknown keys are dropped, defaults are
//! filled in, and numeric ids given as strings (path parameters) become JSON
//! integers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 1000;

/// Largest integer a JSON number can carry without losing precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Named rule sets applied to incoming payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Body of `POST /todos`.
    Create,
    /// Body of `PATCH /todos/{id}`.
    Update,
    /// The `id` path parameter.
    Id,
}

/// A single violation, reported against the field that caused it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    /// String whose length in characters lies in `min..=max`.
    Text { min: usize, max: usize },
    /// JSON boolean.
    Flag,
    /// Integer greater than zero, given as a number or a numeric string.
    PositiveInt,
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    field: &'static str,
    label: &'static str,
    required: bool,
    rule: Rule,
    default: Option<&'static str>,
}

const CREATE_FIELDS: &[FieldRule] = &[
    FieldRule {
        field: "title",
        label: "Title",
        required: true,
        rule: Rule::Text { min: 1, max: TITLE_MAX },
        default: None,
    },
    FieldRule {
        field: "description",
        label: "Description",
        required: false,
        rule: Rule::Text { min: 0, max: DESCRIPTION_MAX },
        default: Some(""),
    },
];

const UPDATE_FIELDS: &[FieldRule] = &[
    FieldRule {
        field: "title",
        label: "Title",
        required: false,
        rule: Rule::Text { min: 1, max: TITLE_MAX },
        default: None,
    },
    FieldRule {
        field: "description",
        label: "Description",
        required: false,
        rule: Rule::Text { min: 0, max: DESCRIPTION_MAX },
        default: None,
    },
    FieldRule {
        field: "completed",
        label: "Completed",
        required: false,
        rule: Rule::Flag,
        default: None,
    },
];

const ID_FIELDS: &[FieldRule] = &[FieldRule {
    field: "id",
    label: "ID",
    required: true,
    rule: Rule::PositiveInt,
    default: None,
}];

impl Schema {
    fn fields(self) -> &'static [FieldRule] {
        match self {
            Schema::Create => CREATE_FIELDS,
            Schema::Update => UPDATE_FIELDS,
            Schema::Id => ID_FIELDS,
        }
    }

    /// Whether the payload must carry at least one declared field.
    fn requires_any_field(self) -> bool {
        matches!(self, Schema::Update)
    }
}

/// Check `payload` against `schema`, returning the normalized object or every
/// violation found.
pub fn validate(schema: Schema, payload: &Value) -> Result<Value, Vec<FieldError>> {
    let Some(object) = payload.as_object() else {
        return Err(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )]);
    };

    let mut errors = Vec::new();
    let mut normalized = Map::new();

    for rule in schema.fields() {
        match object.get(rule.field) {
            Some(value) => match check(rule, value) {
                Ok(value) => {
                    normalized.insert(rule.field.to_string(), value);
                }
                Err(message) => errors.push(FieldError::new(rule.field, message)),
            },
            None if rule.required => {
                errors.push(FieldError::new(
                    rule.field,
                    format!("{} is required", rule.label),
                ));
            }
            None => {
                if let Some(default) = rule.default {
                    normalized.insert(rule.field.to_string(), Value::from(default));
                }
            }
        }
    }

    if schema.requires_any_field()
        && errors.is_empty()
        && !schema.fields().iter().any(|rule| object.contains_key(rule.field))
    {
        errors.push(FieldError::new(
            "body",
            "At least one field must be provided for update",
        ));
    }

    if errors.is_empty() {
        Ok(Value::Object(normalized))
    } else {
        Err(errors)
    }
}

fn check(rule: &FieldRule, value: &Value) -> Result<Value, String> {
    let label = rule.label;
    match rule.rule {
        Rule::Text { min, max } => {
            let Some(text) = value.as_str() else {
                return Err(format!("{label} must be a string"));
            };
            if min > 0 && text.trim().is_empty() {
                return Err(format!("{label} cannot be empty"));
            }
            if text.chars().count() > max {
                return Err(format!("{label} must be less than {max} characters"));
            }
            Ok(value.clone())
        }
        Rule::Flag => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(format!("{label} must be a boolean")),
        },
        Rule::PositiveInt => positive_int(label, value).map(Value::from),
    }
}

fn positive_int(label: &str, value: &Value) -> Result<i64, String> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
    .ok_or_else(|| format!("{label} must be a number"))?;

    if number.fract() != 0.0 || number.abs() > MAX_SAFE_INTEGER {
        return Err(format!("{label} must be an integer"));
    }
    if number <= 0.0 {
        return Err(format!("{label} must be positive"));
    }
    Ok(number as i64)
}
