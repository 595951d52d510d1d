//! Structural validation of untyped JSON against a compiled template.
//!
//! Mirrors the tree recursively and stops at the first failure (depth
//! first, declaration order). Path segments live on a single stack per
//! call; they are rendered into an owned string when an error is built.
//!
//! A key missing from an object and an explicit `null` are treated alike.
pub mod number;
pub mod string;

use serde_json::{Map, Value};

use crate::ast::{ArrayNode, ObjectNode, PrimitiveKind, PrimitiveNode, RecordKey, RecordNode, Rule, ValueNode};
use crate::error::{PathSegment, ValidationError, ValidationErrorKind, render_path};

/// Runtime kind of a JSON value as reported in diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Record keys declared as `number` must read as a finite number. Surrounding
/// whitespace is ignored and an empty key reads as zero.
pub fn is_numeric_key(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() {
        return true;
    }
    let looks_numeric = key.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    looks_numeric && key.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Validates a top-level value. Anything but a JSON object is rejected
/// regardless of the template's contents.
pub fn validate_root(value: &Value, root: &ObjectNode) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new(
            ValidationErrorKind::NotAnObject,
            format!("Expected object, got '{}'", type_name(value)),
            value.clone(),
            &[],
        ));
    }
    Validator::default().object(Some(value), root)
}

/// Validates `value` (`None` when absent) against any node, with an empty
/// starting path.
pub fn validate(value: Option<&Value>, node: &ValueNode) -> Result<(), ValidationError> {
    Validator::default().value(value, node)
}

#[derive(Default)]
struct Validator {
    path: Vec<PathSegment>,
}

impl Validator {
    fn fail(&self, kind: ValidationErrorKind, message: impl Into<String>, value: &Value) -> ValidationError {
        ValidationError::new(kind, message, value.clone(), &self.path)
    }

    fn required(&self) -> ValidationError {
        let message = format!("Field '{}' is required", render_path(&self.path));
        self.fail(ValidationErrorKind::Required, message, &Value::Null)
    }

    fn mismatch(&self, expected: &'static str, noun: &str, value: &Value) -> ValidationError {
        let actual = type_name(value);
        self.fail(
            ValidationErrorKind::TypeMismatch { expected, actual },
            format!("Expected {noun}, got {actual}"),
            value,
        )
    }

    fn value(&mut self, value: Option<&Value>, node: &ValueNode) -> Result<(), ValidationError> {
        match node {
            ValueNode::Primitive(p) => self.primitive(value, p),
            ValueNode::Array(a) => self.array(value, a),
            ValueNode::Object(o) => self.object(value, o),
            ValueNode::Record(r) => self.record(value, r),
        }
    }

    fn primitive(&mut self, value: Option<&Value>, node: &PrimitiveNode) -> Result<(), ValidationError> {
        let default = node.default.as_ref().map(|d| d.to_value());
        let value = match present(value).or(default.as_ref()) {
            Some(v) => v,
            None if node.optional => return Ok(()),
            None => return Err(self.required()),
        };

        match node.kind {
            PrimitiveKind::String => {
                let Value::String(s) = value else {
                    return Err(self.mismatch("string", "string value", value));
                };
                for rule in &node.rules {
                    let Rule::String(r) = rule else {
                        unreachable!("rule '{rule}' attached to a string primitive");
                    };
                    string::check(s, r).map_err(|msg| self.fail(ValidationErrorKind::Rule(*rule), msg, value))?;
                }
            }
            PrimitiveKind::Number => {
                let Value::Number(n) = value else {
                    return Err(self.mismatch("number", "number value", value));
                };
                let Some(n) = n.as_f64().filter(|f| f.is_finite()) else {
                    return Err(self.fail(
                        ValidationErrorKind::NonFinite,
                        format!("Expected finite number value, got {n}"),
                        value,
                    ));
                };
                for rule in &node.rules {
                    let Rule::Number(r) = rule else {
                        unreachable!("rule '{rule}' attached to a number primitive");
                    };
                    number::check(n, r).map_err(|msg| self.fail(ValidationErrorKind::Rule(*rule), msg, value))?;
                }
            }
            PrimitiveKind::Boolean => {
                if !value.is_boolean() {
                    return Err(self.mismatch("boolean", "boolean value", value));
                }
                debug_assert!(node.rules.is_empty(), "boolean primitives take no rules");
            }
        }
        Ok(())
    }

    fn array(&mut self, value: Option<&Value>, node: &ArrayNode) -> Result<(), ValidationError> {
        let Some(value) = present(value) else {
            return if node.optional { Ok(()) } else { Err(self.required()) };
        };
        let Value::Array(items) = value else {
            return Err(self.mismatch("array", "array", value));
        };
        for (i, item) in items.iter().enumerate() {
            self.path.push(PathSegment::Index(i));
            self.value(Some(item), &node.element)?;
            self.path.pop();
        }
        Ok(())
    }

    fn object(&mut self, value: Option<&Value>, node: &ObjectNode) -> Result<(), ValidationError> {
        let Some(value) = present(value) else {
            return if !node.optional && node.has_required_properties {
                Err(self.required())
            } else {
                Ok(())
            };
        };
        let Value::Object(map) = value else {
            return Err(self.mismatch("object", "object value", value));
        };
        // Unknown input keys are not an error.
        for property in &node.properties {
            self.path.push(PathSegment::Key(property.key.clone()));
            self.value(map.get(&property.key), &property.value)?;
            self.path.pop();
        }
        Ok(())
    }

    fn record(&mut self, value: Option<&Value>, node: &RecordNode) -> Result<(), ValidationError> {
        let Some(value) = present(value) else {
            return Ok(());
        };
        let Value::Object(map) = value else {
            return Err(self.mismatch("object", "object value", value));
        };
        self.record_entries(map, node)
    }

    fn record_entries(&mut self, map: &Map<String, Value>, node: &RecordNode) -> Result<(), ValidationError> {
        for (key, entry) in map {
            self.path.push(PathSegment::Key(key.clone()));
            if node.key == RecordKey::Number && !is_numeric_key(key) {
                return Err(self.fail(
                    ValidationErrorKind::InvalidRecordKey,
                    format!("Expected numeric key, got '{key}'"),
                    &Value::from(key.as_str()),
                ));
            }
            self.value(Some(entry), &node.value)?;
            self.path.pop();
        }
        Ok(())
    }
}

// ------------------------------- Tests ------------------------------------ //
