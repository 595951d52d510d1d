//! JSON Schema export of a compiled template.
//!
//! The output describes the values `validate` accepts, with one caveat:
//! defaults make a property optional on the wire, which the export shows by
//! leaving it out of `required` and attaching `default`.
use serde_json::{Map, Value, json};

use crate::ast::{NumberRule, ObjectNode, PrimitiveKind, PrimitiveNode, RecordKey, RecordNode, Rule, StringRule, ValueNode, number_to_value};

/// Record keys declared as `number`.
const NUMERIC_KEY_PATTERN: &str = r"^\s*[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?\s*$";

// ---- public ---- //

pub fn json_schema(root: &ObjectNode) -> Value {
    let mut schema = object_schema(root);
    if let Value::Object(map) = &mut schema {
        let mut out = Map::new();
        out.insert("$schema".into(), Value::from("https://json-schema.org/draft/2020-12/schema"));
        out.append(map);
        return Value::Object(out);
    }
    schema
}

// ---- nodes ---- //

fn node_schema(node: &ValueNode) -> Value {
    let inner = match node {
        ValueNode::Primitive(p) => primitive_schema(p),
        ValueNode::Array(a) => json!({ "type": "array", "items": node_schema(&a.element) }),
        ValueNode::Object(o) => object_schema(o),
        ValueNode::Record(r) => record_schema(r),
    };
    if node.is_optional() { nullable(inner) } else { inner }
}

fn nullable(inner: Value) -> Value {
    json!({ "oneOf": [inner, { "type": "null" }] })
}

fn primitive_schema(node: &PrimitiveNode) -> Value {
    let mut out = Map::new();
    let integer = node.rules.contains(&Rule::Number(NumberRule::Int));
    let ty = match node.kind {
        PrimitiveKind::Number if integer => "integer",
        kind => kind.as_str(),
    };
    out.insert("type".into(), Value::from(ty));

    let mut lower: Option<f64> = None;
    let mut upper: Option<f64> = None;
    let mut tighten_lower = |n: f64| lower = Some(lower.map_or(n, |l| l.max(n)));
    let mut tighten_upper = |n: f64| upper = Some(upper.map_or(n, |u| u.min(n)));

    for rule in &node.rules {
        match rule {
            Rule::String(StringRule::Email) => {
                out.insert("format".into(), Value::from("email"));
            }
            Rule::String(StringRule::Uuid) => {
                out.insert("format".into(), Value::from("uuid"));
            }
            Rule::String(StringRule::Min(n)) => tighten_lower(*n),
            Rule::String(StringRule::Max(n)) => tighten_upper(*n),
            Rule::String(StringRule::Length(n)) => {
                tighten_lower(*n);
                tighten_upper(*n);
            }
            Rule::Number(NumberRule::Int) => {}
            Rule::Number(NumberRule::Positive) => tighten_lower(0.0),
            Rule::Number(NumberRule::Min(n)) => tighten_lower(*n),
            Rule::Number(NumberRule::Max(n)) => tighten_upper(*n),
        }
    }

    let (min_key, max_key) = match node.kind {
        PrimitiveKind::String => ("minLength", "maxLength"),
        PrimitiveKind::Number | PrimitiveKind::Boolean => ("minimum", "maximum"),
    };
    if let Some(n) = lower {
        out.insert(min_key.into(), number_to_value(n));
    }
    if let Some(n) = upper {
        out.insert(max_key.into(), number_to_value(n));
    }
    if let Some(default) = &node.default {
        out.insert("default".into(), default.to_value());
    }
    Value::Object(out)
}

fn object_schema(node: &ObjectNode) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for property in &node.properties {
        properties.insert(property.key.clone(), node_schema(&property.value));
        if property.value.is_required() {
            required.push(Value::from(property.key.as_str()));
        }
    }

    let mut out = Map::new();
    out.insert("type".into(), Value::from("object"));
    out.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        out.insert("required".into(), Value::Array(required));
    }
    Value::Object(out)
}

fn record_schema(node: &RecordNode) -> Value {
    let mut out = json!({
        "type": "object",
        "additionalProperties": node_schema(&node.value),
    });
    if node.key == RecordKey::Number {
        out["propertyNames"] = json!({ "pattern": NUMERIC_KEY_PATTERN });
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
