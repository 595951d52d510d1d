//! Builds a fresh, normalized JSON value from input that has already passed
//! validation.
//!
//! Only declared keys survive. Absent values take their defaults, absent
//! arrays become `[]`, absent records become `{}`. The output shares nothing
//! with the input.
use serde_json::{Map, Value};

use crate::ast::{ObjectNode, RecordNode, ValueNode};

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

pub fn copy(value: Option<&Value>, node: &ValueNode) -> Value {
    match node {
        ValueNode::Primitive(p) => match present(value) {
            Some(v) => v.clone(),
            None => p.default.as_ref().map(|d| d.to_value()).unwrap_or(Value::Null),
        },
        ValueNode::Array(a) => match present(value) {
            Some(Value::Array(items)) => Value::Array(items.iter().map(|item| copy(Some(item), &a.element)).collect()),
            Some(_) => {
                debug_assert!(false, "copy called on an unvalidated array");
                Value::Array(Vec::new())
            }
            None => Value::Array(Vec::new()),
        },
        ValueNode::Object(o) => copy_object(value, o),
        ValueNode::Record(r) => copy_record(value, r),
    }
}

/// Absent optional objects stay `null`. Absent required ones are rebuilt
/// from nothing so their defaulted members still show up.
pub fn copy_object(value: Option<&Value>, node: &ObjectNode) -> Value {
    let map = match present(value) {
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            debug_assert!(false, "copy called on an unvalidated object");
            None
        }
        None if node.optional => return Value::Null,
        None => None,
    };

    let mut out = Map::new();
    for property in &node.properties {
        let source = map.and_then(|m| m.get(&property.key));
        out.insert(property.key.clone(), copy(source, &property.value));
    }
    Value::Object(out)
}

/// Null entries are dropped.
fn copy_record(value: Option<&Value>, node: &RecordNode) -> Value {
    let mut out = Map::new();
    match present(value) {
        Some(Value::Object(map)) => {
            for (key, entry) in map {
                if entry.is_null() {
                    continue;
                }
                out.insert(key.clone(), copy(Some(entry), &node.value));
            }
        }
        Some(_) => debug_assert!(false, "copy called on an unvalidated record"),
        None => {}
    }
    Value::Object(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DEFAULT_MAX_DEPTH, parse_template};
    use serde_json::json;

    fn normalize(template: &str, value: Value) -> Value {
        let root = parse_template(template, DEFAULT_MAX_DEPTH).unwrap();
        copy_object(Some(&value), &root)
    }

    #[test]
    fn fills_defaults_and_drops_unknown_keys() {
        let out = normalize("{ a: string; b: number = 1; }", json!({ "a": "x", "extra": 5 }));
        assert_eq!(out, json!({ "a": "x", "b": 1 }));
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let out = normalize(r#"{ s: string = "d"; f: boolean = true }"#, json!({ "s": "given", "f": false }));
        assert_eq!(out, json!({ "s": "given", "f": false }));
    }

    #[test]
    fn null_takes_the_default() {
        let out = normalize("{ n: number = 3 }", json!({ "n": null }));
        assert_eq!(out, json!({ "n": 3 }));
    }

    #[test]
    fn absent_optional_primitive_is_null() {
        let out = normalize("{ a?: string }", json!({}));
        assert_eq!(out, json!({ "a": null }));
    }

    #[test]
    fn absent_arrays_become_empty() {
        let out = normalize("{ xs: number[]; ys?: string[] }", json!({ "xs": [1] }));
        assert_eq!(out, json!({ "xs": [1], "ys": [] }));
    }

    #[test]
    fn array_elements_are_normalized() {
        let out = normalize("{ xs: { a: number = 0; }[] }", json!({ "xs": [{}, { "a": 2, "b": 3 }] }));
        assert_eq!(out, json!({ "xs": [{ "a": 0 }, { "a": 2 }] }));
    }

    #[test]
    fn nested_objects() {
        let out = normalize("{ o?: { a: number }; p: { b?: number = 2 } }", json!({}));
        assert_eq!(out, json!({ "o": null, "p": { "b": 2 } }));
    }

    #[test]
    fn records_skip_null_entries() {
        let out = normalize("{ m: Record<string, number>; n: Record<number, string> }", json!({ "m": { "a": 1, "b": null } }));
        assert_eq!(out, json!({ "m": { "a": 1 }, "n": {} }));
    }

    #[test]
    fn record_values_are_normalized() {
        let out = normalize("{ m: Record<string, { a: number = 1 }> }", json!({ "m": { "k": { "z": 0 } } }));
        assert_eq!(out, json!({ "m": { "k": { "a": 1 } } }));
    }

    #[test]
    fn output_preserves_declaration_order() {
        let out = normalize("{ z: number; a: number }", json!({ "a": 1, "z": 2 }));
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
