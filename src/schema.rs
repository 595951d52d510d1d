//! Compiled templates.
//!
//! A [`Schema`] owns its AST behind an `Arc`; clones share it and can be
//! used from any number of threads at once.
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ast::ObjectNode;
use crate::error::{ParseError, SchemaError, ValidationError};
use crate::parser::{DEFAULT_MAX_DEPTH, parse_template};
use crate::{copy, emit, path_de, validate};

// ———————————————————————————————————————————————————————————————————————————
// OPTIONS
// ———————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Objects, records and array dimensions each count one level.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

// ———————————————————————————————————————————————————————————————————————————
// SCHEMA
// ———————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct Schema {
    root: Arc<ObjectNode>,
}

pub fn compile(template: &str) -> Result<Schema, ParseError> {
    compile_with(template, &CompileOptions::default())
}

pub fn compile_with(template: &str, options: &CompileOptions) -> Result<Schema, ParseError> {
    let root = parse_template(template, options.max_depth)?;
    tracing::debug!(
        properties = root.properties.len(),
        has_required_properties = root.has_required_properties,
        "compiled template"
    );
    Ok(Schema { root: Arc::new(root) })
}

impl Schema {
    pub fn ast(&self) -> &ObjectNode {
        &self.root
    }

    /// Checks `value` without building any output.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        validate::validate_root(value, &self.root).inspect_err(|err| {
            tracing::trace!(path = %err.path, message = %err.message, "validation failed");
        })
    }

    /// Validates, then returns a fresh normalized copy: declared keys only,
    /// defaults filled in. The input is never modified.
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.validate(value)?;
        Ok(copy::copy_object(Some(value), &self.root))
    }

    pub fn parse_into<T: DeserializeOwned>(&self, value: &Value) -> Result<T, SchemaError> {
        let normalized = self.parse(value)?;
        path_de::from_value_with_path(normalized)
    }

    pub fn to_json_schema(&self) -> Value {
        emit::json_schema(&self.root)
    }
}

impl FromStr for Schema {
    type Err = ParseError;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        compile(template)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_and_deserialize() {
        assert_eq!(CompileOptions::default().max_depth, 64);
        let options: CompileOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, CompileOptions::default());
        let options: CompileOptions = serde_json::from_value(json!({ "max_depth": 3 })).unwrap();
        assert_eq!(options.max_depth, 3);
        assert!(serde_json::from_value::<CompileOptions>(json!({ "depth": 3 })).is_err());
    }

    #[test]
    fn depth_limit_applies() {
        let options = CompileOptions { max_depth: 2 };
        assert!(compile_with("{ a: { b: number } }", &options).is_ok());
        let err = compile_with("{ a: { b: { c: number } } }", &options).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { limit: 2, .. }));
    }

    #[test]
    fn parse_leaves_input_untouched() {
        let schema = compile("{ a: number = 1; b: string[] }").unwrap();
        let input = json!({ "b": ["x"], "c": true });
        let before = input.clone();
        let out = schema.parse(&input).unwrap();
        assert_eq!(out, json!({ "a": 1, "b": ["x"] }));
        assert_eq!(input, before);
    }

    #[test]
    fn validate_does_not_copy() {
        let schema = compile("{ a: number }").unwrap();
        assert!(schema.validate(&json!({ "a": 1 })).is_ok());
        assert!(schema.validate(&json!({ "a": "1" })).is_err());
    }

    #[test]
    fn from_str_compiles() {
        let schema: Schema = "{ a?: boolean }".parse().unwrap();
        assert_eq!(schema.ast().properties.len(), 1);
        assert!("{ a: nope }".parse::<Schema>().is_err());
    }

    #[test]
    fn schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Schema>();
    }
}
