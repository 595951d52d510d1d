//! Compile TypeScript-like object templates into schemas that validate and
//! normalize untyped JSON.
//!
//! ```
//! use serde_json::json;
//!
//! let schema = json_tmpl::compile("{ name: string <min(1)>; tags?: string[]; admin: boolean = false }").unwrap();
//! let user = schema.parse(&json!({ "name": "ada", "extra": 1 })).unwrap();
//! assert_eq!(user, json!({ "name": "ada", "tags": [], "admin": false }));
//! ```
pub mod ast;
pub mod copy;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod path_de;
pub mod schema;
pub mod validate;

pub use ast::{ObjectNode, ValueNode};
pub use error::{ParseError, SchemaError, ValidationError, ValidationErrorKind};
pub use schema::{CompileOptions, Schema, compile, compile_with};
