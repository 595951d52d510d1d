use serde_json::Value;
use thiserror::Error;

use crate::ast::{PrimitiveKind, Rule};

// ————————————————————————————————————————————————————————————————————————————
// COMPILE TIME
// ————————————————————————————————————————————————————————————————————————————

/// Malformed template. Compilation stops at the first one.
///
/// Every variant carries the byte offset of the token (or character) that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("Unexpected end of template in string literal")]
    UnterminatedString { offset: usize },

    #[error("Unexpected token '{found}'{}", expected_suffix(.expected))]
    UnexpectedToken {
        found: String,
        expected: Option<&'static str>,
        offset: usize,
    },

    #[error("Unexpected end of template{}", expected_suffix(.expected))]
    UnexpectedEnd {
        expected: Option<&'static str>,
        offset: usize,
    },

    #[error("Unknown primitive symbol '{symbol}'")]
    UnknownPrimitive { symbol: String, offset: usize },

    #[error("Unknown {kind} rule '{rule}'")]
    UnknownRule {
        kind: PrimitiveKind,
        rule: String,
        offset: usize,
    },

    #[error("Rule '{rule}' expects a single numeric argument.")]
    MissingArgument { rule: String, offset: usize },

    #[error("Rule '{rule}' expects no arguments.")]
    UnexpectedArgument { rule: String, offset: usize },

    #[error("Expected finite number, got '{text}'")]
    NonFiniteNumber { text: String, offset: usize },

    #[error("Record keys must be either string or number, got '{found}'")]
    InvalidRecordKey { found: String, offset: usize },

    /// `found` is the raw token, wrapped in double quotes if it was a string
    /// literal so that `"42"` and `42` read differently.
    #[error("Expected {expected}, got '{found}'")]
    InvalidDefault {
        expected: PrimitiveKind,
        found: String,
        offset: usize,
    },

    #[error("Type '{type_name}' cannot be optional")]
    OptionalNotAllowed {
        type_name: &'static str,
        offset: usize,
    },

    #[error("Expected end of template, got '{found}'")]
    TrailingInput { found: String, offset: usize },

    #[error("Template nesting exceeds the maximum depth of {limit}")]
    NestingTooDeep { limit: usize, offset: usize },
}

fn expected_suffix(expected: &Option<&'static str>) -> String {
    match expected {
        Some(e) => format!(", expected {e}"),
        None => String::new(),
    }
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedCharacter { offset, .. }
            | ParseError::UnterminatedString { offset }
            | ParseError::UnexpectedToken { offset, .. }
            | ParseError::UnexpectedEnd { offset, .. }
            | ParseError::UnknownPrimitive { offset, .. }
            | ParseError::UnknownRule { offset, .. }
            | ParseError::MissingArgument { offset, .. }
            | ParseError::UnexpectedArgument { offset, .. }
            | ParseError::NonFiniteNumber { offset, .. }
            | ParseError::InvalidRecordKey { offset, .. }
            | ParseError::InvalidDefault { offset, .. }
            | ParseError::OptionalNotAllowed { offset, .. }
            | ParseError::TrailingInput { offset, .. }
            | ParseError::NestingTooDeep { offset, .. } => *offset,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RUN TIME
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    /// Top-level input was not a JSON object.
    NotAnObject,
    Required,
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    NonFinite,
    Rule(Rule),
    InvalidRecordKey,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    fn render(&self) -> String {
        match self {
            PathSegment::Key(k) => k.clone(),
            PathSegment::Index(i) => format!("[{i}]"),
        }
    }
}

/// `a.b[2]`: keys are dot-joined, indices attach without a dot.
pub fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        if !out.is_empty() && matches!(segment, PathSegment::Key(_)) {
            out.push('.');
        }
        out.push_str(&segment.render());
    }
    out
}

/// A value that does not conform to its schema. `value` is the offending
/// sub-value, not the whole input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    pub value: Value,
    pub path: String,
    pub path_parts: Vec<String>,
}

impl ValidationError {
    pub const NAME: &'static str = "ValidationError";

    pub fn new(
        kind: ValidationErrorKind,
        message: impl Into<String>,
        value: Value,
        path: &[PathSegment],
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            value,
            path: render_path(path),
            path_parts: path.iter().map(PathSegment::render).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPED OUTPUT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("at JSON path {path} → {message}")]
    Deserialize { path: String, message: String },
}
