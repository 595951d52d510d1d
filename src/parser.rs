//! Recursive-descent template parser.
//!
//! One method per grammar production, strictly left to right with the
//! lexer's single token of lookahead:
//!
//! ```text
//! template    := '{' properties? '}'
//! properties  := property (';' property)* ';'?
//! property    := key '?'? ':' value arrayMarks? rules? default?
//! value       := 'string' | 'number' | 'boolean' | '{' properties? '}' | record
//! record      := 'Record' '<' ('string'|'number') ',' value arrayMarks? rules? default? '>'
//! arrayMarks  := '[]'+
//! rules       := '<' rule (',' rule)* ','? '>'
//! rule        := Symbol ('(' Number ')')?
//! default     := '=' (String | Number | 'true' | 'false')
//! ```
//!
//! Nodes are assembled bottom-up: a primitive is only constructed once its
//! rules and default are known, and optionality produces a new node rather
//! than patching an existing one.
pub mod rules;
mod literal;

use crate::ast::{ArrayNode, ObjectNode, PrimitiveKind, PrimitiveNode, Property, RecordKey, RecordNode, Rule, ValueNode};
use crate::error::ParseError;
use crate::lexer::{Lexer, TokenKind};

/// Objects, records and array dimensions each count one level.
pub const DEFAULT_MAX_DEPTH: usize = 64;

const RECORD: &str = "Record";

/// Result of `parse_value`: primitives stay open until their rules and
/// default have been read.
enum BaseValue {
    Primitive(PrimitiveKind),
    Composite(ValueNode),
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    depth: usize,
    max_depth: usize,
}

/// Parses a full template. Anything after the closing `}` is an error.
pub fn parse_template(src: &str, max_depth: usize) -> Result<ObjectNode, ParseError> {
    let mut parser = Parser::new(src, max_depth)?;
    let root = parser.parse_object()?;
    if !parser.lexer.at_end() {
        return Err(ParseError::TrailingInput {
            found: parser.lexer.token().display_text(),
            offset: parser.lexer.offset(),
        });
    }
    Ok(root)
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, max_depth: usize) -> Result<Self, ParseError> {
        Ok(Self { lexer: Lexer::new(src)?, depth: 0, max_depth })
    }

    // ------------------------------ Helpers ------------------------------- //

    fn unexpected(&self, expected: Option<&'static str>) -> ParseError {
        let token = self.lexer.token();
        if token.kind == TokenKind::None {
            ParseError::UnexpectedEnd { expected, offset: token.offset }
        } else {
            ParseError::UnexpectedToken { found: token.display_text(), expected, offset: token.offset }
        }
    }

    fn expect_delimiter(&mut self, c: char, expected: &'static str) -> Result<(), ParseError> {
        if !self.lexer.at_delimiter(c) {
            return Err(self.unexpected(Some(expected)));
        }
        self.lexer.next_token()
    }

    fn enter(&mut self, levels: usize) -> Result<(), ParseError> {
        self.depth += levels;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep { limit: self.max_depth, offset: self.lexer.offset() });
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    // ---------------------------- Productions ----------------------------- //

    pub fn parse_object(&mut self) -> Result<ObjectNode, ParseError> {
        self.expect_delimiter('{', "'{'")?;
        self.enter(1)?;
        if self.lexer.at_delimiter('}') {
            self.lexer.next_token()?;
            self.leave(1);
            return Ok(ObjectNode::empty());
        }
        let properties = self.parse_properties()?;
        self.expect_delimiter('}', "'}'")?;
        self.leave(1);
        Ok(ObjectNode::new(properties))
    }

    /// Stops in front of the closing `}` without consuming it.
    pub fn parse_properties(&mut self) -> Result<Vec<Property>, ParseError> {
        let mut properties = Vec::new();
        loop {
            properties.push(self.parse_property()?);
            if self.lexer.at_delimiter(';') {
                self.lexer.next_token()?;
            }
            if self.lexer.at_delimiter('}') {
                return Ok(properties);
            }
        }
    }

    pub fn parse_property(&mut self) -> Result<Property, ParseError> {
        if self.lexer.kind() != TokenKind::Symbol {
            return Err(self.unexpected(Some("property name")));
        }
        let key = self.lexer.text().to_string();
        self.lexer.next_token()?;

        let optional_at = if self.lexer.at_delimiter('?') {
            let offset = self.lexer.offset();
            self.lexer.next_token()?;
            Some(offset)
        } else {
            None
        };
        self.expect_delimiter(':', "':'")?;

        let value = self.parse_arrayable_value_and_rules()?;
        let value = match optional_at {
            Some(offset) => mark_optional(value, offset)?,
            None => value,
        };
        Ok(Property { key, value })
    }

    fn parse_value(&mut self) -> Result<BaseValue, ParseError> {
        match self.lexer.kind() {
            TokenKind::Symbol => {
                if self.lexer.at_symbol(RECORD) {
                    return Ok(BaseValue::Composite(ValueNode::Record(self.parse_record()?)));
                }
                let Some(kind) = PrimitiveKind::from_symbol(self.lexer.text()) else {
                    return Err(ParseError::UnknownPrimitive {
                        symbol: self.lexer.text().to_string(),
                        offset: self.lexer.offset(),
                    });
                };
                self.lexer.next_token()?;
                Ok(BaseValue::Primitive(kind))
            }
            TokenKind::Delimiter if self.lexer.at_delimiter('{') => {
                Ok(BaseValue::Composite(ValueNode::Object(self.parse_object()?)))
            }
            TokenKind::Delimiter | TokenKind::Number | TokenKind::String | TokenKind::None => {
                Err(self.unexpected(Some("a value")))
            }
        }
    }

    /// `[]` pairs following a value.
    fn parse_array_dimension(&mut self) -> Result<usize, ParseError> {
        let mut dimension = 0;
        while self.lexer.at_delimiter('[') {
            self.lexer.next_token()?;
            self.expect_delimiter(']', "']'")?;
            dimension += 1;
        }
        Ok(dimension)
    }

    /// Value, array marks, then rules and default when the value is a
    /// primitive. Rules attach to the innermost element.
    pub fn parse_arrayable_value_and_rules(&mut self) -> Result<ValueNode, ParseError> {
        let base = self.parse_value()?;
        let dimension = self.parse_array_dimension()?;
        self.enter(dimension)?;
        self.leave(dimension);

        let mut value = match base {
            BaseValue::Primitive(kind) => {
                let rules = self.parse_rules(kind)?;
                let default = literal::parse_default(&mut self.lexer, kind)?;
                ValueNode::Primitive(PrimitiveNode { kind, rules, default, optional: false })
            }
            BaseValue::Composite(node) => node,
        };
        for _ in 0..dimension {
            value = ValueNode::Array(ArrayNode { element: Box::new(value), optional: false });
        }
        Ok(value)
    }

    pub fn parse_record(&mut self) -> Result<RecordNode, ParseError> {
        if !self.lexer.at_symbol(RECORD) {
            return Err(self.unexpected(Some("'Record'")));
        }
        self.lexer.next_token()?;
        self.enter(1)?;
        self.expect_delimiter('<', "'<'")?;

        let key_offset = self.lexer.offset();
        let key = match self.parse_value()? {
            BaseValue::Primitive(PrimitiveKind::String) => RecordKey::String,
            BaseValue::Primitive(PrimitiveKind::Number) => RecordKey::Number,
            BaseValue::Primitive(kind @ PrimitiveKind::Boolean) => {
                return Err(ParseError::InvalidRecordKey { found: kind.to_string(), offset: key_offset });
            }
            BaseValue::Composite(node) => {
                return Err(ParseError::InvalidRecordKey { found: node.type_name().to_string(), offset: key_offset });
            }
        };

        self.expect_delimiter(',', "','")?;
        let value = self.parse_arrayable_value_and_rules()?;
        self.expect_delimiter('>', "'>'")?;
        self.leave(1);
        Ok(RecordNode { key, value: Box::new(value) })
    }

    /// `<rule, rule(arg), ...>`; empty when no `<` follows.
    pub fn parse_rules(&mut self, kind: PrimitiveKind) -> Result<Vec<Rule>, ParseError> {
        let mut out = Vec::new();
        if !self.lexer.at_delimiter('<') {
            return Ok(out);
        }
        self.lexer.next_token()?;

        while !self.lexer.at_delimiter('>') {
            if self.lexer.kind() != TokenKind::Symbol {
                return Err(self.unexpected(Some("rule name")));
            }
            let name = self.lexer.text().to_string();
            let offset = self.lexer.offset();
            self.lexer.next_token()?;

            let arg = self.parse_rule_argument()?;
            out.push(rules::resolve(kind, &name, arg, offset)?);

            if self.lexer.at_delimiter(',') {
                self.lexer.next_token()?;
            } else if !self.lexer.at_delimiter('>') {
                return Err(self.unexpected(Some("',' or '>'")));
            }
        }
        self.lexer.next_token()?;
        Ok(out)
    }

    fn parse_rule_argument(&mut self) -> Result<Option<f64>, ParseError> {
        if !self.lexer.at_delimiter('(') {
            return Ok(None);
        }
        self.lexer.next_token()?;
        if self.lexer.kind() != TokenKind::Number {
            return Err(self.unexpected(Some("numeric argument")));
        }
        let value = literal::number_from_token(self.lexer.token())?;
        self.lexer.next_token()?;
        self.expect_delimiter(')', "')'")?;
        Ok(Some(value))
    }
}

/// `?` is legal on primitives, arrays and objects.
fn mark_optional(value: ValueNode, offset: usize) -> Result<ValueNode, ParseError> {
    Ok(match value {
        ValueNode::Primitive(p) => ValueNode::Primitive(PrimitiveNode { optional: true, ..p }),
        ValueNode::Array(a) => ValueNode::Array(ArrayNode { optional: true, ..a }),
        ValueNode::Object(o) => ValueNode::Object(ObjectNode { optional: true, ..o }),
        ValueNode::Record(_) => {
            return Err(ParseError::OptionalNotAllowed { type_name: "record", offset });
        }
    })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, NumberRule, StringRule};

    fn template(src: &str) -> Result<ObjectNode, ParseError> {
        parse_template(src, DEFAULT_MAX_DEPTH)
    }

    fn property(src: &str) -> Result<ValueNode, ParseError> {
        let mut parser = Parser::new(src, DEFAULT_MAX_DEPTH)?;
        Ok(parser.parse_property()?.value)
    }

    fn record(src: &str) -> Result<RecordNode, ParseError> {
        let mut parser = Parser::new(src, DEFAULT_MAX_DEPTH)?;
        parser.parse_record()
    }

    fn as_primitive(node: &ValueNode) -> &PrimitiveNode {
        match node {
            ValueNode::Primitive(p) => p,
            other => panic!("expected primitive, got {}", other.type_name()),
        }
    }

    fn as_array(node: &ValueNode) -> &ArrayNode {
        match node {
            ValueNode::Array(a) => a,
            other => panic!("expected array, got {}", other.type_name()),
        }
    }

    #[test]
    fn parses_an_empty_object() {
        let root = template("{}").unwrap();
        assert!(root.properties.is_empty());
        assert!(!root.optional);
        assert!(!root.has_required_properties);
    }

    #[test]
    fn objects_without_required_properties() {
        let templates = [
            "{ a?: string; }",
            "{ a: {} }",
            "{ a?: string[] }",
            "{ a: Record<string, number> }",
            "{ a: { b?: number } }",
            "{ a?: string; b: {}; c?: number[]; d: Record<string, { e: number; }> }",
        ];
        for t in templates {
            let root = template(t).unwrap();
            assert!(!root.has_required_properties, "{t}");
        }
    }

    #[test]
    fn objects_with_required_properties() {
        for t in ["{ a: string; }", "{ a: { b: { c: string } }; }", "{ a: number[] }"] {
            assert!(template(t).unwrap().has_required_properties, "{t}");
        }
    }

    #[test]
    fn parses_key_and_primitive_value() {
        let value = property("a: string").unwrap();
        let p = as_primitive(&value);
        assert_eq!(p.kind, PrimitiveKind::String);
        assert!(p.rules.is_empty());
        assert!(!p.optional);
    }

    #[test]
    fn parses_rule_lists() {
        let value = property("a: string <email>").unwrap();
        assert_eq!(as_primitive(&value).rules, vec![Rule::String(StringRule::Email)]);

        let value = property("a: number <int, positive, min(0), max(10),>").unwrap();
        assert_eq!(as_primitive(&value).rules, vec![
            Rule::Number(NumberRule::Int),
            Rule::Number(NumberRule::Positive),
            Rule::Number(NumberRule::Min(0.0)),
            Rule::Number(NumberRule::Max(10.0)),
        ]);
    }

    #[test]
    fn rule_list_errors() {
        let err = property("a: number <int positive>").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token 'positive', expected ',' or '>'");
        let err = property("a: string <email(1)>").unwrap_err();
        assert_eq!(err.to_string(), "Rule 'email' expects no arguments.");
        let err = property("a: string <min>").unwrap_err();
        assert!(matches!(err, ParseError::MissingArgument { .. }));
        let err = property("a: string <min(x)>").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token 'x', expected numeric argument");
        let err = property("a: boolean <int>").unwrap_err();
        assert_eq!(err.to_string(), "Unknown boolean rule 'int'");
    }

    #[test]
    fn parses_arrays_and_their_rules() {
        let value = property("a: {}[]").unwrap();
        assert!(matches!(as_array(&value).element.as_ref(), ValueNode::Object(_)));

        let value = property("emails: string[] <email>").unwrap();
        let element = as_primitive(&as_array(&value).element);
        assert_eq!(element.rules.len(), 1);

        let value = property("grid: number[][] <positive>").unwrap();
        let inner = as_array(&as_array(&value).element);
        assert_eq!(as_primitive(&inner.element).rules, vec![Rule::Number(NumberRule::Positive)]);
    }

    #[test]
    fn optional_applies_to_outermost_node() {
        let value = property("a?: number[]").unwrap();
        let arr = as_array(&value);
        assert!(arr.optional);
        assert!(!as_primitive(&arr.element).optional);

        let value = property("a?: { b: string }").unwrap();
        assert!(value.is_optional());
    }

    #[test]
    fn records_cannot_be_optional() {
        let err = property("a?: Record<string, number>").unwrap_err();
        assert_eq!(err.to_string(), "Type 'record' cannot be optional");
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn parses_defaults() {
        let value = property("a: number = 42").unwrap();
        assert_eq!(as_primitive(&value).default, Some(Literal::Number(42.0)));
        let value = property(r#"a?: string <min(1)> = "x""#).unwrap();
        let p = as_primitive(&value);
        assert_eq!(p.default, Some(Literal::String("x".into())));
        assert!(p.optional);
        let err = property(r#"a: number = "42""#).unwrap_err();
        assert_eq!(err.to_string(), "Expected number, got '\"42\"'");
    }

    #[test]
    fn properties_stop_before_closing_brace() {
        let mut parser = Parser::new("a: string <email>; } <", DEFAULT_MAX_DEPTH).unwrap();
        let props = parser.parse_properties().unwrap();
        assert_eq!(props.len(), 1);
        assert!(parser.lexer.at_delimiter('}'));
    }

    #[test]
    fn properties_require_a_closing_brace() {
        let mut parser = Parser::new("a: string <email>;", DEFAULT_MAX_DEPTH).unwrap();
        let err = parser.parse_properties().unwrap_err();
        assert_eq!(err.to_string(), "Unexpected end of template, expected property name");
    }

    #[test]
    fn parses_multiple_properties() {
        let root = template("{ a: string <email>; c: { d: string[] }; b: number[] <int>; }").unwrap();
        let keys: Vec<_> = root.properties.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c", "b"]);
    }

    #[test]
    fn objects_take_no_rules() {
        let err = template("{ a: { b: number; } <rule> }").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token '<', expected property name");
    }

    #[test]
    fn record_keys() {
        assert_eq!(record("Record<string, number>").unwrap().key, RecordKey::String);
        assert_eq!(record("Record<number, boolean>").unwrap().key, RecordKey::Number);
        let err = record("Record<boolean, boolean>").unwrap_err();
        assert_eq!(err.to_string(), "Record keys must be either string or number, got 'boolean'");
        let err = record("Record<symbol, boolean>").unwrap_err();
        assert_eq!(err.to_string(), "Unknown primitive symbol 'symbol'");
        let err = record("Record<{}, boolean>").unwrap_err();
        assert_eq!(err.to_string(), "Record keys must be either string or number, got 'object'");
    }

    #[test]
    fn record_values() {
        let rec = record("Record<string, string <email>>").unwrap();
        assert_eq!(as_primitive(&rec.value).rules.len(), 1);

        let rec = record("Record<string, number[] <int, positive>>").unwrap();
        assert_eq!(as_primitive(&as_array(&rec.value).element).rules.len(), 2);

        let rec = record("Record<string, { a: string }[]>").unwrap();
        assert!(matches!(as_array(&rec.value).element.as_ref(), ValueNode::Object(o) if o.properties.len() == 1));

        let rec = record("Record<string, Record<number, boolean>>").unwrap();
        let ValueNode::Record(inner) = rec.value.as_ref() else { panic!("expected nested record") };
        assert_eq!(inner.key, RecordKey::Number);
        assert_eq!(as_primitive(&inner.value).kind, PrimitiveKind::Boolean);
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = template("{ a: string } x").unwrap_err();
        assert_eq!(err, ParseError::TrailingInput { found: "x".into(), offset: 14 });
    }

    #[test]
    fn value_errors() {
        let err = template("{ a: 42 }").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token '42', expected a value");
        let err = template("{ a: strin }").unwrap_err();
        assert_eq!(err.to_string(), "Unknown primitive symbol 'strin'");
        let err = template("{ a string }").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token 'string', expected ':'");
        let err = template("").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected end of template, expected '{'");
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}{}", "{ a: ".repeat(10), "}".repeat(10));
        assert!(matches!(parse_template(&deep, 4), Err(ParseError::NestingTooDeep { limit: 4, .. })));
        let err = parse_template("{ a: number[][][][] }", 4).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }));
        assert!(parse_template("{ a: number[][][] }", 4).is_ok());
    }
}
