// Compiled template tree. Built once by the parser, read-only afterwards.
use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringRule {
    Email,
    Min(f64),     // inclusive lower bound on length
    Max(f64),     // inclusive upper bound on length
    Length(f64),  // exact length
    Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberRule {
    Int,
    Positive,     // >= 0
    Min(f64),
    Max(f64),
}

/// A constraint attached to a primitive. The outer variant always agrees
/// with the owning primitive's kind; the rule resolver only hands out rules
/// for the kind it was asked about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    String(StringRule),
    Number(NumberRule),
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::String(StringRule::Email) => "email",
            Rule::String(StringRule::Min(_)) | Rule::Number(NumberRule::Min(_)) => "min",
            Rule::String(StringRule::Max(_)) | Rule::Number(NumberRule::Max(_)) => "max",
            Rule::String(StringRule::Length(_)) => "length",
            Rule::String(StringRule::Uuid) => "uuid",
            Rule::Number(NumberRule::Int) => "int",
            Rule::Number(NumberRule::Positive) => "positive",
        }
    }
    pub fn argument(&self) -> Option<f64> {
        match self {
            Rule::String(StringRule::Min(n))
            | Rule::String(StringRule::Max(n))
            | Rule::String(StringRule::Length(n))
            | Rule::Number(NumberRule::Min(n))
            | Rule::Number(NumberRule::Max(n)) => Some(*n),
            Rule::String(StringRule::Email | StringRule::Uuid)
            | Rule::Number(NumberRule::Int | NumberRule::Positive) => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(arg) => write!(f, "{}({})", self.name(), arg),
            None => f.write_str(self.name()),
        }
    }
}

/// Default value literal, already checked against the primitive kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Literal {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Literal::String(_) => PrimitiveKind::String,
            Literal::Number(_) => PrimitiveKind::Number,
            Literal::Boolean(_) => PrimitiveKind::Boolean,
        }
    }
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::from(s.as_str()),
            Literal::Number(n) => number_to_value(*n),
            Literal::Boolean(b) => Value::from(*b),
        }
    }
}

/// Prefer an integer JSON number when the value is exact, so `= 1` compares
/// equal to `json!(1)`.
pub fn number_to_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= 0.0 && n <= u64::MAX as f64 {
        Value::from(n as u64)
    } else if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < 0.0 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ------------------------------- Nodes ------------------------------------ //

#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Primitive(PrimitiveNode),
    Array(ArrayNode),
    Object(ObjectNode),
    Record(RecordNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveNode {
    pub kind: PrimitiveKind,
    pub rules: Vec<Rule>,          // declaration order
    pub default: Option<Literal>,
    pub optional: bool,
}

/// One array dimension; `number[][]` is two nested `ArrayNode`s.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    pub element: Box<ValueNode>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub properties: Vec<Property>, // insertion order
    pub optional: bool,
    pub has_required_properties: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    String,
    Number,
}

/// Keyed map. Never optional: an absent record reads as an empty one.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordNode {
    pub key: RecordKey,
    pub value: Box<ValueNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: ValueNode,
}

impl ValueNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueNode::Primitive(_) => "primitive",
            ValueNode::Array(_) => "array",
            ValueNode::Object(_) => "object",
            ValueNode::Record(_) => "record",
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            ValueNode::Primitive(p) => p.optional,
            ValueNode::Array(a) => a.optional,
            ValueNode::Object(o) => o.optional,
            ValueNode::Record(_) => false,
        }
    }

    /// True when an absent/null value for this node is a validation error.
    pub fn is_required(&self) -> bool {
        match self {
            ValueNode::Primitive(p) => !p.optional && p.default.is_none(),
            ValueNode::Array(a) => !a.optional,
            ValueNode::Object(o) => !o.optional && o.has_required_properties,
            ValueNode::Record(_) => false,
        }
    }

    /// Whether this node, used as a property value, makes its enclosing
    /// object required.
    fn counts_as_required_property(&self) -> bool {
        match self {
            ValueNode::Primitive(p) => !p.optional,
            ValueNode::Array(a) => !a.optional,
            ValueNode::Object(o) => !o.optional && o.has_required_properties,
            ValueNode::Record(_) => false,
        }
    }
}

impl ObjectNode {
    pub fn new(properties: Vec<Property>) -> Self {
        let has_required_properties = properties
            .iter()
            .any(|p| p.value.counts_as_required_property());
        Self { properties, optional: false, has_required_properties }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn property(&self, key: &str) -> Option<&ValueNode> {
        self.properties.iter().find(|p| p.key == key).map(|p| &p.value)
    }
}

// ------------------------------- Tests ------------------------------------ //
