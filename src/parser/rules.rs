use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::{NumberRule, PrimitiveKind, Rule, StringRule};
use crate::error::ParseError;

/// Arity is a property of the rule, not of the occurrence.
#[derive(Clone, Copy)]
enum Arity {
    Nullary(Rule),
    Unary(fn(f64) -> Rule),
}

struct RuleDef {
    kind: PrimitiveKind,
    name: &'static str,
    arity: Arity,
}

fn string_min(n: f64) -> Rule { Rule::String(StringRule::Min(n)) }
fn string_max(n: f64) -> Rule { Rule::String(StringRule::Max(n)) }
fn string_length(n: f64) -> Rule { Rule::String(StringRule::Length(n)) }
fn number_min(n: f64) -> Rule { Rule::Number(NumberRule::Min(n)) }
fn number_max(n: f64) -> Rule { Rule::Number(NumberRule::Max(n)) }

static RULES: &[RuleDef] = &[
    RuleDef { kind: PrimitiveKind::String, name: "email",    arity: Arity::Nullary(Rule::String(StringRule::Email)) },
    RuleDef { kind: PrimitiveKind::String, name: "min",      arity: Arity::Unary(string_min) },
    RuleDef { kind: PrimitiveKind::String, name: "max",      arity: Arity::Unary(string_max) },
    RuleDef { kind: PrimitiveKind::String, name: "length",   arity: Arity::Unary(string_length) },
    RuleDef { kind: PrimitiveKind::String, name: "uuid",     arity: Arity::Nullary(Rule::String(StringRule::Uuid)) },
    RuleDef { kind: PrimitiveKind::Number, name: "int",      arity: Arity::Nullary(Rule::Number(NumberRule::Int)) },
    RuleDef { kind: PrimitiveKind::Number, name: "positive", arity: Arity::Nullary(Rule::Number(NumberRule::Positive)) },
    RuleDef { kind: PrimitiveKind::Number, name: "min",      arity: Arity::Unary(number_min) },
    RuleDef { kind: PrimitiveKind::Number, name: "max",      arity: Arity::Unary(number_max) },
];

static RULES_BY_KIND_AND_NAME: Lazy<HashMap<PrimitiveKind, HashMap<&'static str, &'static RuleDef>>> =
    Lazy::new(|| {
        let mut table: HashMap<PrimitiveKind, HashMap<&'static str, &'static RuleDef>> = HashMap::new();
        for def in RULES {
            table.entry(def.kind).or_default().insert(def.name, def);
        }
        table
    });

/// Looks up `name` among the rules for `kind` and checks the argument
/// against the rule's arity.
pub fn resolve(kind: PrimitiveKind, name: &str, arg: Option<f64>, offset: usize) -> Result<Rule, ParseError> {
    let Some(def) = RULES_BY_KIND_AND_NAME.get(&kind).and_then(|rules| rules.get(name)) else {
        return Err(ParseError::UnknownRule { kind, rule: name.to_string(), offset });
    };
    match (def.arity, arg) {
        (Arity::Nullary(rule), None) => Ok(rule),
        (Arity::Unary(build), Some(n)) => Ok(build(n)),
        (Arity::Unary(_), None) => Err(ParseError::MissingArgument { rule: name.to_string(), offset }),
        (Arity::Nullary(_), Some(_)) => Err(ParseError::UnexpectedArgument { rule: name.to_string(), offset }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_resolves_per_kind() {
        assert_eq!(
            resolve(PrimitiveKind::String, "min", Some(3.0), 0).unwrap(),
            Rule::String(StringRule::Min(3.0))
        );
        assert_eq!(
            resolve(PrimitiveKind::Number, "min", Some(3.0), 0).unwrap(),
            Rule::Number(NumberRule::Min(3.0))
        );
    }

    #[test]
    fn unknown_rule_for_kind() {
        let err = resolve(PrimitiveKind::Number, "email", None, 7).unwrap_err();
        assert_eq!(err.to_string(), "Unknown number rule 'email'");
        assert_eq!(err.offset(), 7);
        assert!(resolve(PrimitiveKind::Boolean, "int", None, 0).is_err());
    }

    #[test]
    fn arity_is_enforced() {
        let err = resolve(PrimitiveKind::String, "length", None, 0).unwrap_err();
        assert_eq!(err.to_string(), "Rule 'length' expects a single numeric argument.");
        let err = resolve(PrimitiveKind::Number, "int", Some(1.0), 0).unwrap_err();
        assert_eq!(err.to_string(), "Rule 'int' expects no arguments.");
    }
}
