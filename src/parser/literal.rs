use crate::ast::{Literal, PrimitiveKind};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};

/// Digits-only number token to `f64`. Very long runs overflow to infinity
/// and are rejected.
pub(super) fn number_from_token(token: &Token) -> Result<f64, ParseError> {
    let value: f64 = token.text.parse().unwrap_or(f64::INFINITY);
    if !value.is_finite() {
        return Err(ParseError::NonFiniteNumber { text: token.text.clone(), offset: token.offset });
    }
    Ok(value)
}

/// `= literal` after a primitive's rules. Absent when no `=` follows.
pub(super) fn parse_default(lexer: &mut Lexer<'_>, kind: PrimitiveKind) -> Result<Option<Literal>, ParseError> {
    if !lexer.at_delimiter('=') {
        return Ok(None);
    }
    lexer.next_token()?;
    let token = lexer.token().clone();
    if token.kind == TokenKind::None {
        return Err(ParseError::UnexpectedEnd { expected: Some("a default value"), offset: token.offset });
    }
    lexer.next_token()?;

    let mismatch = || ParseError::InvalidDefault {
        expected: kind,
        found: token.display_text(),
        offset: token.offset,
    };
    let literal = match (kind, token.kind) {
        (PrimitiveKind::String, TokenKind::String) => Literal::String(token.text.clone()),
        (PrimitiveKind::Number, TokenKind::Number) => Literal::Number(number_from_token(&token)?),
        (PrimitiveKind::Boolean, TokenKind::Symbol) => match token.text.as_str() {
            "true" => Literal::Boolean(true),
            "false" => Literal::Boolean(false),
            _ => return Err(mismatch()),
        },
        (PrimitiveKind::String | PrimitiveKind::Number | PrimitiveKind::Boolean, _) => return Err(mismatch()),
    };
    Ok(Some(literal))
}
