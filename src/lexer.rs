//! Template tokenizer.
//!
//! Holds exactly one token of lookahead. The parser inspects the current
//! token and calls [`Lexer::next_token`] to move on; there is no backtracking.
//! Once the input is exhausted the current token stays `TokenKind::None`.
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::ParseError;

const DELIMITERS: &[char] = &[
    ':', ';', '{', '}', '[', ']', '<', '>', '(', ')', ',', '=', '"', '?',
];

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    None,
    Delimiter,
    Symbol,
    Number,
    /// `text` holds the unescaped contents, without the surrounding quotes.
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

impl Token {
    fn end(offset: usize) -> Self {
        Self { kind: TokenKind::None, text: String::new(), offset }
    }

    /// Token text as it would be quoted in a diagnostic.
    pub fn display_text(&self) -> String {
        match self.kind {
            TokenKind::String => format!("\"{}\"", self.text),
            _ => self.text.clone(),
        }
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    token: Token,
}

impl<'a> Lexer<'a> {
    /// Creates the lexer and reads the first token.
    pub fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Self {
            src,
            chars: src.char_indices().peekable(),
            token: Token::end(0),
        };
        lexer.next_token()?;
        Ok(lexer)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    pub fn text(&self) -> &str {
        &self.token.text
    }

    pub fn offset(&self) -> usize {
        self.token.offset
    }

    pub fn at_delimiter(&self, c: char) -> bool {
        self.token.kind == TokenKind::Delimiter && self.token.text.len() == 1 && self.token.text.starts_with(c)
    }

    pub fn at_symbol(&self, s: &str) -> bool {
        self.token.kind == TokenKind::Symbol && self.token.text == s
    }

    pub fn at_end(&self) -> bool {
        self.token.kind == TokenKind::None
    }

    /// Advances to the next token.
    pub fn next_token(&mut self) -> Result<(), ParseError> {
        while self.peek_char().is_some_and(is_whitespace) {
            self.chars.next();
        }
        let offset = self.pos();
        let Some(c) = self.peek_char() else {
            self.token = Token::end(offset);
            return Ok(());
        };

        self.token = if c == '"' {
            self.read_string(offset)?
        } else if DELIMITERS.contains(&c) {
            self.chars.next();
            Token { kind: TokenKind::Delimiter, text: c.to_string(), offset }
        } else if c.is_ascii_digit() {
            self.read_run(offset, TokenKind::Number, |c| c.is_ascii_digit())
        } else if is_symbol_char(c) {
            self.read_run(offset, TokenKind::Symbol, is_symbol_char)
        } else {
            return Err(ParseError::UnexpectedCharacter { ch: c, offset });
        };
        Ok(())
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len())
    }

    /// Maximal run of characters accepted by `accept`. No decimals or
    /// exponents for numbers.
    fn read_run(&mut self, offset: usize, kind: TokenKind, accept: impl Fn(char) -> bool) -> Token {
        while self.peek_char().is_some_and(&accept) {
            self.chars.next();
        }
        let end = self.pos();
        Token { kind, text: self.src[offset..end].to_string(), offset }
    }

    /// Reads `"..."`. The only escape is `\"`; any other backslash is kept
    /// verbatim.
    fn read_string(&mut self, offset: usize) -> Result<Token, ParseError> {
        self.chars.next(); // opening quote
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ParseError::UnterminatedString { offset }),
                Some((_, '"')) => break,
                Some((_, '\\')) if self.peek_char() == Some('"') => {
                    self.chars.next();
                    text.push('"');
                }
                Some((_, c)) => text.push(c),
            }
        }
        Ok(Token { kind: TokenKind::String, text, offset })
    }
}

// ------------------------------- Tests ------------------------------------ //
