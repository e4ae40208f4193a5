//! Single-pass tokenizer for the formula language.
//!
//! Scans left to right, skipping spaces. Quoted strings and parenthesised
//! groups are captured whole; a group's interior is tokenized recursively
//! into a nested [`Token::Group`]. Digit runs become numbers, upper-case
//! letter runs become either a cell key (when digits follow) or a function
//! name, which must be followed directly by `(`. Anything else is an error.

use crate::builtins::{Builtin, lookup_builtin};

use super::cell_ref::CellRef;
use super::error::FormulaError;

/// Marker left in formula text where a reference was deleted by a row or
/// column shift.
pub const DEAD_REF: &str = "#REF!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    /// `..`, binds two keys into a rectangular range.
    Range,
}

impl Operator {
    /// Binding tier: 0 = `+ -`, 1 = `* / %`, 2 = `^`. The range operator
    /// binds tighter than any of them.
    pub fn tier(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 0,
            Operator::Mul | Operator::Div | Operator::Rem => 1,
            Operator::Pow => 2,
            Operator::Range => 3,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::Pow => "^",
            Operator::Range => "..",
        }
    }
}

// Longest symbols first so `..` wins over any single-character match.
const OPERATORS: &[Operator] = &[
    Operator::Range,
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Rem,
    Operator::Pow,
];

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Quoted(String),
    Key(CellRef),
    DeadRef,
    Function(Builtin),
    Operator(Operator),
    Comma,
    Group(Vec<Token>),
}

/// Tokenize a complete formula body.
pub fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut lexer = Lexer { src: input, pos: 0 };
    lexer.tokens(false)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl Lexer<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Scan tokens until end of input (top level) or the matching `)`.
    fn tokens(&mut self, nested: bool) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();
        loop {
            while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
                self.pos += c.len_utf8();
            }
            let Some(ch) = self.peek() else {
                return if nested {
                    Err(FormulaError::UnmatchedParenthesis)
                } else {
                    Ok(tokens)
                };
            };

            match ch {
                '"' => tokens.push(self.quoted()?),
                '(' => {
                    self.pos += 1;
                    let inner = self.tokens(true)?;
                    tokens.push(Token::Group(inner));
                }
                ')' => {
                    self.pos += 1;
                    return if nested {
                        Ok(tokens)
                    } else {
                        Err(FormulaError::UnmatchedParenthesis)
                    };
                }
                ',' => {
                    self.pos += 1;
                    tokens.push(Token::Comma);
                }
                '0'..='9' => tokens.push(self.number()?),
                'A'..='Z' => tokens.push(self.word()?),
                _ => {
                    if self.rest().starts_with(DEAD_REF) {
                        self.pos += DEAD_REF.len();
                        tokens.push(Token::DeadRef);
                    } else if let Some(op) = self.operator() {
                        tokens.push(Token::Operator(op));
                    } else {
                        return Err(FormulaError::UnrecognizedInput);
                    }
                }
            }
        }
    }

    fn quoted(&mut self) -> Result<Token, FormulaError> {
        let body_start = self.pos + 1;
        let close = self.src[body_start..]
            .find('"')
            .ok_or(FormulaError::UnterminatedQuote)?;
        let text = self.src[body_start..body_start + close].to_string();
        self.pos = body_start + close + 1;
        Ok(Token::Quoted(text))
    }

    fn number(&mut self) -> Result<Token, FormulaError> {
        let start = self.pos;
        self.skip_digits();
        // A fraction needs a digit after the dot, so `1..2` stays two numbers
        // around a range operator.
        let bytes = self.src.as_bytes();
        if bytes.get(self.pos) == Some(&b'.')
            && bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit)
        {
            self.pos += 1;
            self.skip_digits();
        }
        self.src[start..self.pos]
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FormulaError::UnrecognizedInput)
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn word(&mut self) -> Result<Token, FormulaError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
            self.pos += 1;
        }
        let letters_end = self.pos;
        self.skip_digits();

        if self.pos > letters_end {
            let key = CellRef::parse(&self.src[start..self.pos])
                .map_err(|_| FormulaError::InvalidKey)?;
            return Ok(Token::Key(key));
        }
        let builtin =
            lookup_builtin(&self.src[start..letters_end]).ok_or(FormulaError::UnrecognizedInput)?;
        // The argument group must follow the name directly.
        if self.peek() != Some('(') {
            return Err(FormulaError::MissingParentheses);
        }
        Ok(Token::Function(builtin))
    }

    fn operator(&mut self) -> Option<Operator> {
        let op = OPERATORS
            .iter()
            .copied()
            .find(|op| self.rest().starts_with(op.symbol()))?;
        self.pos += op.symbol().len();
        Some(op)
    }
}
