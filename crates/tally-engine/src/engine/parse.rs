//! Builds an expression tree from a token buffer.
//!
//! Precedence tiers follow [`Operator::tier`]; within a tier operators
//! associate left to right. A leading `-` in a sum is read as `0 - operand`;
//! a `-` where an operand is expected (after another operator or a comma)
//! negates the following power-tier operand.

use crate::builtins::Builtin;

use super::cell_ref::CellRef;
use super::error::FormulaError;
use super::token::{Operator, Token};

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Ref(CellRef),
    DeadRef,
    Range(CellRef, CellRef),
    Call { builtin: Builtin, args: Vec<Expr> },
    Binary { op: Operator, lhs: Box<Expr>, rhs: Box<Expr> },
    Negate(Box<Expr>),
    List(Vec<Expr>),
}

/// Parse a comma-separated token sequence. One segment yields a scalar
/// expression, several yield an [`Expr::List`].
pub fn parse_tokens(tokens: &[Token]) -> Result<Expr, FormulaError> {
    let mut segments = split_commas(tokens)
        .into_iter()
        .map(parse_segment)
        .collect::<Result<Vec<_>, _>>()?;
    if segments.len() == 1 {
        Ok(segments.remove(0))
    } else {
        Ok(Expr::List(segments))
    }
}

fn split_commas(tokens: &[Token]) -> Vec<&[Token]> {
    tokens.split(|t| matches!(t, Token::Comma)).collect()
}

fn parse_segment(tokens: &[Token]) -> Result<Expr, FormulaError> {
    if tokens.is_empty() {
        return Err(FormulaError::MissingOperand);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.sum()?;
    if parser.pos != tokens.len() {
        return Err(FormulaError::TrailingInput);
    }
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_operator(&self, tier: u8) -> Option<Operator> {
        match self.peek() {
            Some(Token::Operator(op)) if op.tier() == tier => Some(*op),
            _ => None,
        }
    }

    /// Tier 0: `+ -`, including the leading-minus form.
    fn sum(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = if self.peek_operator(0) == Some(Operator::Sub) {
            self.pos += 1;
            binary(Operator::Sub, Expr::Number(0.0), self.product()?)
        } else {
            self.product()?
        };
        while let Some(op) = self.peek_operator(0) {
            self.pos += 1;
            lhs = binary(op, lhs, self.product()?);
        }
        Ok(lhs)
    }

    /// Tier 1: `* / %`.
    fn product(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.power()?;
        while let Some(op) = self.peek_operator(1) {
            self.pos += 1;
            lhs = binary(op, lhs, self.power()?);
        }
        Ok(lhs)
    }

    /// Tier 2: `^`.
    fn power(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.operand()?;
        while let Some(op) = self.peek_operator(2) {
            self.pos += 1;
            lhs = binary(op, lhs, self.operand()?);
        }
        Ok(lhs)
    }

    fn operand(&mut self) -> Result<Expr, FormulaError> {
        let expr = match self.next().ok_or(FormulaError::MissingOperand)? {
            Token::Operator(Operator::Sub) => Expr::Negate(Box::new(self.power()?)),
            Token::Operator(_) | Token::Comma => return Err(FormulaError::MissingOperand),
            Token::Number(n) => Expr::Number(*n),
            Token::Quoted(s) => Expr::Text(s.clone()),
            Token::Key(start) => return self.key_or_range(*start),
            Token::DeadRef => {
                // A range with a deleted endpoint is dead as a whole.
                if self.eat_range_operator() {
                    self.next().ok_or(FormulaError::MissingOperand)?;
                }
                return Ok(Expr::DeadRef);
            }
            Token::Function(builtin) => self.call(*builtin)?,
            Token::Group(inner) => {
                if inner.is_empty() {
                    return Err(FormulaError::MissingOperand);
                }
                parse_tokens(inner)?
            }
        };
        if self.peek() == Some(&Token::Operator(Operator::Range)) {
            return Err(FormulaError::InvalidKey);
        }
        Ok(expr)
    }

    fn eat_range_operator(&mut self) -> bool {
        if self.peek() == Some(&Token::Operator(Operator::Range)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn key_or_range(&mut self, start: CellRef) -> Result<Expr, FormulaError> {
        if !self.eat_range_operator() {
            return Ok(Expr::Ref(start));
        }
        match self.next() {
            Some(Token::Key(end)) => Ok(Expr::Range(start, *end)),
            Some(Token::DeadRef) => Ok(Expr::DeadRef),
            Some(_) => Err(FormulaError::InvalidKey),
            None => Err(FormulaError::MissingOperand),
        }
    }

    fn call(&mut self, builtin: Builtin) -> Result<Expr, FormulaError> {
        let Some(Token::Group(inner)) = self.next() else {
            return Err(FormulaError::MissingParentheses);
        };
        if inner.is_empty() {
            return Err(FormulaError::MissingArguments);
        }
        let args = split_commas(inner)
            .into_iter()
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;

        if builtin == Builtin::Ref {
            if args.len() != 1 {
                return Err(FormulaError::MissingArguments);
            }
            let arg = args.into_iter().next().ok_or(FormulaError::MissingArguments)?;
            return match arg {
                Expr::Ref(_) | Expr::DeadRef => Ok(arg),
                _ => Err(FormulaError::InvalidKey),
            };
        }
        Ok(Expr::Call { builtin, args })
    }
}

fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
