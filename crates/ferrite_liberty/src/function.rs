//! Boolean port functions.
//!
//! Output ports carry a Liberty-style function string such as `!(A1&A2)` or
//! `(A B) | C`. Functions are parsed into a [`LogicExpr`] and evaluated into
//! truth tables, which drive cell classification (buffer, inverter, tie),
//! cell equivalence, and input-pin symmetry detection.

use std::collections::BTreeSet;
use std::fmt;

/// Largest number of inputs for which truth tables are enumerated.
pub const MAX_TRUTH_TABLE_INPUTS: usize = 12;

/// A parsed boolean expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicExpr {
    /// Constant `0` or `1`.
    Const(bool),
    /// Reference to an input port.
    Var(String),
    /// Negation.
    Not(Box<LogicExpr>),
    /// Conjunction.
    And(Box<LogicExpr>, Box<LogicExpr>),
    /// Disjunction.
    Or(Box<LogicExpr>, Box<LogicExpr>),
    /// Exclusive or.
    Xor(Box<LogicExpr>, Box<LogicExpr>),
}

/// A function string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bad function '{text}' at offset {offset}: {message}")]
pub struct FunctionError {
    /// The offending function text.
    pub text: String,
    /// Byte offset of the problem.
    pub offset: usize,
    /// What went wrong.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Const(bool),
    Not,
    Quote,
    And,
    Or,
    Xor,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, FunctionError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        let tok = match c {
            ' ' | '\t' | '"' => {
                i += 1;
                continue;
            }
            '!' => Token::Not,
            '\'' => Token::Quote,
            '&' | '*' => Token::And,
            '|' | '+' => Token::Or,
            '^' => Token::Xor,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '0' | '1' if !next_is_ident(bytes, i + 1) => Token::Const(c == '1'),
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                tokens.push((start, Token::Ident(text[start..i].to_string())));
                continue;
            }
            other => {
                return Err(FunctionError {
                    text: text.to_string(),
                    offset: i,
                    message: format!("unexpected character '{other}'"),
                })
            }
        };
        tokens.push((i, tok));
        i += 1;
    }
    Ok(tokens)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'[' | b']' | b'.')
}

fn next_is_ident(bytes: &[u8], i: usize) -> bool {
    i < bytes.len() && is_ident_byte(bytes[i])
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn error(&self, message: &str) -> FunctionError {
        let offset = self
            .tokens
            .get(self.pos)
            .map_or(self.text.len(), |(o, _)| *o);
        FunctionError {
            text: self.text.to_string(),
            offset,
            message: message.to_string(),
        }
    }

    fn parse_or(&mut self) -> Result<LogicExpr, FunctionError> {
        let mut lhs = self.parse_xor()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_xor()?;
            lhs = LogicExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<LogicExpr, FunctionError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Xor) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = LogicExpr::Xor(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<LogicExpr, FunctionError> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::And) => self.pos += 1,
                // Juxtaposition is conjunction: "A B" == "A&B".
                Some(Token::Ident(_) | Token::Const(_) | Token::Not | Token::LParen) => {}
                _ => break,
            }
            let rhs = self.parse_unary()?;
            lhs = LogicExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<LogicExpr, FunctionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(LogicExpr::Not(Box::new(inner)));
        }
        let mut expr = self.parse_primary()?;
        while self.peek() == Some(&Token::Quote) {
            self.pos += 1;
            expr = LogicExpr::Not(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<LogicExpr, FunctionError> {
        let expr = match self.peek().cloned() {
            Some(Token::Ident(name)) => LogicExpr::Var(name),
            Some(Token::Const(v)) => LogicExpr::Const(v),
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                inner
            }
            Some(_) => return Err(self.error("expected an operand")),
            None => return Err(self.error("unexpected end of function")),
        };
        self.pos += 1;
        Ok(expr)
    }
}

impl LogicExpr {
    /// Parses a Liberty-style function string.
    pub fn parse(text: &str) -> Result<Self, FunctionError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            text,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(expr)
    }

    /// Evaluates the expression. Returns `None` if a variable is unbound.
    pub fn eval(&self, env: &dyn Fn(&str) -> Option<bool>) -> Option<bool> {
        Some(match self {
            LogicExpr::Const(v) => *v,
            LogicExpr::Var(name) => env(name)?,
            LogicExpr::Not(e) => !e.eval(env)?,
            LogicExpr::And(a, b) => a.eval(env)? & b.eval(env)?,
            LogicExpr::Or(a, b) => a.eval(env)? | b.eval(env)?,
            LogicExpr::Xor(a, b) => a.eval(env)? ^ b.eval(env)?,
        })
    }

    /// Collects every variable name referenced by the expression.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            LogicExpr::Const(_) => {}
            LogicExpr::Var(name) => {
                out.insert(name.clone());
            }
            LogicExpr::Not(e) => e.collect_variables(out),
            LogicExpr::And(a, b) | LogicExpr::Or(a, b) | LogicExpr::Xor(a, b) => {
                a.collect_variables(out);
                b.collect_variables(out);
            }
        }
    }

    /// Enumerates the truth table over `inputs` (first input is the least
    /// significant bit of the row index).
    ///
    /// Returns `None` if there are too many inputs or the expression
    /// references a name outside `inputs`.
    pub fn truth_table(&self, inputs: &[String]) -> Option<Vec<bool>> {
        self.truth_table_permuted(inputs, &|i| i)
    }

    /// Like [`truth_table`](Self::truth_table) but input `i` takes its value
    /// from row bit `permute(i)`. Used to test symmetry under pin swaps.
    pub fn truth_table_permuted(
        &self,
        inputs: &[String],
        permute: &dyn Fn(usize) -> usize,
    ) -> Option<Vec<bool>> {
        if inputs.len() > MAX_TRUTH_TABLE_INPUTS {
            return None;
        }
        let rows = 1usize << inputs.len();
        let mut table = Vec::with_capacity(rows);
        for row in 0..rows {
            let env = |name: &str| {
                inputs
                    .iter()
                    .position(|n| n == name)
                    .map(|i| (row >> permute(i)) & 1 == 1)
            };
            table.push(self.eval(&env)?);
        }
        Some(table)
    }
}

impl fmt::Display for LogicExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicExpr::Const(v) => write!(f, "{}", u8::from(*v)),
            LogicExpr::Var(name) => write!(f, "{name}"),
            LogicExpr::Not(e) => write!(f, "!{e}"),
            LogicExpr::And(a, b) => write!(f, "({a}&{b})"),
            LogicExpr::Or(a, b) => write!(f, "({a}|{b})"),
            LogicExpr::Xor(a, b) => write!(f, "({a}^{b})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_operators_and_precedence() {
        let e = LogicExpr::parse("A|B&C").unwrap();
        assert_eq!(e.to_string(), "(A|(B&C))");
        let e = LogicExpr::parse("!(A1 A2)").unwrap();
        assert_eq!(e.to_string(), "!(A1&A2)");
        let e = LogicExpr::parse("A'+B*C^D").unwrap();
        assert_eq!(e.to_string(), "(!A|((B&C)^D))");
    }

    #[test]
    fn parse_constants_and_quotes() {
        assert_eq!(LogicExpr::parse("\"1\"").unwrap(), LogicExpr::Const(true));
        assert_eq!(LogicExpr::parse("0").unwrap(), LogicExpr::Const(false));
        assert_eq!(LogicExpr::parse("A").unwrap(), LogicExpr::Var("A".into()));
    }

    #[test]
    fn parse_errors_report_offset() {
        let err = LogicExpr::parse("(A&B").unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(LogicExpr::parse("A&").is_err());
        assert!(LogicExpr::parse("A$B").is_err());
        assert!(LogicExpr::parse("A)").is_err());
    }

    #[test]
    fn truth_table_of_nand() {
        let e = LogicExpr::parse("!(A&B)").unwrap();
        let table = e.truth_table(&names(&["A", "B"])).unwrap();
        assert_eq!(table, vec![true, true, true, false]);
    }

    #[test]
    fn unbound_variable_has_no_table() {
        let e = LogicExpr::parse("A&Z").unwrap();
        assert!(e.truth_table(&names(&["A", "B"])).is_none());
        assert_eq!(e.variables().into_iter().collect::<Vec<_>>(), names(&["A", "Z"]));
    }

    #[test]
    fn permuted_table_detects_symmetry() {
        let and = LogicExpr::parse("A&B").unwrap();
        let inputs = names(&["A", "B"]);
        let swap = |i: usize| 1 - i;
        assert_eq!(
            and.truth_table(&inputs),
            and.truth_table_permuted(&inputs, &swap)
        );
        let mux_like = LogicExpr::parse("A&!B").unwrap();
        assert_ne!(
            mux_like.truth_table(&inputs),
            mux_like.truth_table_permuted(&inputs, &swap)
        );
    }
}
