//! Arithmetic expression evaluation for CPT and CMP operands.
//!
//! A small recursive-descent evaluator over the operand's expression text:
//! `+ - * / MOD`, unary minus, parentheses, and the comparison operators
//! `= <> < <= > >=` (yielding 1 or 0). Identifiers resolve through
//! [`SimulationState::resolve_number`], so tag references, timer/counter
//! members, and indexed elements all work. Malformed input evaluates to
//! `0.0`; the evaluator never fails.

use crate::state::SimulationState;

/// Evaluate an expression operand against the current state.
#[must_use]
pub(crate) fn evaluate(source: &str, state: &SimulationState) -> f64 {
    let mut parser = Parser {
        bytes: source.as_bytes(),
        pos: 0,
        state,
    };
    match parser.expression() {
        Some(value) => {
            parser.skip_ws();
            if parser.pos == parser.bytes.len() {
                value
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: &'a SimulationState,
}

impl<'a> Parser<'a> {
    fn expression(&mut self) -> Option<f64> {
        let left = self.additive()?;
        self.skip_ws();
        let op = match self.peek() {
            Some(b'=') => {
                self.pos += 1;
                CmpOp::Eq
            }
            Some(b'<') => {
                self.pos += 1;
                match self.peek() {
                    Some(b'>') => {
                        self.pos += 1;
                        CmpOp::Ne
                    }
                    Some(b'=') => {
                        self.pos += 1;
                        CmpOp::Le
                    }
                    _ => CmpOp::Lt,
                }
            }
            Some(b'>') => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    CmpOp::Ge
                } else {
                    CmpOp::Gt
                }
            }
            _ => return Some(left),
        };
        let right = self.additive()?;
        let holds = match op {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        };
        Some(f64::from(u8::from(holds)))
    }

    fn additive(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Some(value),
            }
        }
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.unary()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    value = if divisor == 0.0 { 0.0 } else { value / divisor };
                }
                _ => {
                    if self.eat_keyword("MOD") {
                        let divisor = self.unary()?;
                        value = if divisor == 0.0 { 0.0 } else { value % divisor };
                    } else {
                        return Some(value);
                    }
                }
            }
        }
    }

    fn unary(&mut self) -> Option<f64> {
        self.skip_ws();
        if self.peek() == Some(b'-') {
            self.pos += 1;
            return Some(-self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<f64> {
        self.skip_ws();
        match self.peek()? {
            b'(' => {
                self.pos += 1;
                let value = self.expression()?;
                self.skip_ws();
                if self.peek() == Some(b')') {
                    self.pos += 1;
                    Some(value)
                } else {
                    None
                }
            }
            b'0'..=b'9' | b'.' => self.number(),
            c if ident_start(c) => {
                let ident = self.identifier();
                Some(self.state.resolve_number(ident))
            }
            _ => None,
        }
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).ok()?;
        text.parse::<f64>().ok()
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if ident_continue(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("")
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let end = self.pos + keyword.len();
        if end > self.bytes.len() {
            return false;
        }
        let slice = &self.bytes[self.pos..end];
        if !slice.eq_ignore_ascii_case(keyword.as_bytes()) {
            return false;
        }
        // Must not run into a longer identifier.
        if self.bytes.get(end).copied().is_some_and(ident_continue) {
            return false;
        }
        self.pos = end;
        true
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek() == Some(b' ') || self.peek() == Some(b'\t') {
            self.pos += 1;
        }
    }
}

fn ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'[' | b']' | b'.')
}
