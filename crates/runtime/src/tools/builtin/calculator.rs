//! Arithmetic calculator.
//!
//! Evaluates numeric literals combined with `+ - * / % **`, parentheses and
//! unary minus. There are no identifiers or calls, so nothing but arithmetic
//! can ever run.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::render_float;
use crate::tools::{CALC, Tool, ToolArgs, ToolError, ToolSchema};

const MAX_DEPTH: usize = 64;

/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,
    #[error("unsupported character '{0}' in expression")]
    UnexpectedChar(char),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected '{0}' in expression")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression is nested too deeply")]
    TooDeep,
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("result is not a real number")]
    NotReal,
    #[error("result too large")]
    Overflow,
}

impl From<EvalError> for ToolError {
    fn from(e: EvalError) -> Self {
        ToolError::Execution(e.to_string())
    }
}

/// A calculator value. Integers stay integral until an operation needs a
/// float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn float(value: f64) -> Result<Self, EvalError> {
        if value.is_infinite() {
            Err(EvalError::Overflow)
        } else {
            Ok(Number::Float(value))
        }
    }

    fn add(self, rhs: Self) -> Result<Self, EvalError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
                Some(sum) => Ok(Number::Int(sum)),
                None => Self::float(a as f64 + b as f64),
            },
            (a, b) => Self::float(a.as_f64() + b.as_f64()),
        }
    }

    fn sub(self, rhs: Self) -> Result<Self, EvalError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_sub(b) {
                Some(diff) => Ok(Number::Int(diff)),
                None => Self::float(a as f64 - b as f64),
            },
            (a, b) => Self::float(a.as_f64() - b.as_f64()),
        }
    }

    fn mul(self, rhs: Self) -> Result<Self, EvalError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_mul(b) {
                Some(product) => Ok(Number::Int(product)),
                None => Self::float(a as f64 * b as f64),
            },
            (a, b) => Self::float(a.as_f64() * b.as_f64()),
        }
    }

    fn div(self, rhs: Self) -> Result<Self, EvalError> {
        let divisor = rhs.as_f64();
        if divisor == 0.0 {
            return Err(EvalError::DivisionByZero);
        }
        Self::float(self.as_f64() / divisor)
    }

    // Floor modulo: the result takes the sign of the divisor.
    fn rem(self, rhs: Self) -> Result<Self, EvalError> {
        match (self, rhs) {
            (Number::Int(_), Number::Int(0)) => Err(EvalError::ModuloByZero),
            (Number::Int(a), Number::Int(b)) => {
                let r = a.checked_rem(b).unwrap_or(0);
                Ok(Number::Int(if r != 0 && (r < 0) != (b < 0) { r + b } else { r }))
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if b == 0.0 {
                    return Err(EvalError::ModuloByZero);
                }
                let r = a % b;
                let r = if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    r + b
                } else if r == 0.0 {
                    0.0_f64.copysign(b)
                } else {
                    r
                };
                Self::float(r)
            }
        }
    }

    fn pow(self, rhs: Self) -> Result<Self, EvalError> {
        if let (Number::Int(base), Number::Int(exp)) = (self, rhs) {
            if exp >= 0 {
                let exact = u32::try_from(exp).ok().and_then(|e| base.checked_pow(e));
                return match exact {
                    Some(value) => Ok(Number::Int(value)),
                    None => Self::float((base as f64).powf(exp as f64)),
                };
            }
        }

        let (base, exp) = (self.as_f64(), rhs.as_f64());
        if base == 0.0 && exp < 0.0 {
            return Err(EvalError::DivisionByZero);
        }
        if base < 0.0 && exp.fract() != 0.0 {
            return Err(EvalError::NotReal);
        }
        Self::float(base.powf(exp))
    }

    fn neg(self) -> Result<Self, EvalError> {
        match self {
            Number::Int(i) => match i.checked_neg() {
                Some(n) => Ok(Number::Int(n)),
                None => Self::float(-(i as f64)),
            },
            Number::Float(f) => Ok(Number::Float(-f)),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(&render_float(*x)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Pow,
    Slash,
    Percent,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{n}"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Pow => f.write_str("**"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let (number, next) = scan_number(&chars, i)?;
                i = next;
                tokens.push(Token::Num(number));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Pow
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(EvalError::UnexpectedChar(other)),
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

// Scans `digits [. digits] [e [+-] digits]` starting at `start`.
fn scan_number(chars: &[char], start: usize) -> Result<(Number, usize), EvalError> {
    let digits_from = |mut i: usize| {
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        i
    };

    let mut end = digits_from(start);
    let mut is_float = false;

    if chars.get(end) == Some(&'.') {
        is_float = true;
        end = digits_from(end + 1);
    }

    if matches!(chars.get(end), Some('e' | 'E')) {
        let mut exp = end + 1;
        if matches!(chars.get(exp), Some('+' | '-')) {
            exp += 1;
        }
        if chars.get(exp).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            end = digits_from(exp);
        }
    }

    let literal: String = chars[start..end].iter().collect();
    if literal == "." {
        return Err(EvalError::InvalidNumber(literal));
    }

    let number = if is_float {
        literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| EvalError::InvalidNumber(literal.clone()))?
    } else {
        match literal.parse::<i64>() {
            Ok(i) => Number::Int(i),
            Err(_) => literal
                .parse::<f64>()
                .map(Number::Float)
                .map_err(|_| EvalError::InvalidNumber(literal.clone()))?,
        }
    };

    Ok((number, end))
}

/// Recursive-descent evaluator.
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := unary (('*' | '/' | '%') unary)*
/// unary  := '-' unary | power
/// power  := atom ('**' unary)?
/// atom   := NUMBER | '(' expr ')'
/// ```
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Number, EvalError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value = value.add(self.term()?)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value = value.sub(self.term()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<Number, EvalError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value = value.mul(self.unary()?)?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    value = value.div(self.unary()?)?;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    value = value.rem(self.unary()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<Number, EvalError> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            self.descend()?;
            let value = self.unary()?.neg();
            self.depth -= 1;
            return value;
        }
        self.power()
    }

    fn power(&mut self) -> Result<Number, EvalError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            self.descend()?;
            let exp = self.unary();
            self.depth -= 1;
            return base.pow(exp?);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, EvalError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(EvalError::UnexpectedToken(other.to_string())),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(other) => Err(EvalError::UnexpectedToken(other.to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

/// Evaluate a bare arithmetic expression.
pub fn evaluate(expr: &str) -> Result<Number, EvalError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.next() {
        None => Ok(value),
        Some(extra) => Err(EvalError::UnexpectedToken(extra.to_string())),
    }
}

/// Evaluate a loosely phrased arithmetic question such as `what is 2 plus 3`
/// or `20% of 150`.
pub fn calculate(input: &str) -> Result<Number, EvalError> {
    let lowered = input.to_lowercase().replace("what is", "");
    let cleaned = lowered.trim();

    if let Some((left, right)) = cleaned.split_once("% of") {
        let percent = parse_operand(left)?;
        let whole = parse_operand(right)?;
        return Number::float(percent / 100.0 * whole);
    }

    let normalized = cleaned
        .replace("add ", "")
        .replace("plus ", "+")
        .replace(" to the ", " + ");
    evaluate(&normalized)
}

fn parse_operand(raw: &str) -> Result<f64, EvalError> {
    let raw = raw.trim();
    raw.parse::<f64>()
        .map_err(|_| EvalError::InvalidNumber(raw.to_string()))
}

/// The `calc` tool.
#[derive(Debug, Default)]
pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn schema(&self) -> &ToolSchema {
        &CALC
    }

    async fn execute(&self, args: &ToolArgs, _question: &str) -> Result<Value, ToolError> {
        let expr = args.str("expr")?;
        let value = calculate(expr)?;
        Ok(Value::String(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(input: &str) -> String {
        calculate(input).unwrap().to_string()
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(calc("25 * 4"), "100");
        assert_eq!(calc("15 + 25"), "40");
        assert_eq!(calc("2 ** 10"), "1024");
        assert_eq!(calc("7 - 10"), "-3");
    }

    #[test]
    fn percent_of_form() {
        assert_eq!(calc("20% of 150"), "30.0");
        assert_eq!(calc("What is 50% of 8"), "4.0");
    }

    #[test]
    fn division_always_yields_float() {
        assert_eq!(calc("10 / 4"), "2.5");
        assert_eq!(calc("8 / 2"), "4.0");
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(calc("2 + 3 * 4"), "14");
        assert_eq!(calc("(2 + 3) * 4"), "20");
        assert_eq!(calc("2 ** 3 ** 2"), "512");
        assert_eq!(calc("-2 ** 2"), "-4");
        assert_eq!(calc("2 ** -1"), "0.5");
        assert_eq!(calc("--3"), "3");
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        assert_eq!(calc("7 % 3"), "1");
        assert_eq!(calc("-7 % 3"), "2");
        assert_eq!(calc("7 % -3"), "-2");
        assert_eq!(calc("7.5 % 2"), "1.5");
    }

    #[test]
    fn phrase_normalization() {
        assert_eq!(calc("what is 2 plus 3"), "5");
        assert_eq!(calc("add 4 to the 5"), "9");
    }

    #[test]
    fn literals() {
        assert_eq!(calc("1.5 * 2"), "3.0");
        assert_eq!(calc(".5 + 1"), "1.5");
        assert_eq!(calc("1e3"), "1000.0");
        assert_eq!(calc("99999999999999999999"), "1e+20");
    }

    #[test]
    fn integer_overflow_falls_back_to_float() {
        assert_eq!(calc("9223372036854775807 + 1"), "9.223372036854776e+18");
    }

    #[test]
    fn identifiers_and_calls_are_rejected() {
        assert_eq!(
            calculate("__import__('os')"),
            Err(EvalError::UnexpectedChar('_'))
        );
        assert_eq!(calculate("x + 1"), Err(EvalError::UnexpectedChar('x')));
        assert!(calculate("abs(-3)").is_err());
    }

    #[test]
    fn malformed_expressions() {
        assert_eq!(calculate(""), Err(EvalError::Empty));
        assert_eq!(calculate("what is"), Err(EvalError::Empty));
        assert_eq!(calculate("1 +"), Err(EvalError::UnexpectedEnd));
        assert_eq!(calculate("(1 + 2"), Err(EvalError::UnexpectedEnd));
        assert_eq!(
            calculate("1 2"),
            Err(EvalError::UnexpectedToken("2".into()))
        );
        assert_eq!(
            calculate("4 // 2"),
            Err(EvalError::UnexpectedToken("/".into()))
        );
        assert_eq!(calculate("+1"), Err(EvalError::UnexpectedToken("+".into())));
        assert!(matches!(
            calculate("abc% of 10"),
            Err(EvalError::InvalidNumber(_))
        ));
    }

    #[test]
    fn arithmetic_errors() {
        assert_eq!(calculate("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(calculate("5 % 0"), Err(EvalError::ModuloByZero));
        assert_eq!(calculate("0 ** -1"), Err(EvalError::DivisionByZero));
        assert_eq!(calculate("(-8) ** 0.5"), Err(EvalError::NotReal));
        assert_eq!(calculate("10.0 ** 400"), Err(EvalError::Overflow));
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let expr = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(calculate(&expr), Err(EvalError::TooDeep));
        let expr = format!("{}1", "-".repeat(200));
        assert_eq!(calculate(&expr), Err(EvalError::TooDeep));
    }

    #[tokio::test]
    async fn tool_returns_string_result() {
        let args = ToolArgs::new().with("expr", "25 * 4");
        let value = Calculator.execute(&args, "").await.unwrap();
        assert_eq!(value, Value::String("100".into()));
    }

    #[tokio::test]
    async fn tool_reports_parse_errors() {
        let args = ToolArgs::new().with("expr", "import os");
        let err = Calculator.execute(&args, "").await.unwrap_err();
        assert_eq!(
            err,
            ToolError::Execution("unsupported character 'i' in expression".into())
        );
    }
}
