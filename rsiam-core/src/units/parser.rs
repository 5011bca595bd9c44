//! Parser for quantity expressions such as `20 GtCO2/yr` or `(trillion USD2005)/(people)`.
//!
//! # Grammar
//!
//! ```text
//! expression = power (('*' | '/')? power)*
//! power      = primary (('^' | '**') exponent)?
//! primary    = number | symbol | '(' expression ')'
//! symbol     = [a-zA-Z_%$] [a-zA-Z0-9_]*
//! exponent   = ('+' | '-')? [0-9]+
//! ```
//!
//! Juxtaposition multiplies, and all binary operators associate to the left,
//! so `20 GtCO2/yr` reads as `(20 * GtCO2) / yr`.

use super::registry::{Dimension, UNIT_REGISTRY};
use crate::errors::QuantityError;
use serde::{Deserialize, Serialize};

/// A magnitude expressed in the reference units of its dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub magnitude: f64,
    pub dimension: Dimension,
}

impl Quantity {
    pub fn dimensionless(magnitude: f64) -> Self {
        Self {
            magnitude,
            dimension: Dimension::dimensionless(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let mut parser = QuantityParser::new(input);
        let quantity = parser.parse_expression()?;
        parser.skip_whitespace();
        if let Some(c) = parser.peek() {
            return Err(parser.error(format!("unexpected character '{c}'")));
        }
        Ok(quantity)
    }

    /// Product of two quantities, or `None` if a dimension exponent overflows
    pub fn checked_mul(self, other: Self) -> Option<Self> {
        Some(Self {
            magnitude: self.magnitude * other.magnitude,
            dimension: self.dimension.checked_mul(other.dimension)?,
        })
    }

    pub fn checked_div(self, other: Self) -> Option<Self> {
        Some(Self {
            magnitude: self.magnitude / other.magnitude,
            dimension: self.dimension.checked_div(other.dimension)?,
        })
    }

    pub fn checked_powi(self, exp: i8) -> Option<Self> {
        Some(Self {
            magnitude: self.magnitude.powi(exp as i32),
            dimension: self.dimension.checked_powi(exp)?,
        })
    }
}

struct QuantityParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> QuantityParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, details: String) -> QuantityError {
        QuantityError::Parse {
            input: self.input.to_string(),
            details,
        }
    }

    fn in_range(&self, quantity: Option<Quantity>) -> Result<Quantity, QuantityError> {
        quantity.ok_or_else(|| self.error("exponent out of range".to_string()))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.input[self.pos..].starts_with(pattern)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let input = self.input;
        let start = self.pos;
        while self.peek().is_some_and(&predicate) {
            self.advance();
        }
        &input[start..self.pos]
    }

    fn parse_expression(&mut self) -> Result<Quantity, QuantityError> {
        let mut result = self.parse_power()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('/') => {
                    self.advance();
                    let rhs = self.parse_power()?;
                    result = self.in_range(result.checked_div(rhs))?;
                }
                Some('*') if !self.starts_with("**") => {
                    self.advance();
                    let rhs = self.parse_power()?;
                    result = self.in_range(result.checked_mul(rhs))?;
                }
                Some(c) if is_primary_start(c) => {
                    let rhs = self.parse_power()?;
                    result = self.in_range(result.checked_mul(rhs))?;
                }
                _ => return Ok(result),
            }
        }
    }

    fn parse_power(&mut self) -> Result<Quantity, QuantityError> {
        let base = self.parse_primary()?;
        self.skip_whitespace();
        if self.starts_with("**") {
            self.pos += 2;
        } else if self.peek() == Some('^') {
            self.advance();
        } else {
            return Ok(base);
        }
        self.skip_whitespace();
        let exp = self.parse_exponent()?;
        self.in_range(base.checked_powi(exp))
    }

    fn parse_primary(&mut self) -> Result<Quantity, QuantityError> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => {
                self.advance();
                let inner = self.parse_expression()?;
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return Err(self.error("missing closing parenthesis".to_string()));
                }
                self.advance();
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' || c == '-' => self.parse_number(),
            Some(c) if is_symbol_start(c) => self.parse_symbol(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of expression".to_string())),
        }
    }

    fn parse_number(&mut self) -> Result<Quantity, QuantityError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        self.take_while(|c| c.is_ascii_digit() || c == '.');

        // `e` starts an exponent only when digits follow it
        let rest = &self.input[self.pos..];
        let mut chars = rest.chars();
        if matches!(chars.next(), Some('e' | 'E')) {
            let after: String = chars.take(2).collect();
            let digits_follow = after.starts_with(|c: char| c.is_ascii_digit())
                || ((after.starts_with('-') || after.starts_with('+'))
                    && after[1..].starts_with(|c: char| c.is_ascii_digit()));
            if digits_follow {
                self.advance();
                if matches!(self.peek(), Some('-' | '+')) {
                    self.advance();
                }
                self.take_while(|c| c.is_ascii_digit());
            }
        }

        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .map(Quantity::dimensionless)
            .map_err(|_| self.error(format!("invalid number '{text}'")))
    }

    fn parse_symbol(&mut self) -> Result<Quantity, QuantityError> {
        let start = self.pos;
        self.advance();
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let symbol = &self.input[start..self.pos];

        UNIT_REGISTRY
            .lookup(symbol)
            .map(|info| Quantity {
                magnitude: info.factor,
                dimension: info.dimension,
            })
            .ok_or_else(|| QuantityError::UnknownUnit(symbol.to_string()))
    }

    fn parse_exponent(&mut self) -> Result<i8, QuantityError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.advance();
        }
        self.take_while(|c| c.is_ascii_digit());
        let text = &self.input[start..self.pos];
        text.parse::<i8>()
            .map_err(|_| self.error(format!("invalid exponent '{text}'")))
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '%' | '$')
}

fn is_primary_start(c: char) -> bool {
    is_symbol_start(c) || c.is_ascii_digit() || c == '.' || c == '('
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn numbers_and_units_multiply() {
        let q = Quantity::parse("20 GtCO2/yr").unwrap();
        assert_eq!(q.dimension, Dimension::MASS.checked_div(Dimension::TIME).unwrap());
        assert_relative_eq!(q.magnitude, 20.0 * 1e12 * 12.0 / 44.0, max_relative = 1e-12);
    }

    #[test]
    fn whitespace_and_operators_are_equivalent() {
        let a = Quantity::parse("trillion USD2005 / yr").unwrap();
        let b = Quantity::parse("(trillion*USD2005)/(yr)").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn exponents() {
        let a = Quantity::parse("USD/yr^2").unwrap();
        let b = Quantity::parse("USD * yr**-2").unwrap();
        assert_eq!(a.dimension, b.dimension);
        assert_eq!(a.dimension.time, -2);
    }

    #[test]
    fn scientific_notation() {
        let q = Quantity::parse("1.5e3 people").unwrap();
        assert_eq!(q.magnitude, 1500.0);
        assert_eq!(q.dimension, Dimension::POPULATION);
    }

    #[test]
    fn unknown_units_are_reported() {
        assert_eq!(
            Quantity::parse("3 furlong"),
            Err(QuantityError::UnknownUnit("furlong".to_string()))
        );
    }

    #[test]
    fn malformed_expressions_are_reported() {
        assert!(matches!(
            Quantity::parse("(USD / yr"),
            Err(QuantityError::Parse { .. })
        ));
        assert!(matches!(
            Quantity::parse("USD )"),
            Err(QuantityError::Parse { .. })
        ));
        assert!(matches!(Quantity::parse(""), Err(QuantityError::Parse { .. })));
    }

    #[test]
    fn overflowing_exponents_are_reported() {
        for input in ["(yr^100)^2", "yr^127 yr", "yr^-128 / yr", "(yr^-128)^-1"] {
            assert!(
                matches!(
                    Quantity::parse(input),
                    Err(QuantityError::Parse { ref details, .. }) if details == "exponent out of range"
                ),
                "{input}"
            );
        }
        assert_eq!(Quantity::parse("yr^127").unwrap().dimension.time, 127);
    }
}
