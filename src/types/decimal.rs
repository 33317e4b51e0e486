//! Fixed-point decimal values for the `decimal` extension.

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal `{0}`")]
pub struct ParseDecimalError(pub String);

const SCALE: i64 = 10_000;

/// A signed fixed-point number with four fractional digits, stored as
/// ten-thousandths in an i64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i64);

impl Decimal {
    /// Parse `-?digits(.digits)?` with at most four fractional digits.
    pub fn parse(literal: &str) -> Result<Self, ParseDecimalError> {
        let err = || ParseDecimalError(literal.to_string());
        let (negative, body) = match literal.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, literal),
        };
        let (int_text, frac_text) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_text.is_empty()
            || !int_text.bytes().all(|b| b.is_ascii_digit())
            || frac_text.len() > 4
            || !frac_text.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }
        let int_part: i64 = int_text.parse().map_err(|_| err())?;
        let mut frac_part: i64 = if frac_text.is_empty() {
            0
        } else {
            frac_text.parse().map_err(|_| err())?
        };
        for _ in frac_text.len()..4 {
            frac_part *= 10;
        }
        let magnitude = int_part
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(frac_part))
            .ok_or_else(err)?;
        let units = if negative {
            magnitude.checked_neg().ok_or_else(err)?
        } else {
            magnitude
        };
        Ok(Decimal(units))
    }

    /// Raw value in ten-thousandths.
    pub fn units(&self) -> i64 {
        self.0
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.0 < 0 {
            write!(f, "-")?;
        }
        let magnitude = self.0.unsigned_abs();
        let int_part = magnitude / SCALE as u64;
        let frac_part = magnitude % SCALE as u64;
        let mut frac = format!("{frac_part:04}");
        while frac.len() > 1 && frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "{int_part}.{frac}")
    }
}
