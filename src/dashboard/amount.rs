//! Boundary between the decimal strings kept in storage and `Decimal`.
//!
//! Amounts are stored exactly as the client sent them. Two conventions exist
//! in the data: plain digit strings (`"200000"`) on records, and dot-grouped
//! strings (`"2.500"`) on outcome totals and goal targets. Everything that
//! needs a number goes through this module.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parses a plain decimal string such as `"200000"`, `"-15.5"` or `"1e3"`.
///
/// Returns `None` for blank or malformed input.
pub fn parse_plain(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Parses an amount that uses `.` as a thousands separator, e.g. `"2.500"`.
///
/// Every dot is dropped before parsing, so `"1.5"` reads as fifteen.
pub fn parse_grouped(raw: &str) -> Option<Decimal> {
    let digits: String = raw.chars().filter(|c| *c != '.').collect();
    parse_plain(&digits)
}

/// Renders a sum the way it is exposed on the wire: no trailing zeros,
/// no exponent. `200000.00` becomes `"200000"`.
pub fn to_wire_string(value: Decimal) -> String {
    value.normalize().to_string()
}

/// A monetary or numeric field in a request body.
///
/// Clients send either JSON numbers or strings; both are accepted and turned
/// into the stored string form at the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl AmountInput {
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// A JSON number equal to zero. The string `"0"` is not one.
    pub fn is_zero_number(&self) -> bool {
        matches!(self, Self::Number(n) if n.as_f64() == Some(0.0))
    }

    /// The string written to the store.
    pub fn into_storage(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }

    /// Integer value, truncating any fractional part (`"2025"`, `2025.0`).
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|f| f.is_finite())
    }
}

impl From<&str> for AmountInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for AmountInput {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}
