//! Money values held as non-negative integer cents
//!
//! String input is disambiguated by shape: anything containing a decimal
//! point or an exponent is a dollar amount (`"19.99"`, `"1.5e1"`), anything
//! else is a plain count of cents (`"1999"`). Parsing is exact decimal
//! arithmetic; amounts finer than one cent are rejected rather than rounded.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static DOLLAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<int>\d*)(?:\.(?P<frac>\d*))?(?:[eE](?P<exp>[-+]?\d+))?$").unwrap()
});

/// Largest power of ten that fits in a `u64`
const MAX_POW10: u32 = 19;

/// A price in integer cents
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "RawMoney", into = "u64")]
pub struct MoneyValue(u64);

impl MoneyValue {
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents_value(self) -> u64 {
        self.0
    }

    /// Parse either a dollar amount or a cents count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMoney`] for empty, negative, malformed,
    /// overflowing or sub-cent input.
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::money(value, "empty value"));
        }
        if value.starts_with('-') {
            return Err(Error::money(value, "negative amounts are not allowed"));
        }

        if value.contains(['.', 'e', 'E']) {
            parse_dollars(value).map(Self)
        } else {
            parse_cents(value).map(Self)
        }
    }
}

fn parse_cents(value: &str) -> Result<u64> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::money(value, "expected an integer number of cents"));
    }
    value
        .parse::<u64>()
        .map_err(|e| Error::money(value, e.to_string()))
}

fn parse_dollars(value: &str) -> Result<u64> {
    let caps = DOLLAR_PATTERN
        .captures(value)
        .ok_or_else(|| Error::money(value, "expected a decimal dollar amount"))?;

    let int = caps.name("int").map_or("", |m| m.as_str());
    let frac = caps.name("frac").map_or("", |m| m.as_str());
    if int.is_empty() && frac.is_empty() {
        return Err(Error::money(value, "no digits"));
    }

    let exp: i64 = match caps.name("exp") {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| Error::money(value, "exponent out of range"))?,
        None => 0,
    };

    // value = digits * 10^(exp - frac.len()) dollars = digits * 10^shift cents
    let mut digits = format!("{int}{frac}");
    let mut shift = exp
        .checked_sub(frac.len() as i64)
        .and_then(|s| s.checked_add(2))
        .ok_or_else(|| Error::money(value, "exponent out of range"))?;

    while shift < 0 && digits.ends_with('0') {
        digits.pop();
        shift += 1;
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    if shift < 0 {
        return Err(Error::money(value, "precision finer than one cent"));
    }

    let overflow = || Error::money(value, "amount too large");
    let base: u64 = digits.parse().map_err(|_| overflow())?;
    let shift = u32::try_from(shift).map_err(|_| overflow())?;
    if shift > MAX_POW10 {
        return Err(overflow());
    }
    base.checked_mul(10u64.pow(shift)).ok_or_else(overflow)
}

impl FromStr for MoneyValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MoneyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<MoneyValue> for u64 {
    fn from(value: MoneyValue) -> Self {
        value.0
    }
}

/// Wire shapes accepted when deserializing a price
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMoney {
    Cents(u64),
    Text(String),
}

impl TryFrom<RawMoney> for MoneyValue {
    type Error = Error;

    fn try_from(raw: RawMoney) -> Result<Self> {
        match raw {
            RawMoney::Cents(cents) => Ok(Self(cents)),
            RawMoney::Text(text) => Self::parse(&text),
        }
    }
}
