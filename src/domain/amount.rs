use crate::error::LedgerError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits every amount is held at.
pub const AMOUNT_SCALE: u32 = 7;

/// Largest representable amount: `i64::MAX` units at 7 decimals.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(u32::MAX, i32::MAX as u32, 0, false, AMOUNT_SCALE);

/// Checks that `value` is a well-formed ledger amount.
///
/// Negative values, values finer than [`AMOUNT_SCALE`] and values above
/// [`MAX_AMOUNT`] are rejected. Zero is rejected unless `allow_zero` is set.
pub fn validate_amount(field: &str, value: Decimal, allow_zero: bool) -> Result<(), LedgerError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LedgerError::validation(format!("{field} must not be negative")));
    }
    if value.is_zero() && !allow_zero {
        return Err(LedgerError::validation(format!("{field} must be positive")));
    }
    if value.normalize().scale() > AMOUNT_SCALE {
        return Err(LedgerError::validation(format!(
            "{field} has more than {AMOUNT_SCALE} decimal places"
        )));
    }
    if value > MAX_AMOUNT {
        return Err(LedgerError::validation(format!("{field} exceeds maximum amount")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::Down => RoundingStrategy::ToZero,
            Rounding::Up => RoundingStrategy::AwayFromZero,
        }
    }
}

/// Exact rational price: `n` units of the buying asset per `d` units of the selling asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    pub n: u32,
    pub d: u32,
}

impl Price {
    pub const ONE: Price = Price { n: 1, d: 1 };

    pub fn new(n: u32, d: u32) -> Result<Self, LedgerError> {
        let price = Self { n, d };
        price.validate()?;
        Ok(price)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.n == 0 || self.d == 0 {
            return Err(LedgerError::validation("price must be positive"));
        }
        Ok(())
    }

    pub fn inverse(&self) -> Price {
        Price {
            n: self.d,
            d: self.n,
        }
    }

    /// Compares two prices by value rather than by representation.
    pub fn cmp_value(&self, other: &Price) -> Ordering {
        let lhs = u64::from(self.n) * u64::from(other.d);
        let rhs = u64::from(other.n) * u64::from(self.d);
        lhs.cmp(&rhs)
    }

    /// Whether a taker at this price accepts a resting offer on the opposite side.
    ///
    /// Both prices are quoted as buying-per-selling from their owner's point of
    /// view, so they cross when their product is at most one.
    pub fn crosses(&self, resting: &Price) -> bool {
        u64::from(self.n) * u64::from(resting.n) <= u64::from(self.d) * u64::from(resting.d)
    }

    /// `amount * n / d` at ledger scale.
    pub fn mul_amount(&self, amount: Decimal, rounding: Rounding) -> Result<Decimal, LedgerError> {
        scale(amount, self.n, self.d, rounding)
    }

    /// `amount * d / n` at ledger scale.
    pub fn div_amount(&self, amount: Decimal, rounding: Rounding) -> Result<Decimal, LedgerError> {
        scale(amount, self.d, self.n, rounding)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.n) / Decimal::from(self.d)
    }
}

fn scale(amount: Decimal, num: u32, den: u32, rounding: Rounding) -> Result<Decimal, LedgerError> {
    let value = amount
        .checked_mul(Decimal::from(num))
        .and_then(|v| v.checked_div(Decimal::from(den)))
        .ok_or_else(|| LedgerError::validation("amount overflow while applying price"))?;
    let rounded = value.round_dp_with_strategy(AMOUNT_SCALE, rounding.strategy());
    if rounded > MAX_AMOUNT {
        return Err(LedgerError::validation("amount overflow while applying price"));
    }
    Ok(rounded)
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl TryFrom<Decimal> for Price {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::validation("price must be positive"));
        }
        let value = value.normalize();
        let mantissa = value.mantissa().unsigned_abs();
        let denominator = 10u128.pow(value.scale());
        let divisor = gcd(mantissa, denominator);
        let (n, d) = (mantissa / divisor, denominator / divisor);
        match (u32::try_from(n), u32::try_from(d)) {
            (Ok(n), Ok(d)) => Price::new(n, d),
            _ => Err(LedgerError::validation(format!(
                "price {value} is not representable"
            ))),
        }
    }
}

impl FromStr for Price {
    type Err = LedgerError;

    /// Accepts `n/d` or a plain decimal such as `1.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((n, d)) = s.split_once('/') {
            let parse = |part: &str| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| LedgerError::validation(format!("invalid price '{s}'")))
            };
            return Price::new(parse(n)?, parse(d)?);
        }
        let value = Decimal::from_str(s)
            .map_err(|_| LedgerError::validation(format!("invalid price '{s}'")))?;
        Price::try_from(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.n, self.d)
    }
}
