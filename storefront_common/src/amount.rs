use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_SYMBOL: &str = "₽";

//--------------------------------------       Amount        ---------------------------------------------------------
/// A sum of money in the smallest currency unit. Prices, cart totals and order totals all use this type.
///
/// Arithmetic saturates at the `i64` bounds instead of wrapping or panicking.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add, saturating_add);
op!(binary Amount, Sub, sub, saturating_sub);
op!(inplace Amount, AddAssign, add_assign, saturating_add);

impl Mul<u32> for Amount {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(i64::from(rhs)))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Amount {
    type Error = AmountConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| AmountConversionError(format!("{value} is too large to convert to an amount")))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{CURRENCY_SYMBOL}", self.0)
    }
}

impl Amount {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn line_totals_sum_up() {
        let lines = [(Amount::from(99), 3u32), (Amount::from(250), 2u32)];
        let total: Amount = lines.iter().map(|(price, qty)| *price * *qty).sum();
        assert_eq!(total, Amount::from(797));
        assert_eq!(total.to_string(), "797₽");
    }

    #[test]
    fn arithmetic_saturates() {
        let max = Amount::from(i64::MAX);
        assert_eq!(max * 2, max);
        assert_eq!(max + Amount::from(1), max);
        assert_eq!(Amount::from(i64::MIN) - Amount::from(1), Amount::from(i64::MIN));
        let mut total = Amount::from(i64::MAX - 1);
        total += Amount::from(10);
        assert_eq!(total, max);
        let total: Amount = [max, max, Amount::from(-5)].into_iter().sum();
        assert_eq!(total, Amount::from(i64::MAX - 5));
        assert_eq!(Amount::from(300) - Amount::from(500), Amount::from(-200));
    }

    #[test]
    fn conversion_from_u64() {
        assert_eq!(Amount::try_from(500u64).unwrap(), Amount::from(500));
        assert!(Amount::try_from(u64::MAX).is_err());
        assert!(Amount::default().is_zero());
        assert!(!Amount::from(-1).is_positive());
    }
}
