//! Monetary amounts and time-based charging.
//!
//! Amounts are held in integer minor units (cents) so billing never
//! accumulates floating-point drift. Charges accrue as `rate × elapsed`
//! in cent-milliseconds and are rounded half-up to whole cents only once,
//! when the total is read back as [`Money`].

use std::iter::Sum;
use std::ops::Add;

use chrono::TimeDelta;

/// Largest accepted amount in major units.
pub const MONEY_MAJOR_MAX: f64 = 1_000_000_000.0;

const MILLIS_PER_HOUR: i128 = 3_600_000;

/// Validation errors for monetary amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// NaN or infinite input.
    #[error("amount must be a finite number")]
    NotFinite,
    /// Negative input.
    #[error("amount must not be negative")]
    Negative,
    /// Input above [`MONEY_MAJOR_MAX`].
    #[error("amount is too large")]
    TooLarge,
}

/// Non-negative amount of money in minor units.
///
/// # Examples
/// ```
/// use parking_backend::domain::Money;
///
/// let rate = Money::from_major_units(12.5).unwrap();
/// assert_eq!(rate.minor_units(), 1250);
/// assert_eq!(rate.as_major_units(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Construct from minor units (cents).
    pub fn from_minor_units(cents: i64) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self(cents))
    }

    /// Construct from a decimal amount in major units, rounding to cents.
    pub fn from_major_units(amount: f64) -> Result<Self, MoneyError> {
        if !amount.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        if amount < 0.0 {
            return Err(MoneyError::Negative);
        }
        if amount > MONEY_MAJOR_MAX {
            return Err(MoneyError::TooLarge);
        }
        // Bounded above, so the cast cannot overflow.
        Ok(Self((amount * 100.0).round() as i64))
    }

    /// Amount in minor units.
    pub fn minor_units(self) -> i64 {
        self.0
    }

    /// Amount in major units, for presentation.
    pub fn as_major_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Accrue this hourly rate over `elapsed`. Negative spans accrue nothing.
    pub fn accrue_hourly(self, elapsed: TimeDelta) -> Accrual {
        let millis = i128::from(elapsed.num_milliseconds().max(0));
        Accrual(i128::from(self.0) * millis)
    }

    /// Hourly-rate charge for `elapsed`, rounded to cents.
    ///
    /// # Examples
    /// ```
    /// use chrono::TimeDelta;
    /// use parking_backend::domain::Money;
    ///
    /// let rate = Money::from_major_units(20.0).unwrap();
    /// let cost = rate.charge_for(TimeDelta::minutes(150));
    /// assert_eq!(cost.as_major_units(), 50.0);
    /// ```
    pub fn charge_for(self, elapsed: TimeDelta) -> Self {
        self.accrue_hourly(elapsed).total()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Unrounded charge in cent-milliseconds per hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accrual(i128);

impl Accrual {
    /// Round half-up to whole cents.
    pub fn total(self) -> Money {
        let cents = (self.0 + MILLIS_PER_HOUR / 2) / MILLIS_PER_HOUR;
        Money(i64::try_from(cents).unwrap_or(i64::MAX))
    }
}

impl Add for Accrual {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Accrual {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
