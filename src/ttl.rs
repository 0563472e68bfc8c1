use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

use crate::error::Error;
use crate::error::Result;

/// Longest TTL accepted by either tier, about 1000 years. The local tier engine refuses anything longer.
pub const MAX_TTL_SECONDS: u64 = 1000 * 365 * 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtlUnit {
    #[default]
    Seconds,
    Minutes,
}

impl TtlUnit {
    #[inline]
    pub fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
        }
    }

    pub fn duration(self, amount: u64) -> Result<Duration> {
        amount
            .checked_mul(self.seconds())
            .filter(|secs| *secs <= MAX_TTL_SECONDS)
            .map(Duration::from_secs)
            .ok_or_else(|| Error::invalid_argument(format!("TTL of {amount} {self:?} is out of range")))
    }
}

/// Randomized TTL for remote tier writes.
///
/// Keys written at about the same moment must not expire at about the same moment, so every write gets a TTL drawn
/// uniformly from `[min, max)` units (or exactly `min` when the window is a single point).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlJitter {
    min:  u64,
    max:  u64,
    unit: TtlUnit,
}

impl TtlJitter {
    pub fn new(min: u64, max: u64, unit: TtlUnit) -> Result<Self> {
        if min == 0 || min > max {
            return Err(Error::invalid_argument(format!(
                "TTL window must satisfy 0 < min <= max, got [{min}, {max}]"
            )));
        }
        unit.duration(max)?;
        Ok(Self { min, max, unit })
    }

    #[inline]
    pub fn min(&self) -> Duration {
        self.scaled(self.min)
    }

    #[inline]
    pub fn max(&self) -> Duration {
        self.scaled(self.max)
    }

    #[inline]
    pub fn unit(&self) -> TtlUnit {
        self.unit
    }

    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::rng())
    }

    pub fn sample_with<R: Rng>(&self, rng: &mut R) -> Duration {
        let amount = if self.min == self.max {
            self.min
        }
        else {
            rng.random_range(self.min..self.max)
        };
        self.scaled(amount)
    }

    // Never overflows: `new` has checked the largest amount.
    #[inline]
    fn scaled(&self, amount: u64) -> Duration {
        Duration::from_secs(amount * self.unit.seconds())
    }
}
