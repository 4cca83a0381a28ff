use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Normalized retry budget: always at least 1.
///
/// Any value that is not a positive integer (zero, negative, fractional,
/// a string in the config file) collapses to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBudget", into = "u32")]
pub struct RetryBudget(u32);

impl RetryBudget {
    /// Normalize an integer budget.
    pub fn new(raw: i64) -> Self {
        if raw > 0 {
            Self(u32::try_from(raw).unwrap_or(u32::MAX))
        } else {
            Self(1)
        }
    }

    /// Normalize a possibly fractional budget.
    pub fn from_f64(raw: f64) -> Self {
        if raw.is_finite() && raw.fract() == 0.0 && raw > 0.0 {
            Self(raw.min(u32::MAX as f64) as u32)
        } else {
            Self(1)
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self(1)
    }
}

impl From<RetryBudget> for u32 {
    fn from(b: RetryBudget) -> u32 {
        b.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBudget {
    Int(i64),
    Float(f64),
    Other(serde::de::IgnoredAny),
}

impl From<RawBudget> for RetryBudget {
    fn from(raw: RawBudget) -> Self {
        match raw {
            RawBudget::Int(n) => RetryBudget::new(n),
            RawBudget::Float(f) => RetryBudget::from_f64(f),
            RawBudget::Other(_) => RetryBudget::default(),
        }
    }
}

/// Delay as written in `config.toml`: a number of milliseconds or a formula table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DelaySetting {
    /// Fixed delay in milliseconds.
    Fixed(u64),
    /// Delay computed from the attempt ordinal.
    Formula(DelayFormula),
}

impl Default for DelaySetting {
    fn default() -> Self {
        DelaySetting::Fixed(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DelayFormula {
    /// `ordinal * step_ms`.
    Linear { step_ms: u64 },
    /// `base_ms * 2^(ordinal - 1)`, optionally capped at `max_ms`.
    Exponential {
        base_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_ms: Option<u64>,
    },
}

type DelayFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Computes the wait before a retry attempt.
///
/// `ordinal` is 1-based: the retry about to be issued. A formula's result
/// is used as returned.
#[derive(Clone)]
pub enum DelayPolicy {
    Fixed(Duration),
    Formula(DelayFn),
}

impl DelayPolicy {
    pub fn fixed(delay: Duration) -> Self {
        DelayPolicy::Fixed(delay)
    }

    pub fn formula<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        DelayPolicy::Formula(Arc::new(f))
    }

    pub fn delay_for(&self, ordinal: u32) -> Duration {
        match self {
            DelayPolicy::Fixed(d) => *d,
            DelayPolicy::Formula(f) => f(ordinal),
        }
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        DelayPolicy::Fixed(Duration::ZERO)
    }
}

impl fmt::Debug for DelayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayPolicy::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            DelayPolicy::Formula(_) => f.write_str("Formula(<fn>)"),
        }
    }
}

impl From<DelaySetting> for DelayPolicy {
    fn from(setting: DelaySetting) -> Self {
        match setting {
            DelaySetting::Fixed(ms) => DelayPolicy::Fixed(Duration::from_millis(ms)),
            DelaySetting::Formula(DelayFormula::Linear { step_ms }) => {
                DelayPolicy::formula(move |n| Duration::from_millis(step_ms.saturating_mul(n as u64)))
            }
            DelaySetting::Formula(DelayFormula::Exponential { base_ms, max_ms }) => {
                DelayPolicy::formula(move |n| {
                    let factor = 1u64 << n.saturating_sub(1).min(32);
                    let raw = base_ms.saturating_mul(factor);
                    Duration::from_millis(max_ms.map_or(raw, |cap| raw.min(cap)))
                })
            }
        }
    }
}
