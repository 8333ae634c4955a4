use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr, time::Duration};

/// A duration in Go's `time.ParseDuration` format (e.g. `30s`, `1m30s`, `500ms`), as used by
/// `metav1.Duration` fields.
///
/// Go durations are signed; the sign is tracked separately so that negative values can be
/// rejected by validation rather than by deserialization.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct K8sDuration {
    duration: Duration,
    is_negative: bool,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("invalid duration unit {0:?}: {EXPECTED_UNITS}")]
    InvalidUnit(String),

    #[error("missing a unit: {EXPECTED_UNITS}")]
    NoUnit,

    #[error("invalid number: {0}")]
    NotANumber(#[from] std::num::ParseFloatError),

    #[error("empty duration")]
    Empty,
}

const EXPECTED_UNITS: &str = "expected one of 'ns', 'us', '\u{00b5}s', 'ms', 's', 'm', or 'h'";

// === impl K8sDuration ===

impl K8sDuration {
    #[inline]
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.is_negative
    }

    /// The magnitude of the duration, ignoring its sign.
    #[inline]
    pub fn as_duration(&self) -> Duration {
        self.duration
    }

    /// Whole seconds, truncating any fractional part.
    #[inline]
    pub fn as_secs(&self) -> u64 {
        self.duration.as_secs()
    }

    fn unit_nanos(unit: &str) -> Result<f64, ParseError> {
        const SEC: f64 = 1_000_000_000.0;
        Ok(match unit {
            "ns" => 1.0,
            // Both the micro sign (U+00B5) and the Greek mu (U+03BC) are accepted.
            "us" | "\u{00b5}s" | "\u{03bc}s" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => SEC,
            "m" => 60.0 * SEC,
            "h" => 60.0 * 60.0 * SEC,
            unit => return Err(ParseError::InvalidUnit(unit.to_string())),
        })
    }
}

impl From<Duration> for K8sDuration {
    fn from(duration: Duration) -> Self {
        Self {
            duration,
            is_negative: false,
        }
    }
}

impl From<K8sDuration> for Duration {
    fn from(K8sDuration { duration, .. }: K8sDuration) -> Self {
        duration
    }
}

impl FromStr for K8sDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (is_negative, mut rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(ParseError::Empty),
        };

        // A bare zero is the only value allowed without a unit.
        if rest == "0" {
            return Ok(Self {
                duration: Duration::ZERO,
                is_negative,
            });
        }
        if rest.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut duration = Duration::ZERO;
        while !rest.is_empty() {
            let num_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or(ParseError::NoUnit)?;
            let (num, tail) = rest.split_at(num_len);
            let unit_len = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_len);

            let value = num.parse::<f64>()?;
            let nanos = (value * Self::unit_nanos(unit)?).round();
            duration += Duration::from_nanos(nanos as u64);
            rest = tail;
        }

        Ok(Self {
            duration,
            is_negative,
        })
    }
}

impl fmt::Debug for K8sDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative {
            f.write_str("-")?;
        }
        fmt::Debug::fmt(&self.duration, f)
    }
}

impl fmt::Display for K8sDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serialize for K8sDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for K8sDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
