use std::env;
use std::str::FromStr;

use chrono::FixedOffset;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors raised while validating the clinic calendar configuration.
/// All of these are fatal at setup: a grid that fails construction must
/// never reach a scheduling call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("interval_hour must be positive, got {interval}")]
    NonPositiveInterval { interval: Decimal },

    #[error("start_hour {start} must be earlier than end_hour {end}")]
    EmptyWindow { start: Decimal, end: Decimal },

    #[error("window [{start}, {end}) is not a whole multiple of interval_hour {interval}")]
    MisalignedGrid {
        start: Decimal,
        end: Decimal,
        interval: Decimal,
    },

    #[error("invalid UTC offset: {0}")]
    InvalidUtcOffset(String),
}

/// The discretized daily calendar: half-open segments of width
/// `interval_hour` covering `[start_hour, end_hour)`.
///
/// All three parameters are fractional hours held as fixed-point
/// decimals; dividing a duration by `interval_hour` is exact, which is
/// what keeps duration-to-segment-count conversion free of the
/// off-by-one drift binary floats introduce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    start_hour: Decimal,
    end_hour: Decimal,
    interval_hour: Decimal,
}

impl TimeGrid {
    pub fn new(
        start_hour: Decimal,
        end_hour: Decimal,
        interval_hour: Decimal,
    ) -> Result<Self, ConfigError> {
        if interval_hour <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveInterval {
                interval: interval_hour,
            });
        }
        if start_hour >= end_hour {
            return Err(ConfigError::EmptyWindow {
                start: start_hour,
                end: end_hour,
            });
        }
        let span = end_hour - start_hour;
        if !(span / interval_hour).fract().is_zero() {
            return Err(ConfigError::MisalignedGrid {
                start: start_hour,
                end: end_hour,
                interval: interval_hour,
            });
        }

        Ok(Self {
            start_hour,
            end_hour,
            interval_hour,
        })
    }

    pub fn start_hour(&self) -> Decimal {
        self.start_hour
    }

    pub fn end_hour(&self) -> Decimal {
        self.end_hour
    }

    pub fn interval_hour(&self) -> Decimal {
        self.interval_hour
    }

    /// Number of segments in one day. Exact by construction.
    pub fn segment_count(&self) -> usize {
        ((self.end_hour - self.start_hour) / self.interval_hour)
            .to_usize()
            .expect("validated grid always has an integral segment count")
    }

    /// Lower bound of segment `index` in fractional hours.
    pub fn segment_start(&self, index: usize) -> Decimal {
        self.start_hour + Decimal::from(index as u64) * self.interval_hour
    }

    /// Upper bound of segment `index` in fractional hours.
    pub fn segment_end(&self, index: usize) -> Decimal {
        self.segment_start(index) + self.interval_hour
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset string into a `FixedOffset`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidUtcOffset(raw.to_string());

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1i32, &raw[1..]),
        Some(b'-') => (-1i32, &raw[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Render a `FixedOffset` back into the `+HH:MM` form used by the
/// simulation's ISO timestamps.
pub fn format_utc_offset(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub start_hour: Decimal,
    pub end_hour: Decimal,
    pub interval_hour: Decimal,
    pub utc_offset: FixedOffset,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            start_hour: env_decimal("CLINIC_START_HOUR", Decimal::from(9)),
            end_hour: env_decimal("CLINIC_END_HOUR", Decimal::from(17)),
            interval_hour: env_decimal("CLINIC_INTERVAL_HOUR", Decimal::new(5, 1)),
            utc_offset: env::var("CLINIC_UTC_OFFSET")
                .ok()
                .and_then(|raw| parse_utc_offset(&raw).ok())
                .unwrap_or_else(|| {
                    warn!("CLINIC_UTC_OFFSET not set or invalid, using +09:00");
                    FixedOffset::east_opt(9 * 3600).unwrap()
                }),
        }
    }

    /// Build the validated grid; configuration errors surface here,
    /// before any scheduling call is made.
    pub fn time_grid(&self) -> Result<TimeGrid, ConfigError> {
        TimeGrid::new(self.start_hour, self.end_hour, self.interval_hour)
    }
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    match env::var(key) {
        Ok(raw) => Decimal::from_str(&raw).unwrap_or_else(|_| {
            warn!("{} is not a decimal number, using default {}", key, default);
            default
        }),
        Err(_) => default,
    }
}
