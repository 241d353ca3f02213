//! Polling mode, alert phase, observed availability rows and recipient
//! address validation

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern")
});

/// Polling cadence policy
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Fixed short interval
    #[default]
    Fast,
    /// Randomised, slower interval
    Slow,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Fast => write!(f, "FAST"),
            Mode::Slow => write!(f, "SLOW"),
        }
    }
}

/// Alert-eligibility policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Phase {
    /// Phase 0: any slot qualifies
    AnySlot,
    /// Phase 1: only VAC locations qualify
    #[default]
    VacOnly,
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        match phase {
            Phase::AnySlot => 0,
            Phase::VacOnly => 1,
        }
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Phase::AnySlot),
            1 => Ok(Phase::VacOnly),
            other => Err(format!("invalid phase {}, expected 0 or 1", other)),
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid phase '{}', expected 0 or 1", s))?;
        Phase::try_from(value)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// One accepted row of the availability table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRow {
    pub location: String,
    pub earliest_date: String,
    pub total_dates: String,
    pub relative_time: String,
}

impl ObservedRow {
    pub fn new(
        location: impl Into<String>,
        earliest_date: impl Into<String>,
        total_dates: impl Into<String>,
        relative_time: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            earliest_date: earliest_date.into(),
            total_dates: total_dates.into(),
            relative_time: relative_time.into(),
        }
    }
}

/// Trim a recipient address. Blank input clears it; anything that does not
/// look like `local@domain.tld` is rejected.
pub fn normalize_email(email: Option<String>) -> crate::Result<Option<String>> {
    let Some(email) = email else {
        return Ok(None);
    };
    let email = email.trim();
    if email.is_empty() {
        return Ok(None);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(crate::SlotWatchError::InvalidEmail(email.to_string()));
    }
    Ok(Some(email.to_string()))
}
