//! Row acceptance rules: location whitelist and recency phrases

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::model::{Mode, ObservedRow};

/// Locations the monitor reports on, already upper-cased
pub const VALID_LOCATIONS: [&str; 12] = [
    "CHENNAI",
    "CHENNAI VAC",
    "HYDERABAD",
    "HYDERABAD VAC",
    "KOLKATA",
    "KOLKATA VAC",
    "MUMBAI",
    "MUMBAI VAC",
    "NEW DELHI",
    "NEW DELHI VAC",
    "DELHI",
    "DELHI VAC",
];

/// Substring identifying a visa application center location
pub const VAC_MARKER: &str = "VAC";

static FAST_PHRASES: LazyLock<HashSet<String>> = LazyLock::new(|| seconds_phrases().collect());

static SLOW_PHRASES: LazyLock<HashSet<String>> = LazyLock::new(|| {
    seconds_phrases()
        .chain(std::iter::once("1 minute ago".to_string()))
        .collect()
});

fn seconds_phrases() -> impl Iterator<Item = String> {
    (1..=59).map(|i| {
        if i == 1 {
            "1 second ago".to_string()
        } else {
            format!("{} seconds ago", i)
        }
    })
}

/// Whether `location` (already upper-cased) is one of the watched locations
pub fn is_known_location(location: &str) -> bool {
    VALID_LOCATIONS.contains(&location)
}

/// Whether `relative_time` is recent enough for the given mode
pub fn is_recent(relative_time: &str, mode: Mode) -> bool {
    match mode {
        Mode::Fast => FAST_PHRASES.contains(relative_time),
        Mode::Slow => SLOW_PHRASES.contains(relative_time),
    }
}

/// Build an [`ObservedRow`] from raw cell text, or `None` if the row is filtered out
pub fn accept_row(
    location: &str,
    earliest_date: &str,
    total_dates: &str,
    relative_time: &str,
    mode: Mode,
) -> Option<ObservedRow> {
    let location = location.trim().to_uppercase();
    let relative_time = relative_time.trim();

    if !is_known_location(&location) || !is_recent(relative_time, mode) {
        return None;
    }

    Some(ObservedRow::new(
        location,
        earliest_date.trim(),
        total_dates.trim(),
        relative_time,
    ))
}
