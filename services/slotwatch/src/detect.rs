//! Change detection between consecutive check cycles

use crate::model::ObservedRow;

/// Result of comparing a cycle's rows with the last non-empty snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The cycle matched no rows; the snapshot is left alone
    NoSlots,
    /// Same locations in the same order as the snapshot
    Unchanged,
    /// The location sequence differs; carries the new snapshot
    NewTrigger(Vec<String>),
}

/// Distinct locations across `rows`, in extraction order
pub fn current_locations(rows: &[ObservedRow]) -> Vec<String> {
    let mut locations: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        if !locations.iter().any(|l| l == &row.location) {
            locations.push(row.location.clone());
        }
    }
    locations
}

/// Compare the rows of this cycle with `previous`
pub fn detect_change(previous: &[String], rows: &[ObservedRow]) -> ChangeOutcome {
    if rows.is_empty() {
        return ChangeOutcome::NoSlots;
    }

    let current = current_locations(rows);
    if current.as_slice() == previous {
        ChangeOutcome::Unchanged
    } else {
        ChangeOutcome::NewTrigger(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(location: &str) -> ObservedRow {
        ObservedRow::new(location, "Jan 20, 2026", "4", "3 seconds ago")
    }

    #[test]
    fn empty_rows_are_no_slots_even_with_empty_snapshot() {
        assert_eq!(detect_change(&[], &[]), ChangeOutcome::NoSlots);
        assert_eq!(
            detect_change(&["CHENNAI".to_string()], &[]),
            ChangeOutcome::NoSlots
        );
    }

    #[test]
    fn first_non_empty_result_is_a_trigger() {
        assert_eq!(
            detect_change(&[], &[row("CHENNAI")]),
            ChangeOutcome::NewTrigger(vec!["CHENNAI".to_string()])
        );
    }

    #[test]
    fn same_sequence_is_unchanged() {
        let previous = vec!["CHENNAI".to_string()];
        assert_eq!(
            detect_change(&previous, &[row("CHENNAI")]),
            ChangeOutcome::Unchanged
        );
    }

    #[test]
    fn added_location_is_a_trigger() {
        let previous = vec!["CHENNAI".to_string()];
        assert_eq!(
            detect_change(&previous, &[row("CHENNAI"), row("MUMBAI VAC")]),
            ChangeOutcome::NewTrigger(vec!["CHENNAI".to_string(), "MUMBAI VAC".to_string()])
        );
    }

    #[test]
    fn reordering_is_a_trigger() {
        let previous = vec!["CHENNAI".to_string(), "MUMBAI".to_string()];
        assert!(matches!(
            detect_change(&previous, &[row("MUMBAI"), row("CHENNAI")]),
            ChangeOutcome::NewTrigger(_)
        ));
    }

    #[test]
    fn date_details_are_ignored() {
        let previous = vec!["DELHI".to_string()];
        let changed_dates = ObservedRow::new("DELHI", "Feb 9, 2026", "12", "1 second ago");
        assert_eq!(
            detect_change(&previous, &[changed_dates]),
            ChangeOutcome::Unchanged
        );
    }

    #[test]
    fn duplicate_locations_collapse() {
        assert_eq!(
            current_locations(&[row("KOLKATA"), row("KOLKATA"), row("DELHI")]),
            vec!["KOLKATA".to_string(), "DELHI".to_string()]
        );
    }
}
