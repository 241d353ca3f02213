//! Phase-gated alert policy

use crate::filter::VAC_MARKER;
use crate::model::{ObservedRow, Phase};

/// Whether a new trigger should raise an alert, and why
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDecision {
    pub should_alert: bool,
    pub reason: &'static str,
}

/// Evaluate the alert policy for `phase` against a new trigger's rows
pub fn evaluate(phase: Phase, rows: &[ObservedRow]) -> PhaseDecision {
    match phase {
        Phase::AnySlot => PhaseDecision {
            should_alert: !rows.is_empty(),
            reason: if rows.is_empty() {
                "no slots"
            } else {
                "any slot qualifies"
            },
        },
        Phase::VacOnly => {
            if has_vac(rows) {
                PhaseDecision {
                    should_alert: true,
                    reason: "VAC location found",
                }
            } else {
                PhaseDecision {
                    should_alert: false,
                    reason: "no VAC location",
                }
            }
        }
    }
}

/// Whether any row is a VAC location
pub fn has_vac(rows: &[ObservedRow]) -> bool {
    rows.iter().any(|r| r.location.contains(VAC_MARKER))
}
