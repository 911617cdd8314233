use crate::ingestion::SourcedRecord;
use crate::schema::{DataQualityFinding, FindingKind, HouseholdRecord, Severity};
use log::debug;

const EMPTY_NAME_PLACEHOLDER: &str = "(empty)";

/// Survivors and drop findings of one quality-filter pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityOutcome {
    pub kept: Vec<SourcedRecord>,
    pub findings: Vec<DataQualityFinding>,
    pub dropped: usize,
}

/// True for the bank-wide summary row (`"Totals"`, `"total"`, ...).
pub fn is_totals_id(household_id: &str) -> bool {
    let id = household_id.trim().to_lowercase();
    id == "totals" || id == "total"
}

/// The first drop rule a record trips, checked in order: totals row, empty
/// household name, all three balances zero.
pub fn drop_reason(record: &HouseholdRecord) -> Option<FindingKind> {
    if is_totals_id(&record.household_id) {
        Some(FindingKind::TotalsRow)
    } else if record.household_name.trim().is_empty() {
        Some(FindingKind::EmptyName)
    } else if record.current_balance == 0.0
        && record.prior_balance == 0.0
        && record.ytd_balance == 0.0
    {
        Some(FindingKind::ZeroBalance)
    } else {
        None
    }
}

/// Removes summary, unnamed and dormant rows, logging one finding per drop.
///
/// Survivors pass through untouched, so a second pass over `kept` drops nothing.
pub fn apply_quality_filter(records: Vec<SourcedRecord>) -> QualityOutcome {
    let mut outcome = QualityOutcome::default();

    for sourced in records {
        match drop_reason(&sourced.record) {
            None => outcome.kept.push(sourced),
            Some(kind) => {
                outcome.dropped += 1;
                outcome.findings.push(drop_finding(&sourced, kind));
            }
        }
    }

    debug!(
        "Quality filter kept {} records and dropped {}",
        outcome.kept.len(),
        outcome.dropped
    );

    outcome
}

fn drop_finding(sourced: &SourcedRecord, kind: FindingKind) -> DataQualityFinding {
    let record = &sourced.record;
    let display_name = if record.household_name.trim().is_empty() {
        EMPTY_NAME_PLACEHOLDER.to_string()
    } else {
        record.household_name.clone()
    };

    let (description, severity) = match kind {
        FindingKind::TotalsRow => (
            "Summary/totals row - filtered from analysis",
            Severity::Error,
        ),
        FindingKind::EmptyName => (
            "Empty household name - filtered from analysis",
            Severity::Error,
        ),
        _ => (
            "Inactive account with zero balance across all periods - filtered from analysis",
            Severity::Warning,
        ),
    };

    DataQualityFinding {
        row_number: sourced.row_number,
        household_id: record.household_id.clone(),
        household_name: display_name,
        kind,
        field: None,
        raw_value: None,
        description: description.to_string(),
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn household(id: &str, name: &str, balances: (f64, f64, f64)) -> SourcedRecord {
        SourcedRecord {
            row_number: 2,
            record: HouseholdRecord {
                household_id: id.to_string(),
                household_name: name.to_string(),
                officer_code: "100".to_string(),
                officer_name: "Jane Doe".to_string(),
                deposit_to_loans_ratio_current: None,
                deposit_to_loans_ratio_prior: None,
                deposit_to_loans_ratio_ytd: None,
                current_balance: balances.0,
                prior_balance: balances.1,
                ytd_balance: balances.2,
                mom_change: 0.0,
                ytd_change: 0.0,
            },
        }
    }

    #[test]
    fn test_totals_detection_is_case_insensitive() {
        assert!(is_totals_id("Totals"));
        assert!(is_totals_id("TOTAL"));
        assert!(is_totals_id(" totals "));
        assert!(!is_totals_id("Total Wealth LLC"));
        assert!(!is_totals_id(""));
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // a totals row with an empty name and zero balances is still a totals row
        let totals = household("TOTALS", "", (0.0, 0.0, 0.0));
        assert_eq!(drop_reason(&totals.record), Some(FindingKind::TotalsRow));

        let unnamed = household("H1", "   ", (0.0, 0.0, 0.0));
        assert_eq!(drop_reason(&unnamed.record), Some(FindingKind::EmptyName));

        let dormant = household("H2", "Dormant", (0.0, 0.0, 0.0));
        assert_eq!(drop_reason(&dormant.record), Some(FindingKind::ZeroBalance));

        let partly = household("H3", "Active", (0.0, 0.0, 5.0));
        assert_eq!(drop_reason(&partly.record), None);
    }

    #[test]
    fn test_filter_emits_one_finding_per_drop() {
        let outcome = apply_quality_filter(vec![
            household("Totals", "", (1.0, 1.0, 1.0)),
            household("H1", "", (1.0, 1.0, 1.0)),
            household("H2", "Dormant", (0.0, 0.0, 0.0)),
            household("H3", "Smith Family", (10.0, 0.0, 0.0)),
        ]);

        assert_eq!(outcome.dropped, 3);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].record.household_id, "H3");

        let kinds: Vec<(FindingKind, Severity)> = outcome
            .findings
            .iter()
            .map(|f| (f.kind, f.severity))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (FindingKind::TotalsRow, Severity::Error),
                (FindingKind::EmptyName, Severity::Error),
                (FindingKind::ZeroBalance, Severity::Warning),
            ]
        );
        assert_eq!(outcome.findings[1].household_name, "(empty)");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let first = apply_quality_filter(vec![
            household("Total", "Bank", (1.0, 1.0, 1.0)),
            household("H1", "Keep Me", (0.0, 3.0, 0.0)),
            household("H2", "Dormant", (0.0, 0.0, 0.0)),
        ]);
        let kept = first.kept.clone();
        let second = apply_quality_filter(first.kept);

        assert_eq!(second.dropped, 0);
        assert!(second.findings.is_empty());
        assert_eq!(second.kept, kept);
    }
}
