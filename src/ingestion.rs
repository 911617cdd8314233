use crate::config::DashboardConfig;
use crate::normalize::{
    cell_text, is_formula_error, parse_currency, parse_percentage, resolve_column, RawRow,
};
use crate::quality::{apply_quality_filter, is_totals_id};
use crate::schema::{
    BankSummary, DataLoadResult, DataQualityFinding, FindingKind, HouseholdRecord, LoadStats,
    Severity,
};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Header spellings seen across report exports, in lookup priority order.
pub mod columns {
    pub const HOUSEHOLD_ID: &[&str] = &["Household ID"];
    pub const HOUSEHOLD_NAME: &[&str] = &["Household Name"];
    pub const OFFICER_CODE: &[&str] = &["Officer Code"];
    pub const OFFICER_NAME: &[&str] = &["Officer Name"];

    pub const RATIO_CURRENT: &[&str] = &["% of Deposits to Loans (Current)"];
    pub const RATIO_PRIOR: &[&str] = &["% of Deposits to Loans (Prior)"];
    pub const RATIO_YTD: &[&str] = &["% of Deposits to Loans (YTD)"];

    pub const CURRENT_BALANCE: &[&str] = &[
        "Current Month-end Deposit Balance",
        "Current Month-End Deposit Balance",
        "Current Monthend Deposit Balance",
    ];
    pub const PRIOR_BALANCE: &[&str] = &[
        "Prior Month-end Deposit Balance",
        "Prior Month-End Deposit Balance",
        "Prior Monthend Deposit Balance",
    ];
    pub const YEAR_END_BALANCE: &[&str] = &[
        "Prior Year-end Deposit Balance",
        "Prior Year-End Deposit Balance",
        "Prior Yearend Deposit Balance",
    ];

    pub const MOM_CHANGE: &[&str] = &["Deposit Balance Change Month-over-Month"];
    pub const YTD_CHANGE: &[&str] = &["Deposit Balance Change Year-to-date"];
}

/// Data rows start on spreadsheet row 2: row 1 is the header and rows are 1-based.
pub const SPREADSHEET_ROW_OFFSET: usize = 2;

pub fn spreadsheet_row_number(index: usize) -> usize {
    index + SPREADSHEET_ROW_OFFSET
}

/// A built record paired with the spreadsheet row it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRecord {
    pub row_number: usize,
    pub record: HouseholdRecord,
}

/// Runs the ingestion pipeline over raw sheet rows: bank summary capture,
/// per-row normalization and repair, then the quality filter.
pub fn load_household_data(rows: &[RawRow], config: &DashboardConfig) -> DataLoadResult {
    let bank_summary = match capture_bank_summary(rows) {
        Some(summary) => summary,
        None => {
            warn!("No totals row found; bank summary ratios are unavailable");
            BankSummary::default()
        }
    };

    let mut findings = Vec::new();
    let built: Vec<SourcedRecord> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| SourcedRecord {
            row_number: spreadsheet_row_number(index),
            record: build_record(
                spreadsheet_row_number(index),
                row,
                config.extreme_ratio_threshold,
                &mut findings,
            ),
        })
        .collect();

    let outcome = apply_quality_filter(built);
    findings.extend(outcome.findings);

    let stats = LoadStats {
        total_rows: rows.len(),
        valid_rows: outcome.kept.len(),
        filtered_rows: outcome.dropped,
    };

    info!(
        "Ingested {} rows: {} valid, {} filtered",
        stats.total_rows, stats.valid_rows, stats.filtered_rows
    );
    if log::log_enabled!(log::Level::Debug) {
        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for finding in &findings {
            *by_kind.entry(format!("{:?}", finding.kind)).or_default() += 1;
        }
        debug!("Data quality findings by kind: {:?}", by_kind);
    }

    DataLoadResult {
        households: outcome.kept.into_iter().map(|s| s.record).collect(),
        findings,
        bank_summary,
        stats,
    }
}

/// Reads the bank-wide ratios from the first totals row, if the sheet has one.
pub fn capture_bank_summary(rows: &[RawRow]) -> Option<BankSummary> {
    let totals = rows
        .iter()
        .find(|row| is_totals_id(&cell_text(resolve_column(row, columns::HOUSEHOLD_ID))))?;

    Some(BankSummary {
        deposit_to_loans_ratio_current: parse_percentage(resolve_column(
            totals,
            columns::RATIO_CURRENT,
        )),
        deposit_to_loans_ratio_prior_quarter: parse_percentage(resolve_column(
            totals,
            columns::RATIO_PRIOR,
        )),
        deposit_to_loans_ratio_yoy: parse_percentage(resolve_column(totals, columns::RATIO_YTD)),
    })
}

/// Officer name and code as they should be stored, plus whether they were swapped.
///
/// The source report sometimes transposes the two columns: a code containing
/// letters next to an all-digit name is taken to be swapped.
pub fn normalize_officer_fields(code: &str, name: &str) -> (String, String, bool) {
    let code_is_name = code.chars().any(|c| c.is_ascii_alphabetic());
    let name_is_code = !name.is_empty() && name.chars().all(|c| c.is_ascii_digit());

    if code_is_name && name_is_code {
        (name.to_string(), code.to_string(), true)
    } else {
        (code.to_string(), name.to_string(), false)
    }
}

/// Builds one household record from a raw row, appending any findings.
pub fn build_record(
    row_number: usize,
    row: &RawRow,
    extreme_ratio_threshold: f64,
    findings: &mut Vec<DataQualityFinding>,
) -> HouseholdRecord {
    let household_id = cell_text(resolve_column(row, columns::HOUSEHOLD_ID));
    let household_name = cell_text(resolve_column(row, columns::HOUSEHOLD_NAME));

    let finding = |kind, field: &str, raw_value: String, description: String, severity| {
        DataQualityFinding {
            row_number,
            household_id: household_id.clone(),
            household_name: household_name.clone(),
            kind,
            field: Some(field.to_string()),
            raw_value: Some(raw_value),
            description,
            severity,
        }
    };

    let raw_code = cell_text(resolve_column(row, columns::OFFICER_CODE));
    let raw_name = cell_text(resolve_column(row, columns::OFFICER_NAME));
    let (officer_code, officer_name, swapped) = normalize_officer_fields(&raw_code, &raw_name);
    if swapped {
        findings.push(finding(
            FindingKind::SwappedFields,
            "Officer Name/Code",
            format!("{} / {}", raw_name, raw_code),
            "Officer name and code were swapped - corrected automatically".to_string(),
            Severity::Info,
        ));
    }

    let raw_current = resolve_column(row, columns::RATIO_CURRENT);
    let raw_prior = resolve_column(row, columns::RATIO_PRIOR);
    let raw_ytd = resolve_column(row, columns::RATIO_YTD);

    for (field, raw) in [
        ("Current Ratio", raw_current),
        ("Prior Month Ratio", raw_prior),
        ("YTD Ratio", raw_ytd),
    ] {
        if let Some(serde_json::Value::String(text)) = raw {
            if is_formula_error(text) {
                findings.push(finding(
                    FindingKind::SpreadsheetError,
                    field,
                    text.clone(),
                    format!(
                        "Spreadsheet formula error ({}) in {} - treated as null",
                        text, field
                    ),
                    Severity::Warning,
                ));
            }
        }
    }

    let ratio_current = parse_percentage(raw_current);
    if let Some(ratio) = ratio_current.filter(|r| *r > extreme_ratio_threshold) {
        findings.push(finding(
            FindingKind::ExtremeRatio,
            "Current Ratio",
            format!("{:.0}%", ratio),
            format!("Extreme ratio value ({:.0}%) - may skew averages", ratio),
            Severity::Warning,
        ));
    }

    HouseholdRecord {
        officer_code,
        officer_name,
        deposit_to_loans_ratio_current: ratio_current,
        deposit_to_loans_ratio_prior: parse_percentage(raw_prior),
        deposit_to_loans_ratio_ytd: parse_percentage(raw_ytd),
        current_balance: parse_currency(resolve_column(row, columns::CURRENT_BALANCE)),
        prior_balance: parse_currency(resolve_column(row, columns::PRIOR_BALANCE)),
        ytd_balance: parse_currency(resolve_column(row, columns::YEAR_END_BALANCE)),
        mom_change: parse_currency(resolve_column(row, columns::MOM_CHANGE)),
        ytd_change: parse_currency(resolve_column(row, columns::YTD_CHANGE)),
        household_id,
        household_name,
    }
}
