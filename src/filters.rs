use crate::schema::{FilterState, OfficerMetrics, Scope, TopN};
use crate::teams::TeamDirectory;
use serde::{Deserialize, Serialize};

/// IQR multiplier used by the dashboard's outlier toggle.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub min: f64,
    pub max: f64,
}

impl OutlierBounds {
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Inclusion window `[Q1 - k*IQR, Q3 + k*IQR]`.
///
/// Quartiles are read at `floor(n * 0.25)` and `floor(n * 0.75)` of the sorted
/// values without interpolation. An empty input is unbounded.
pub fn outlier_threshold(values: &[f64], multiplier: f64) -> OutlierBounds {
    if values.is_empty() {
        return OutlierBounds::unbounded();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let q1 = sorted[(n * 0.25).floor() as usize];
    let q3 = sorted[(n * 0.75).floor() as usize];
    let iqr = q3 - q1;

    OutlierBounds {
        min: q1 - multiplier * iqr,
        max: q3 + multiplier * iqr,
    }
}

/// Produces the officer view for the charts. Steps run in a fixed order:
/// team scope, officer scope, minimum balance, YTD outlier exclusion over what
/// is left, balance-descending sort, then top-N.
///
/// `filters.balance_tier` is not applied here.
pub fn apply_officer_filters(
    officers: &[OfficerMetrics],
    filters: &FilterState,
    directory: &TeamDirectory,
) -> Vec<OfficerMetrics> {
    apply_officer_filters_with(officers, filters, directory, DEFAULT_IQR_MULTIPLIER)
}

pub fn apply_officer_filters_with(
    officers: &[OfficerMetrics],
    filters: &FilterState,
    directory: &TeamDirectory,
    iqr_multiplier: f64,
) -> Vec<OfficerMetrics> {
    let mut filtered: Vec<&OfficerMetrics> = officers.iter().collect();

    if let Scope::Only(team) = &filters.team {
        filtered.retain(|o| directory.resolve_team(&o.officer_name) == team);
    }

    if let Scope::Only(officer) = &filters.officer {
        filtered.retain(|o| &o.officer_name == officer);
    }

    if filters.min_balance > 0.0 {
        filtered.retain(|o| o.total_balance >= filters.min_balance);
    }

    if filters.exclude_outliers {
        let ytd: Vec<f64> = filtered.iter().map(|o| o.ytd_change).collect();
        let bounds = outlier_threshold(&ytd, iqr_multiplier);
        filtered.retain(|o| bounds.contains(o.ytd_change));
    }

    filtered.sort_by(|a, b| b.total_balance.total_cmp(&a.total_balance));

    if let TopN::Count(n) = filters.top_n {
        filtered.truncate(n);
    }

    filtered.into_iter().cloned().collect()
}
