//! # Deposit Dynamics
//!
//! Turns a household deposit/loan balance report (one spreadsheet export) into
//! the read models behind a portfolio dashboard: cleaned household records,
//! data-quality findings, officer and team rollups and filtered officer views.
//!
//! ## Pipeline
//!
//! - **Normalization**: currency and percentage cells are parsed by total
//!   functions; header spellings are resolved through a fallback chain
//! - **Repair**: transposed officer name/code columns are swapped back
//! - **Quality filter**: totals, unnamed and fully dormant rows are dropped,
//!   each with a finding kept for audit
//! - **Aggregation**: households fold into officers, officers into teams
//! - **Filtering**: team/officer scope, minimum balance, IQR outlier exclusion
//!   and top-N over the officer metrics
//!
//! ## Example
//!
//! ```rust,ignore
//! use deposit_dynamics::*;
//!
//! let mut cache = DashboardCache::with_default_config(
//!     SpreadsheetSource::file("data/household-balance-report.xlsx"),
//! );
//! let snapshot = cache.load()?;
//!
//! let view = snapshot.filtered_officers(&FilterState::default())?;
//! for officer in &view {
//!     println!("{}: {}", officer.officer_name, format_currency(officer.total_balance));
//! }
//! ```

pub mod aggregate;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod filters;
pub mod ingestion;
pub mod narrative;
pub mod normalize;
pub mod quality;
pub mod schema;
pub mod source;
pub mod teams;
pub mod utils;

pub use aggregate::{calculate_officer_metrics, calculate_team_metrics};
pub use analytics::*;
pub use cache::DashboardCache;
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use filters::{apply_officer_filters, outlier_threshold, OutlierBounds};
pub use ingestion::{load_household_data, SourcedRecord};
pub use narrative::{executive_summary, ExecutiveSummary};
pub use normalize::{parse_currency, parse_percentage, resolve_column, RawRow};
pub use quality::{apply_quality_filter, QualityOutcome};
pub use schema::*;
pub use source::{SheetFormat, SpreadsheetSource};
pub use teams::{TeamDirectory, TeamRoster};
pub use utils::*;

use chrono::{DateTime, Utc};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything derived from one load of the balance report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub households: Vec<HouseholdRecord>,
    pub officers: Vec<OfficerMetrics>,
    pub teams: Vec<TeamMetrics>,
    pub findings: Vec<DataQualityFinding>,
    pub stats: LoadStats,
    pub bank_summary: BankSummary,
    /// Team rosters and thresholds the snapshot was derived with.
    pub config: DashboardConfig,
    pub loaded_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn team_of(&self, officer_name: &str) -> &str {
        self.config.teams.resolve_team(officer_name)
    }

    /// The officer chart view. Rejects a negative minimum balance or a top-N of zero.
    pub fn filtered_officers(&self, filters: &FilterState) -> Result<Vec<OfficerMetrics>> {
        filters.validate()?;
        Ok(crate::filters::apply_officer_filters_with(
            &self.officers,
            filters,
            &self.config.teams,
            self.config.outlier_iqr_multiplier,
        ))
    }

    pub fn kpis(&self) -> KpiSummary {
        kpi_summary(&self.households, self.config.ratio_cap)
    }

    pub fn waterfall(&self) -> WaterfallSummary {
        waterfall(&self.households)
    }

    pub fn balance_tiers(&self) -> Vec<TierSlice> {
        balance_tier_breakdown(&self.households)
    }

    pub fn liquidity_distribution(&self) -> Vec<LiquiditySlice> {
        liquidity_distribution(&self.households)
    }

    pub fn top_households(&self) -> Vec<&HouseholdRecord> {
        top_households(&self.households, self.config.leaderboard_size)
    }

    pub fn attrition_watchlist(&self) -> Vec<&HouseholdRecord> {
        attrition_watchlist(&self.households, self.config.leaderboard_size)
    }

    pub fn top_gainers(&self) -> Vec<&HouseholdRecord> {
        top_gainers(&self.households, self.config.leaderboard_size)
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        officer_leaderboard(&self.officers, &self.config.teams)
    }

    pub fn filter_metadata(&self) -> FilterMetadata {
        filter_metadata(&self.officers, &self.config.teams)
    }

    pub fn narrative(&self) -> Option<ExecutiveSummary> {
        executive_summary(&self.households, &self.officers)
    }
}

pub struct DashboardProcessor;

impl DashboardProcessor {
    pub fn process(rows: &[RawRow], config: &DashboardConfig) -> Result<DashboardSnapshot> {
        config.validate()?;

        info!("Processing balance report with {} rows", rows.len());

        let loaded = load_household_data(rows, config);
        let officers = calculate_officer_metrics(&loaded.households);
        let teams = calculate_team_metrics(&officers, &config.teams);

        debug!(
            "Derived {} officer rollups across {} teams",
            officers.len(),
            teams.len()
        );

        Ok(DashboardSnapshot {
            households: loaded.households,
            officers,
            teams,
            findings: loaded.findings,
            stats: loaded.stats,
            bank_summary: loaded.bank_summary,
            config: config.clone(),
            loaded_at: Utc::now(),
        })
    }

    pub fn process_source(
        source: &SpreadsheetSource,
        config: &DashboardConfig,
    ) -> Result<DashboardSnapshot> {
        let rows = source.read_rows()?;
        Self::process(&rows, config)
    }
}

pub fn process_household_report(
    rows: &[RawRow],
    config: &DashboardConfig,
) -> Result<DashboardSnapshot> {
    DashboardProcessor::process(rows, config)
}
