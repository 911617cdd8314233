//! Portfolio read models behind the dashboard cards: KPI tiles, the MoM
//! waterfall, balance-tier and liquidity breakdowns, household movers and the
//! officer leaderboard.

use crate::schema::{BalanceTier, HouseholdRecord, OfficerMetrics};
use crate::teams::TeamDirectory;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_deposits: f64,
    pub prior_deposits: f64,
    pub net_flow_mom: f64,
    pub net_flow_ytd: f64,
    /// MoM flow as a percentage of prior month-end deposits.
    pub mom_change_pct: f64,
    /// YTD flow as a percentage of prior year-end deposits.
    pub ytd_change_pct: f64,
    /// Mean current deposit-to-loan ratio with each household capped.
    pub liquidity_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallSummary {
    pub start_balance: f64,
    pub increases: f64,
    pub decreases: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierSlice {
    pub tier: BalanceTier,
    pub label: String,
    pub total_balance: f64,
    pub household_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityBand {
    OverTen,
    FiveToNine,
    UnderFive,
    NoLoanData,
}

impl LiquidityBand {
    pub const BANDS: [LiquidityBand; 4] = [
        LiquidityBand::OverTen,
        LiquidityBand::FiveToNine,
        LiquidityBand::UnderFive,
        LiquidityBand::NoLoanData,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LiquidityBand::OverTen => "Over 10%",
            LiquidityBand::FiveToNine => "5% to 9%",
            LiquidityBand::UnderFive => "Under 5%",
            LiquidityBand::NoLoanData => "No Loan Data",
        }
    }

    /// Negative ratios belong to no band.
    pub fn contains(&self, ratio: Option<f64>) -> bool {
        match (self, ratio) {
            (LiquidityBand::NoLoanData, r) => r.is_none(),
            (_, None) => false,
            (LiquidityBand::OverTen, Some(r)) => r >= 10.0,
            (LiquidityBand::FiveToNine, Some(r)) => (5.0..10.0).contains(&r),
            (LiquidityBand::UnderFive, Some(r)) => (0.0..5.0).contains(&r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiquiditySlice {
    pub band: LiquidityBand,
    pub label: String,
    pub total_balance: f64,
    pub household_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub officer_code: String,
    pub officer_name: String,
    pub team: String,
    pub balance: f64,
    pub growth_ytd: f64,
    pub liquidity_avg: f64,
    pub household_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficerOption {
    pub code: String,
    pub name: String,
    pub team: String,
}

/// Choices offered by the filter bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterMetadata {
    pub teams: Vec<String>,
    pub officers: Vec<OfficerOption>,
    pub balance_tiers: Vec<BalanceTier>,
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole != 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

pub fn kpi_summary(households: &[HouseholdRecord], ratio_cap: f64) -> KpiSummary {
    let total_deposits: f64 = households.iter().map(|h| h.current_balance).sum();
    let prior_deposits: f64 = households.iter().map(|h| h.prior_balance).sum();
    let year_end_deposits: f64 = households.iter().map(|h| h.ytd_balance).sum();
    let net_flow_mom: f64 = households.iter().map(|h| h.mom_change).sum();
    let net_flow_ytd: f64 = households.iter().map(|h| h.ytd_change).sum();

    let capped: Vec<f64> = households
        .iter()
        .filter_map(|h| h.deposit_to_loans_ratio_current)
        .map(|r| r.min(ratio_cap))
        .collect();
    let liquidity_ratio = if capped.is_empty() {
        0.0
    } else {
        capped.iter().sum::<f64>() / capped.len() as f64
    };

    KpiSummary {
        total_deposits,
        prior_deposits,
        net_flow_mom,
        net_flow_ytd,
        mom_change_pct: percent_of(net_flow_mom, prior_deposits),
        ytd_change_pct: percent_of(net_flow_ytd, year_end_deposits),
        liquidity_ratio,
    }
}

pub fn waterfall(households: &[HouseholdRecord]) -> WaterfallSummary {
    WaterfallSummary {
        start_balance: households.iter().map(|h| h.prior_balance).sum(),
        increases: households
            .iter()
            .map(|h| h.mom_change)
            .filter(|c| *c > 0.0)
            .sum(),
        decreases: households
            .iter()
            .map(|h| h.mom_change)
            .filter(|c| *c < 0.0)
            .sum(),
        end_balance: households.iter().map(|h| h.current_balance).sum(),
    }
}

pub fn balance_tier_breakdown(households: &[HouseholdRecord]) -> Vec<TierSlice> {
    BalanceTier::TIERS
        .iter()
        .map(|tier| {
            let members: Vec<&HouseholdRecord> = households
                .iter()
                .filter(|h| tier.contains(h.current_balance))
                .collect();
            TierSlice {
                tier: *tier,
                label: tier.label().to_string(),
                total_balance: members.iter().map(|h| h.current_balance).sum(),
                household_count: members.len(),
            }
        })
        .collect()
}

pub fn liquidity_distribution(households: &[HouseholdRecord]) -> Vec<LiquiditySlice> {
    LiquidityBand::BANDS
        .iter()
        .map(|band| {
            let members: Vec<&HouseholdRecord> = households
                .iter()
                .filter(|h| band.contains(h.deposit_to_loans_ratio_current))
                .collect();
            LiquiditySlice {
                band: *band,
                label: band.label().to_string(),
                total_balance: members.iter().map(|h| h.current_balance).sum(),
                household_count: members.len(),
            }
        })
        .collect()
}

/// Largest households by current balance, skipping unnamed ones.
pub fn top_households(households: &[HouseholdRecord], n: usize) -> Vec<&HouseholdRecord> {
    let mut ranked: Vec<&HouseholdRecord> = households
        .iter()
        .filter(|h| !h.household_name.trim().is_empty())
        .collect();
    ranked.sort_by(|a, b| b.current_balance.total_cmp(&a.current_balance));
    ranked.truncate(n);
    ranked
}

/// Households with the largest month-over-month outflows, worst first.
pub fn attrition_watchlist(households: &[HouseholdRecord], n: usize) -> Vec<&HouseholdRecord> {
    let mut ranked: Vec<&HouseholdRecord> =
        households.iter().filter(|h| h.mom_change < 0.0).collect();
    ranked.sort_by(|a, b| a.mom_change.total_cmp(&b.mom_change));
    ranked.truncate(n);
    ranked
}

/// Households with the largest month-over-month inflows, best first.
pub fn top_gainers(households: &[HouseholdRecord], n: usize) -> Vec<&HouseholdRecord> {
    let mut ranked: Vec<&HouseholdRecord> =
        households.iter().filter(|h| h.mom_change > 0.0).collect();
    ranked.sort_by(|a, b| b.mom_change.total_cmp(&a.mom_change));
    ranked.truncate(n);
    ranked
}

pub fn officer_leaderboard(
    officers: &[OfficerMetrics],
    directory: &TeamDirectory,
) -> Vec<LeaderboardEntry> {
    officers
        .iter()
        .map(|o| LeaderboardEntry {
            officer_code: o.officer_code.clone(),
            officer_name: o.officer_name.clone(),
            team: directory.resolve_team(&o.officer_name).to_string(),
            balance: o.total_balance,
            growth_ytd: o.ytd_change,
            liquidity_avg: o.avg_ratio,
            household_count: o.household_count,
        })
        .collect()
}

pub fn filter_metadata(officers: &[OfficerMetrics], directory: &TeamDirectory) -> FilterMetadata {
    let mut options: Vec<OfficerOption> = officers
        .iter()
        .map(|o| OfficerOption {
            code: o.officer_code.clone(),
            name: o.officer_name.clone(),
            team: directory.resolve_team(&o.officer_name).to_string(),
        })
        .collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));

    FilterMetadata {
        teams: directory.team_names().map(str::to_string).collect(),
        officers: options,
        balance_tiers: BalanceTier::TIERS.to_vec(),
    }
}
