use crate::error::{DashboardError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One household row of the balance report after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdRecord {
    pub household_id: String,
    pub household_name: String,
    pub officer_code: String,
    pub officer_name: String,

    /// Deposits as a percentage of loans, `None` when the cell was blank or a formula error.
    pub deposit_to_loans_ratio_current: Option<f64>,
    pub deposit_to_loans_ratio_prior: Option<f64>,
    pub deposit_to_loans_ratio_ytd: Option<f64>,

    /// Current month-end deposit balance.
    pub current_balance: f64,
    /// Prior month-end deposit balance.
    pub prior_balance: f64,
    /// Prior year-end deposit balance.
    pub ytd_balance: f64,

    pub mom_change: f64,
    pub ytd_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    #[schemars(description = "Bank-wide summary row, removed from household analysis")]
    TotalsRow,

    #[schemars(description = "Household name blank after trimming, row removed")]
    EmptyName,

    #[schemars(description = "Current, prior and year-start balances all zero, row removed")]
    ZeroBalance,

    #[schemars(description = "Ratio cell held a spreadsheet formula error such as #DIV/0!")]
    SpreadsheetError,

    #[schemars(description = "Current ratio above the extreme threshold, kept but flagged")]
    ExtremeRatio,

    #[schemars(description = "Officer name and code were transposed and have been corrected")]
    SwappedFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Row dropped.
    Error,
    /// Value nulled or flagged, row kept.
    Warning,
    /// Value corrected automatically.
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityFinding {
    /// Spreadsheet row number (header is row 1, first data row is row 2).
    pub row_number: usize,
    pub household_id: String,
    pub household_name: String,
    pub kind: FindingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    pub description: String,
    pub severity: Severity,
}

/// Bank-wide deposit-to-loan ratios taken from the totals row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    pub deposit_to_loans_ratio_current: Option<f64>,
    pub deposit_to_loans_ratio_prior_quarter: Option<f64>,
    pub deposit_to_loans_ratio_yoy: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadStats {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub filtered_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataLoadResult {
    pub households: Vec<HouseholdRecord>,
    pub findings: Vec<DataQualityFinding>,
    pub bank_summary: BankSummary,
    pub stats: LoadStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficerMetrics {
    pub officer_name: String,
    pub officer_code: String,
    pub total_balance: f64,
    pub mom_change: f64,
    pub ytd_change: f64,
    /// Mean of the non-null current ratios of the officer's households, 0 when there are none.
    pub avg_ratio: f64,
    pub household_count: usize,
    pub top_household: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMetrics {
    pub team_name: String,
    pub total_balance: f64,
    pub mom_change: f64,
    pub ytd_change: f64,
    /// Mean of the officers' average ratios, counting only officers with a positive ratio.
    pub avg_ratio: f64,
    pub officer_count: usize,
    pub household_count: usize,
    pub top_officer: Option<String>,
    pub top_officer_balance: f64,
}

/// How many officers the filtered view keeps after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "TopNRepr", into = "TopNRepr")]
pub enum TopN {
    #[default]
    All,
    Count(usize),
}

/// Wire form of [`TopN`]: either a count or the keyword `"all"`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TopNRepr {
    Count(usize),
    Keyword(String),
}

impl TryFrom<TopNRepr> for TopN {
    type Error = String;

    fn try_from(repr: TopNRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            TopNRepr::Count(n) => Ok(TopN::Count(n)),
            TopNRepr::Keyword(k) if k == ALL => Ok(TopN::All),
            TopNRepr::Keyword(k) => Err(format!("expected a count or \"all\", got '{}'", k)),
        }
    }
}

impl From<TopN> for TopNRepr {
    fn from(top_n: TopN) -> Self {
        match top_n {
            TopN::All => TopNRepr::Keyword(ALL.to_string()),
            TopN::Count(n) => TopNRepr::Count(n),
        }
    }
}

const ALL: &str = "all";

/// A team or officer selector; serialized as `"all"` or the selected name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    #[default]
    All,
    Only(String),
}

impl Scope {
    pub fn only(name: impl Into<String>) -> Self {
        Scope::Only(name.into())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Only(name) => name == value,
        }
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        if value == ALL {
            Scope::All
        } else {
            Scope::Only(value)
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => ALL.to_string(),
            Scope::Only(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BalanceTier {
    #[default]
    All,
    #[schemars(description = "Households at or above $1M")]
    Mega,
    #[schemars(description = "Households from $100K up to $1M")]
    Large,
    #[schemars(description = "Households from $10K up to $100K")]
    Medium,
    #[schemars(description = "Households from $0 up to $10K")]
    Small,
}

impl BalanceTier {
    pub const TIERS: [BalanceTier; 4] = [
        BalanceTier::Mega,
        BalanceTier::Large,
        BalanceTier::Medium,
        BalanceTier::Small,
    ];

    /// Half-open `[min, max)` balance range, `None` for [`BalanceTier::All`].
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            BalanceTier::All => None,
            BalanceTier::Mega => Some((1_000_000.0, f64::INFINITY)),
            BalanceTier::Large => Some((100_000.0, 1_000_000.0)),
            BalanceTier::Medium => Some((10_000.0, 100_000.0)),
            BalanceTier::Small => Some((0.0, 10_000.0)),
        }
    }

    pub fn contains(&self, balance: f64) -> bool {
        match self.bounds() {
            None => true,
            Some((min, max)) => balance >= min && balance < max,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            BalanceTier::All => "all",
            BalanceTier::Mega => "mega",
            BalanceTier::Large => "large",
            BalanceTier::Medium => "medium",
            BalanceTier::Small => "small",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceTier::All => "All Tiers",
            BalanceTier::Mega => "Mega (>$1M)",
            BalanceTier::Large => "Large ($100K-$1M)",
            BalanceTier::Medium => "Medium ($10K-$100K)",
            BalanceTier::Small => "Small (<$10K)",
        }
    }
}

/// View filters for the officer charts.
///
/// `balance_tier` is carried for the presentation layer but is not consulted by
/// [`crate::filters::apply_officer_filters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    #[schemars(with = "TopNRepr")]
    pub top_n: TopN,
    pub min_balance: f64,
    pub exclude_outliers: bool,
    pub balance_tier: BalanceTier,
    #[schemars(with = "String")]
    pub team: Scope,
    #[schemars(with = "String")]
    pub officer: Scope,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            top_n: TopN::All,
            min_balance: 100_000.0,
            exclude_outliers: true,
            balance_tier: BalanceTier::All,
            team: Scope::All,
            officer: Scope::All,
        }
    }
}

impl FilterState {
    /// A filter that keeps every officer.
    pub fn unfiltered() -> Self {
        Self {
            min_balance: 0.0,
            exclude_outliers: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_balance.is_finite() || self.min_balance < 0.0 {
            return Err(DashboardError::InvalidFilter(format!(
                "minimum balance must be a non-negative number, got {}",
                self.min_balance
            )));
        }
        if self.top_n == TopN::Count(0) {
            return Err(DashboardError::InvalidFilter(
                "top-N must be at least 1 or \"all\"".to_string(),
            ));
        }
        Ok(())
    }
}
