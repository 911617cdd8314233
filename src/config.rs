use crate::error::{DashboardError, Result};
use crate::teams::TeamDirectory;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds and team rosters used while ingesting and summarizing a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    pub teams: TeamDirectory,

    #[schemars(description = "Current ratio (in percent) above which a household is flagged as an extreme value.")]
    #[serde(alias = "extreme_ratio_threshold")]
    pub extreme_ratio_threshold: f64,

    #[schemars(description = "Per-household cap (in percent) applied before averaging the portfolio liquidity ratio.")]
    #[serde(alias = "ratio_cap")]
    pub ratio_cap: f64,

    #[schemars(description = "IQR multiplier for the officer outlier window.")]
    #[serde(alias = "outlier_iqr_multiplier")]
    pub outlier_iqr_multiplier: f64,

    #[schemars(description = "Length of the top-household, gainer and attrition lists.")]
    #[serde(alias = "leaderboard_size")]
    pub leaderboard_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            teams: TeamDirectory::default(),
            extreme_ratio_threshold: 1000.0,
            ratio_cap: 500.0,
            outlier_iqr_multiplier: 2.5,
            leaderboard_size: 10,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.teams.validate()?;

        let thresholds = [
            ("extremeRatioThreshold", self.extreme_ratio_threshold),
            ("ratioCap", self.ratio_cap),
            ("outlierIqrMultiplier", self.outlier_iqr_multiplier),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(DashboardError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.leaderboard_size == 0 {
            return Err(DashboardError::InvalidConfig(
                "leaderboardSize must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
