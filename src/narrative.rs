use crate::schema::{HouseholdRecord, OfficerMetrics};
use crate::utils::format_currency;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveSummary {
    pub total_ytd_change: f64,
    pub biggest_loser: String,
    pub biggest_loser_ytd_change: f64,
    pub top_performer: String,
    /// MoM change over the officer's implied prior balance, in percent.
    pub top_performer_growth_pct: f64,
    pub top_performer_households: usize,
    pub markdown_text: String,
    pub highlighted_entities: Vec<String>,
}

/// MoM growth against the balance the officer held before this month's change.
pub fn mom_growth_rate(officer: &OfficerMetrics) -> f64 {
    let prior = officer.total_balance - officer.mom_change;
    if prior > 0.0 {
        officer.mom_change / prior * 100.0
    } else {
        0.0
    }
}

/// One-paragraph summary of the portfolio's YTD direction and the officer with
/// the strongest month. `None` when there are no households or no officer with
/// a positive balance and a nonzero MoM change.
pub fn executive_summary(
    households: &[HouseholdRecord],
    officers: &[OfficerMetrics],
) -> Option<ExecutiveSummary> {
    let loser = households
        .iter()
        .reduce(|worst, h| if h.ytd_change < worst.ytd_change { h } else { worst })?;

    let performer = officers
        .iter()
        .filter(|o| o.total_balance > 0.0 && o.mom_change != 0.0)
        .reduce(|best, o| {
            if mom_growth_rate(o) > mom_growth_rate(best) {
                o
            } else {
                best
            }
        })?;

    let total_ytd_change: f64 = households.iter().map(|h| h.ytd_change).sum();
    let growth = mom_growth_rate(performer);

    let mut highlighted = Vec::new();
    let opening = if total_ytd_change < 0.0 {
        highlighted.push(loser.household_name.clone());
        format!(
            "Deposits are **{} YTD**, driven primarily by the **{}** household ({}). However,",
            format_currency(total_ytd_change),
            loser.household_name,
            format_currency(loser.ytd_change)
        )
    } else {
        format!(
            "Deposits are **up {} YTD**, showing strong portfolio growth. Meanwhile,",
            format_currency(total_ytd_change)
        )
    };
    highlighted.push(performer.officer_name.clone());

    let markdown_text = format!(
        "{} Officer **{}** has achieved **{:.0}% growth** in their portfolio this month, \
         demonstrating excellent relationship management with {} households.",
        opening, performer.officer_name, growth, performer.household_count
    );

    Some(ExecutiveSummary {
        total_ytd_change,
        biggest_loser: loser.household_name.clone(),
        biggest_loser_ytd_change: loser.ytd_change,
        top_performer: performer.officer_name.clone(),
        top_performer_growth_pct: growth,
        top_performer_households: performer.household_count,
        markdown_text,
        highlighted_entities: highlighted,
    })
}
