use crate::schema::{HouseholdRecord, OfficerMetrics, TeamMetrics};
use crate::teams::TeamDirectory;
use log::debug;
use std::collections::HashMap;

struct OfficerAccumulator {
    officer_code: String,
    total_balance: f64,
    mom_change: f64,
    ytd_change: f64,
    ratios: Vec<f64>,
    household_count: usize,
    top_balance: f64,
    top_household: String,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Rolls households up per officer name, in order of first appearance.
///
/// Households without an officer name are left out. The officer code comes
/// from the first household seen for that officer. The top household is the
/// first with the largest balance above zero, empty when there is none.
pub fn calculate_officer_metrics(households: &[HouseholdRecord]) -> Vec<OfficerMetrics> {
    let mut order: Vec<String> = Vec::new();
    let mut officers: HashMap<String, OfficerAccumulator> = HashMap::new();

    for household in households {
        if household.officer_name.is_empty() {
            continue;
        }

        let acc = officers
            .entry(household.officer_name.clone())
            .or_insert_with(|| {
                order.push(household.officer_name.clone());
                OfficerAccumulator {
                    officer_code: household.officer_code.clone(),
                    total_balance: 0.0,
                    mom_change: 0.0,
                    ytd_change: 0.0,
                    ratios: Vec::new(),
                    household_count: 0,
                    top_balance: 0.0,
                    top_household: String::new(),
                }
            });

        acc.total_balance += household.current_balance;
        acc.mom_change += household.mom_change;
        acc.ytd_change += household.ytd_change;
        acc.household_count += 1;

        if let Some(ratio) = household.deposit_to_loans_ratio_current {
            acc.ratios.push(ratio);
        }

        if household.current_balance > acc.top_balance {
            acc.top_balance = household.current_balance;
            acc.top_household = household.household_name.clone();
        }
    }

    debug!(
        "Aggregated {} households into {} officers",
        households.len(),
        order.len()
    );

    order
        .into_iter()
        .filter_map(|name| {
            let acc = officers.remove(&name)?;
            Some(OfficerMetrics {
                officer_code: acc.officer_code,
                total_balance: acc.total_balance,
                mom_change: acc.mom_change,
                ytd_change: acc.ytd_change,
                avg_ratio: mean(&acc.ratios),
                household_count: acc.household_count,
                top_household: acc.top_household,
                officer_name: name,
            })
        })
        .collect()
}

/// Rolls officer metrics up per team. Every team in the directory appears
/// once, in directory order, even when it has no officers.
pub fn calculate_team_metrics(
    officers: &[OfficerMetrics],
    directory: &TeamDirectory,
) -> Vec<TeamMetrics> {
    let mut teams: Vec<(TeamMetrics, Vec<f64>)> = directory
        .team_names()
        .map(|name| {
            (
                TeamMetrics {
                    team_name: name.to_string(),
                    total_balance: 0.0,
                    mom_change: 0.0,
                    ytd_change: 0.0,
                    avg_ratio: 0.0,
                    officer_count: 0,
                    household_count: 0,
                    top_officer: None,
                    top_officer_balance: 0.0,
                },
                Vec::new(),
            )
        })
        .collect();

    for officer in officers {
        let team_name = directory.resolve_team(&officer.officer_name);
        let Some((team, ratios)) = teams.iter_mut().find(|(t, _)| t.team_name == team_name)
        else {
            continue;
        };

        team.total_balance += officer.total_balance;
        team.mom_change += officer.mom_change;
        team.ytd_change += officer.ytd_change;
        team.officer_count += 1;
        team.household_count += officer.household_count;

        if officer.avg_ratio > 0.0 {
            ratios.push(officer.avg_ratio);
        }

        if team.top_officer.is_none() || officer.total_balance > team.top_officer_balance {
            team.top_officer = Some(officer.officer_name.clone());
            team.top_officer_balance = officer.total_balance;
        }
    }

    teams
        .into_iter()
        .map(|(mut team, ratios)| {
            team.avg_ratio = mean(&ratios);
            team
        })
        .collect()
}
