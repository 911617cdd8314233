use crate::error::{DashboardError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const BUSINESS_BANKING: &str = "Business Banking";
pub const OCF: &str = "OCF";
pub const PERSONAL_BANKING: &str = "Personal Banking";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TeamRoster {
    #[schemars(description = "Display name of the team.")]
    pub name: String,

    #[schemars(description = "Officer names exactly as they appear in the report.")]
    #[serde(default)]
    pub members: Vec<String>,
}

/// Ordered team rosters plus the catch-all team for every unlisted officer.
///
/// Lookup is first-match in roster order, so an officer listed twice belongs
/// to the earlier team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamDirectory {
    pub teams: Vec<TeamRoster>,

    #[serde(alias = "catch_all")]
    #[schemars(description = "Name of the team that receives every officer not on another roster. Must be one of `teams`.")]
    pub catch_all: String,
}

impl Default for TeamDirectory {
    fn default() -> Self {
        let roster = |name: &str, members: &[&str]| TeamRoster {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        };

        Self {
            teams: vec![
                roster(
                    BUSINESS_BANKING,
                    &[
                        "Mark Morrison",
                        "Brad Kirkland",
                        "Cary Listerman",
                        "Josh Copen",
                        "Jose Morales",
                        "Marlon Attiq",
                        "Scott McCurdy",
                        "Bryan Ford",
                        "Jack Korth",
                        "Hans Dessureault",
                        "Tracey Brinkman",
                        "Thomas Merrill",
                        "Daniel McCarthy",
                        "Mohamed Arfaoui",
                    ],
                ),
                roster(
                    OCF,
                    &[
                        "John Trendell",
                        "Steve Tomasello",
                        "Robyn Barrett",
                        "Kori Bezemek-Hogston",
                        "Matthew Bacich",
                        "Mark Matheson",
                    ],
                ),
                roster(PERSONAL_BANKING, &[]),
            ],
            catch_all: PERSONAL_BANKING.to_string(),
        }
    }
}

impl TeamDirectory {
    pub fn new(teams: Vec<TeamRoster>, catch_all: impl Into<String>) -> Result<Self> {
        let directory = Self {
            teams,
            catch_all: catch_all.into(),
        };
        directory.validate()?;
        Ok(directory)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for team in &self.teams {
            if team.name.trim().is_empty() {
                return Err(DashboardError::InvalidConfig(
                    "team names must not be blank".to_string(),
                ));
            }
            if !seen.insert(team.name.as_str()) {
                return Err(DashboardError::InvalidConfig(format!(
                    "team '{}' is defined more than once",
                    team.name
                )));
            }
        }

        if !seen.contains(self.catch_all.as_str()) {
            return Err(DashboardError::InvalidConfig(format!(
                "catch-all team '{}' is not one of the defined teams",
                self.catch_all
            )));
        }

        Ok(())
    }

    /// Every defined team name, in roster order.
    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(|t| t.name.as_str())
    }

    pub fn is_team(&self, name: &str) -> bool {
        self.teams.iter().any(|t| t.name == name)
    }

    pub fn resolve_team(&self, officer_name: &str) -> &str {
        self.teams
            .iter()
            .find(|team| team.members.iter().any(|m| m == officer_name))
            .map(|team| team.name.as_str())
            .unwrap_or(self.catch_all.as_str())
    }

    /// Officers belonging to `team_name`.
    ///
    /// Named teams return their static roster. The catch-all team returns every
    /// officer in `all_officers` that no other roster claims. Unknown teams are empty.
    pub fn roster_members(&self, team_name: &str, all_officers: &[String]) -> Vec<String> {
        if team_name == self.catch_all {
            let claimed: HashSet<&str> = self
                .teams
                .iter()
                .filter(|team| team.name != self.catch_all)
                .flat_map(|team| team.members.iter().map(String::as_str))
                .collect();

            return all_officers
                .iter()
                .filter(|officer| !claimed.contains(officer.as_str()))
                .cloned()
                .collect();
        }

        self.teams
            .iter()
            .find(|team| team.name == team_name)
            .map(|team| team.members.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_named_and_catch_all() {
        let directory = TeamDirectory::default();

        assert_eq!(directory.resolve_team("Mark Morrison"), BUSINESS_BANKING);
        assert_eq!(directory.resolve_team("Mark Matheson"), OCF);
        assert_eq!(directory.resolve_team("Jane Doe"), PERSONAL_BANKING);
        assert_eq!(directory.resolve_team(""), PERSONAL_BANKING);
        // exact match only
        assert_eq!(directory.resolve_team("mark morrison"), PERSONAL_BANKING);
    }

    #[test]
    fn test_default_team_order() {
        let directory = TeamDirectory::default();
        let names: Vec<&str> = directory.team_names().collect();
        assert_eq!(names, vec![BUSINESS_BANKING, OCF, PERSONAL_BANKING]);
    }

    #[test]
    fn test_roster_members_catch_all_is_complement() {
        let directory = TeamDirectory::default();
        let officers = vec![
            "Mark Morrison".to_string(),
            "Jane Doe".to_string(),
            "Robyn Barrett".to_string(),
            "Alex Kim".to_string(),
        ];

        assert_eq!(
            directory.roster_members(PERSONAL_BANKING, &officers),
            vec!["Jane Doe".to_string(), "Alex Kim".to_string()]
        );
        assert_eq!(directory.roster_members(OCF, &officers).len(), 6);
        assert!(directory.roster_members("Wealth", &officers).is_empty());
    }

    #[test]
    fn test_first_roster_wins_for_duplicates() {
        let directory = TeamDirectory::new(
            vec![
                TeamRoster {
                    name: "A".to_string(),
                    members: vec!["Pat".to_string()],
                },
                TeamRoster {
                    name: "B".to_string(),
                    members: vec!["Pat".to_string()],
                },
                TeamRoster {
                    name: "Rest".to_string(),
                    members: vec![],
                },
            ],
            "Rest",
        )
        .unwrap();

        assert_eq!(directory.resolve_team("Pat"), "A");
    }

    #[test]
    fn test_validation_rejects_bad_directories() {
        let missing_catch_all = TeamDirectory::new(
            vec![TeamRoster {
                name: "A".to_string(),
                members: vec![],
            }],
            "Rest",
        );
        assert!(matches!(
            missing_catch_all,
            Err(DashboardError::InvalidConfig(_))
        ));

        let duplicate = TeamDirectory::new(
            vec![
                TeamRoster {
                    name: "A".to_string(),
                    members: vec![],
                },
                TeamRoster {
                    name: "A".to_string(),
                    members: vec![],
                },
            ],
            "A",
        );
        assert!(duplicate.is_err());
    }
}
