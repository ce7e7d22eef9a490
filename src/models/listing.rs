//! Series listings shown in the series picker.

use serde::{Deserialize, Serialize};

/// A team as shown in a series listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingTeam {
    pub name: Option<String>,
    #[serde(default)]
    pub score_advantage: i64,
}

/// A scheduled or live series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesListing {
    pub id: String,
    pub title: Option<String>,
    pub tournament: Option<String>,
    pub start_time_scheduled: Option<String>,
    pub format: Option<String>,
    #[serde(default)]
    pub teams: Vec<ListingTeam>,
}

impl SeriesListing {
    /// "Team A vs Team B" style label, with placeholders for unnamed teams.
    pub fn matchup(&self) -> String {
        if self.teams.is_empty() {
            return "TBD".to_string();
        }
        self.teams
            .iter()
            .map(|t| t.name.as_deref().unwrap_or("TBD"))
            .collect::<Vec<_>>()
            .join(" vs ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matchup() {
        let listing = SeriesListing {
            id: "1".to_string(),
            title: None,
            tournament: None,
            start_time_scheduled: None,
            format: None,
            teams: vec![
                ListingTeam {
                    name: Some("Sentinels".to_string()),
                    score_advantage: 0,
                },
                ListingTeam {
                    name: None,
                    score_advantage: 0,
                },
            ],
        };

        assert_eq!(listing.matchup(), "Sentinels vs TBD");
    }

    #[test]
    fn test_matchup_without_teams() {
        let listing: SeriesListing = serde_json::from_str(r#"{"id":"7"}"#).unwrap();
        assert_eq!(listing.matchup(), "TBD");
    }
}
