//! Statistics report models.
//!
//! Field names serialize in camelCase; dashboard and export consumers depend
//! on them staying stable.

use serde::{Deserialize, Serialize};

/// Series-level overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOverview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    pub title: String,

    /// "Yes" or "No"
    pub finished: String,

    pub total_games: u64,
    pub total_kills: u64,
    pub total_deaths: u64,
    pub total_headshots: u64,
    pub total_players: u64,
    pub total_segments: u64,
}

/// Per-team series totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    pub score: u64,
    pub kills: u64,
    pub deaths: u64,
    pub headshots: u64,
    pub player_count: u64,

    /// Only ever true in a two-team series with a strictly higher score.
    pub won: bool,
}

/// Per-player series totals with derived ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub kills: u64,
    pub deaths: u64,
    pub assists: u64,
    pub headshots: u64,
    pub selfkills: u64,

    /// kills / deaths, or raw kills when deaths is zero
    pub kd: String,

    /// (kills + assists) / deaths, or kills + assists when deaths is zero
    pub kda: String,
}

/// Per-game summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    /// 1-based position in the series
    pub number: u64,
    pub map: String,
    /// "Yes" or "No"
    pub finished: String,
    pub segments: u64,
}

/// Composite round-level metrics for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAdvancedMetrics {
    pub team_id: String,
    pub team_name: String,
    pub round_timing_efficiency: String,
    pub ope: String,
    pub dsv: String,
    pub tempo_leak: String,
    pub pace_deviation: String,
    pub total_rounds: u64,
    pub total_objectives: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesAnalytics {
    pub team_analytics: Vec<TeamAdvancedMetrics>,
}

/// Full statistics report for one series document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub overview: SeriesOverview,
    pub teams: Vec<TeamSummary>,
    pub players: Vec<PlayerSummary>,
    pub games: Vec<GameSummary>,
    pub analytics: SeriesAnalytics,
}

impl StatsReport {
    /// Get advanced metrics by team id.
    pub fn team_metrics(&self, team_id: &str) -> Option<&TeamAdvancedMetrics> {
        self.analytics
            .team_analytics
            .iter()
            .find(|m| m.team_id == team_id)
    }

    /// The winning team of a decided two-team series.
    pub fn winner(&self) -> Option<&TeamSummary> {
        self.teams.iter().find(|t| t.won)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> StatsReport {
        StatsReport {
            overview: SeriesOverview {
                series_id: Some("2819695".to_string()),
                started_at: None,
                updated_at: None,
                format: None,
                title: "VAL".to_string(),
                finished: "Yes".to_string(),
                total_games: 1,
                total_kills: 30,
                total_deaths: 30,
                total_headshots: 9,
                total_players: 0,
                total_segments: 24,
            },
            teams: vec![
                TeamSummary {
                    name: "Sentinels".to_string(),
                    id: Some("1".to_string()),
                    score: 2,
                    kills: 18,
                    deaths: 12,
                    headshots: 6,
                    player_count: 5,
                    won: true,
                },
                TeamSummary {
                    name: "LOUD".to_string(),
                    id: Some("2".to_string()),
                    score: 1,
                    kills: 12,
                    deaths: 18,
                    headshots: 3,
                    player_count: 5,
                    won: false,
                },
            ],
            players: vec![],
            games: vec![],
            analytics: SeriesAnalytics::default(),
        }
    }

    #[test]
    fn test_overview_serializes_camel_case() {
        let json = serde_json::to_value(sample_report()).unwrap();

        assert_eq!(json["overview"]["seriesId"], "2819695");
        assert_eq!(json["overview"]["totalSegments"], 24);
        assert_eq!(json["teams"][0]["playerCount"], 5);
        assert!(json["analytics"]["teamAnalytics"].is_array());
    }

    #[test]
    fn test_absent_overview_fields_are_omitted() {
        let json = serde_json::to_value(sample_report()).unwrap();

        assert!(json["overview"].get("startedAt").is_none());
        assert!(json["overview"].get("format").is_none());
    }

    #[test]
    fn test_winner() {
        let report = sample_report();
        assert_eq!(report.winner().map(|t| t.name.as_str()), Some("Sentinels"));
    }
}
