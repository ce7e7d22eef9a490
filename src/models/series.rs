//! Raw GRID series document schema.
//!
//! Every field is optional. Accessor methods apply the default-substitution
//! rules so the engine never deals with absent values directly.

use serde::{Deserialize, Deserializer, Serialize};

/// A display name that GRID sends either as a plain string or as an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayName {
    Text(String),
    Named {
        #[serde(rename = "nameShortened", default)]
        name_shortened: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl DisplayName {
    /// Resolve preferring the shortened name, used for titles and formats.
    pub fn short_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            DisplayName::Text(s) => s,
            DisplayName::Named {
                name_shortened,
                name,
            } => non_empty(name_shortened)
                .or_else(|| non_empty(name))
                .unwrap_or(fallback),
        }
    }

    /// Resolve using only the full name, used for maps.
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            DisplayName::Text(s) => s,
            DisplayName::Named { name, .. } => non_empty(name).unwrap_or(fallback),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// GRID ids are strings, but some feeds send bare integers.
fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
    }))
}

/// Counters are JSON numbers of any shape. Negative values clamp to zero and
/// fractional values truncate toward zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(Option::<Count>::deserialize(deserializer)?.map(|count| match count {
        Count::Unsigned(n) => n,
        Count::Signed(n) => n.max(0) as u64,
        // `as` saturates at u64::MAX
        Count::Float(f) if f > 0.0 => f as u64,
        Count::Float(_) => 0,
    }))
}

/// Top-level series end-state document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeriesDocument {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub started_at: Option<String>,
    pub updated_at: Option<String>,
    pub format: Option<DisplayName>,
    pub title: Option<DisplayName>,
    pub finished: Option<bool>,
    pub teams: Option<Vec<RawTeam>>,
    pub games: Option<Vec<RawGame>>,
}

impl RawSeriesDocument {
    pub fn teams(&self) -> &[RawTeam] {
        self.teams.as_deref().unwrap_or_default()
    }

    pub fn games(&self) -> &[RawGame] {
        self.games.as_deref().unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.unwrap_or(false)
    }
}

/// Series-level team totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeam {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub score: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub kills: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub deaths: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub headshots: Option<u64>,
    pub players: Option<Vec<RawPlayer>>,
}

impl RawTeam {
    pub fn players(&self) -> &[RawPlayer] {
        self.players.as_deref().unwrap_or_default()
    }

    /// Name shown in team summaries, falling back to the 1-based position.
    pub fn display_name(&self, index: usize) -> String {
        match non_empty(&self.name) {
            Some(name) => name.to_string(),
            None => format!("Team {}", index + 1),
        }
    }

    /// Label attached to player rows: name, then id.
    pub fn label(&self) -> Option<&str> {
        non_empty(&self.name).or_else(|| non_empty(&self.id))
    }
}

/// Series-level player totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayer {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub kills: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub deaths: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub kill_assists_given: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub headshots: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub selfkills: Option<u64>,
}

/// One game (map) of the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGame {
    pub map: Option<DisplayName>,
    pub finished: Option<bool>,
    pub segments: Option<Vec<RawSegment>>,
}

impl RawGame {
    pub fn segments(&self) -> &[RawSegment] {
        self.segments.as_deref().unwrap_or_default()
    }

    pub fn map_name(&self) -> &str {
        self.map
            .as_ref()
            .map_or("Unknown Map", |m| m.name_or("Unknown Map"))
    }
}

/// One round of a game, holding per-team snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSegment {
    pub teams: Option<Vec<RawSegmentTeamStat>>,
}

impl RawSegment {
    pub fn teams(&self) -> &[RawSegmentTeamStat] {
        self.teams.as_deref().unwrap_or_default()
    }
}

/// A team's stats within a single segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSegmentTeamStat {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub kills: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub deaths: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub headshots: Option<u64>,
    pub objectives: Option<Vec<RawObjective>>,
}

impl RawSegmentTeamStat {
    pub fn objectives(&self) -> &[RawObjective] {
        self.objectives.as_deref().unwrap_or_default()
    }
}

/// An objective entry such as a spike plant or defuse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObjective {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub completion_count: Option<u64>,
}

impl RawObjective {
    /// Absent or zero completion counts are recorded as a single completion.
    pub fn completions(&self) -> u64 {
        self.completion_count.filter(|&c| c > 0).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_defaults() {
        let doc: RawSeriesDocument = serde_json::from_value(json!({})).unwrap();

        assert!(doc.teams().is_empty());
        assert!(doc.games().is_empty());
        assert!(!doc.is_finished());
        assert_eq!(doc.id, None);
    }

    #[test]
    fn test_null_collections_default_to_empty() {
        let doc: RawSeriesDocument =
            serde_json::from_value(json!({ "teams": null, "games": null })).unwrap();

        assert!(doc.teams().is_empty());
        assert!(doc.games().is_empty());
    }

    #[test]
    fn test_display_name_string_and_object() {
        let text: DisplayName = serde_json::from_value(json!("VALORANT")).unwrap();
        assert_eq!(text.short_or("Unknown"), "VALORANT");

        let named: DisplayName =
            serde_json::from_value(json!({ "nameShortened": "VAL", "name": "Valorant" })).unwrap();
        assert_eq!(named.short_or("Unknown"), "VAL");
        assert_eq!(named.name_or("Unknown Map"), "Valorant");

        let full_only: DisplayName = serde_json::from_value(json!({ "name": "Valorant" })).unwrap();
        assert_eq!(full_only.short_or("Unknown"), "Valorant");

        let empty: DisplayName = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.short_or("Unknown"), "Unknown");
    }

    #[test]
    fn test_map_name_fallback() {
        let game = RawGame::default();
        assert_eq!(game.map_name(), "Unknown Map");

        let game: RawGame = serde_json::from_value(json!({ "map": { "name": "Ascent" } })).unwrap();
        assert_eq!(game.map_name(), "Ascent");

        let game: RawGame = serde_json::from_value(json!({ "map": "Bind" })).unwrap();
        assert_eq!(game.map_name(), "Bind");
    }

    #[test]
    fn test_numeric_ids_are_stringified() {
        let team: RawTeam = serde_json::from_value(json!({ "id": 83, "name": "Sentinels" })).unwrap();
        assert_eq!(team.id.as_deref(), Some("83"));
    }

    #[test]
    fn test_team_display_name() {
        let named = RawTeam {
            name: Some("Fnatic".to_string()),
            ..Default::default()
        };
        assert_eq!(named.display_name(0), "Fnatic");
        assert_eq!(RawTeam::default().display_name(1), "Team 2");
    }

    #[test]
    fn test_team_label_prefers_name_then_id() {
        let team = RawTeam {
            id: Some("t-1".to_string()),
            ..Default::default()
        };
        assert_eq!(team.label(), Some("t-1"));
        assert_eq!(RawTeam::default().label(), None);
    }

    #[test]
    fn test_objective_completions_default_to_one() {
        let obj: RawObjective = serde_json::from_value(json!({ "type": "plantBomb" })).unwrap();
        assert_eq!(obj.kind.as_deref(), Some("plantBomb"));
        assert_eq!(obj.completions(), 1);

        let zero = RawObjective {
            kind: None,
            completion_count: Some(0),
        };
        assert_eq!(zero.completions(), 1);

        let three = RawObjective {
            kind: None,
            completion_count: Some(3),
        };
        assert_eq!(three.completions(), 3);
    }

    #[test]
    fn test_counters_accept_any_json_number() {
        let team: RawTeam = serde_json::from_value(json!({
            "score": -1,
            "kills": 3.0,
            "deaths": 4.7,
            "headshots": null,
            "players": [{ "id": "p1", "kills": 18446744073709551615u64, "selfkills": -2.5 }]
        }))
        .unwrap();

        assert_eq!(team.score, Some(0));
        assert_eq!(team.kills, Some(3));
        assert_eq!(team.deaths, Some(4));
        assert_eq!(team.headshots, None);
        assert_eq!(team.players()[0].kills, Some(u64::MAX));
        assert_eq!(team.players()[0].selfkills, Some(0));
        assert_eq!(team.players()[0].deaths, None);

        let huge: RawSegmentTeamStat = serde_json::from_value(json!({ "kills": 1e30 })).unwrap();
        assert_eq!(huge.kills, Some(u64::MAX));

        let obj: RawObjective =
            serde_json::from_value(json!({ "type": "plantBomb", "completionCount": 2.0 })).unwrap();
        assert_eq!(obj.completions(), 2);
    }

    #[test]
    fn test_non_numeric_counter_is_rejected() {
        let result = serde_json::from_value::<RawTeam>(json!({ "kills": "many" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let result = serde_json::from_value::<RawSeriesDocument>(json!({ "teams": "nope" }));
        assert!(result.is_err());
    }
}
