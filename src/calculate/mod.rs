//! Statistics calculation engine.
//!
//! Turns a raw GRID series document into a [`StatsReport`]:
//! - Series overview and totals
//! - Team summaries with winner determination
//! - Deduplicated player summaries with K/D and KDA
//! - Per-team round metrics (see [`metrics`])
//!
//! The engine is a pure function of its input. It never logs and keeps no
//! state between calls.

pub mod format;
pub mod metrics;

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    GameSummary, PlayerSummary, RawSeriesDocument, RawTeam, SeriesAnalytics, SeriesOverview,
    StatsReport, TeamSummary,
};

use self::format::{format_timestamp, to_fixed, yes_no};
use self::metrics::compute_team_analytics;

/// Key under which some GRID endpoints nest the series document.
pub const SERIES_STATE_KEY: &str = "seriesState";

/// Errors that can occur while reading a series document.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Series document must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Malformed series document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// Compute a report from an untyped JSON document.
///
/// Accepts the document either bare or nested under `seriesState`. Any
/// structural mismatch fails the whole call; no partial report is produced.
pub fn compute_stats_from_value(value: &Value) -> Result<StatsReport, EngineError> {
    let doc = parse_series_document(value)?;
    Ok(compute_stats(&doc))
}

/// Unwrap the optional `seriesState` envelope and validate the schema.
pub fn parse_series_document(value: &Value) -> Result<RawSeriesDocument, EngineError> {
    let series = match value.get(SERIES_STATE_KEY) {
        Some(inner) if !inner.is_null() => inner,
        _ => value,
    };

    if !series.is_object() {
        return Err(EngineError::NotAnObject(json_kind(series)));
    }

    Ok(RawSeriesDocument::deserialize(series)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compute the full statistics report for a typed series document.
pub fn compute_stats(doc: &RawSeriesDocument) -> StatsReport {
    let teams = summarize_teams(doc.teams());
    let games = summarize_games(doc);
    let players = summarize_players(doc.teams());

    let overview = SeriesOverview {
        series_id: doc.id.clone(),
        started_at: doc.started_at.as_deref().map(format_timestamp),
        updated_at: doc.updated_at.as_deref().map(format_timestamp),
        format: doc.format.as_ref().map(|f| f.short_or("Unknown").to_string()),
        title: doc
            .title
            .as_ref()
            .map_or("Unknown", |t| t.short_or("Unknown"))
            .to_string(),
        finished: yes_no(doc.is_finished()),
        total_games: doc.games().len() as u64,
        total_kills: saturating_total(teams.iter().map(|t| t.kills)),
        total_deaths: saturating_total(teams.iter().map(|t| t.deaths)),
        total_headshots: saturating_total(teams.iter().map(|t| t.headshots)),
        total_players: players.len() as u64,
        total_segments: games.iter().map(|g| g.segments).sum(),
    };

    StatsReport {
        overview,
        teams,
        players,
        games,
        analytics: SeriesAnalytics {
            team_analytics: compute_team_analytics(doc),
        },
    }
}

/// Sum document counters, pinning at `u64::MAX` instead of overflowing.
fn saturating_total(counts: impl Iterator<Item = u64>) -> u64 {
    counts.fold(0, u64::saturating_add)
}

/// Summarize series-level team totals.
///
/// `won` is only decided for exactly two teams, by strictly higher score.
pub fn summarize_teams(teams: &[RawTeam]) -> Vec<TeamSummary> {
    teams
        .iter()
        .enumerate()
        .map(|(idx, team)| {
            let score = team.score.unwrap_or(0);
            let won = teams.len() == 2 && score > teams[1 - idx].score.unwrap_or(0);

            TeamSummary {
                name: team.display_name(idx),
                id: team.id.clone(),
                score,
                kills: team.kills.unwrap_or(0),
                deaths: team.deaths.unwrap_or(0),
                headshots: team.headshots.unwrap_or(0),
                player_count: team.players().len() as u64,
                won,
            }
        })
        .collect()
}

pub fn summarize_games(doc: &RawSeriesDocument) -> Vec<GameSummary> {
    doc.games()
        .iter()
        .enumerate()
        .map(|(idx, game)| GameSummary {
            number: idx as u64 + 1,
            map: game.map_name().to_string(),
            finished: yes_no(game.finished.unwrap_or(false)),
            segments: game.segments().len() as u64,
        })
        .collect()
}

/// Players keyed by id with last-write-wins semantics.
///
/// A repeated id replaces the earlier record in its original slot, so
/// iteration order is the order in which ids were first seen.
#[derive(Debug, Default)]
pub struct PlayerLedger {
    index: HashMap<String, usize>,
    records: Vec<PlayerSummary>,
}

impl PlayerLedger {
    pub fn upsert(&mut self, record: PlayerSummary) {
        match self.index.get(&record.id) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<PlayerSummary> {
        self.records
    }
}

/// Flatten every team's roster into deduplicated player summaries sorted by
/// kills, descending. Players without an id are skipped.
pub fn summarize_players(teams: &[RawTeam]) -> Vec<PlayerSummary> {
    let mut ledger = PlayerLedger::default();

    for team in teams {
        for player in team.players() {
            let Some(id) = player.id.clone().filter(|id| !id.is_empty()) else {
                continue;
            };

            let kills = player.kills.unwrap_or(0);
            let deaths = player.deaths.unwrap_or(0);
            let assists = player.kill_assists_given.unwrap_or(0);

            ledger.upsert(PlayerSummary {
                name: player.name.clone().unwrap_or_else(|| id.clone()),
                id,
                team: team.label().map(str::to_string),
                kills,
                deaths,
                assists,
                headshots: player.headshots.unwrap_or(0),
                selfkills: player.selfkills.unwrap_or(0),
                kd: to_fixed(calculate_kd(kills, deaths), 2),
                kda: to_fixed(calculate_kda(kills, assists, deaths), 2),
            });
        }
    }

    let mut players = ledger.into_records();
    // Stable: equal kill counts keep first-seen order
    players.sort_by(|a, b| b.kills.cmp(&a.kills));
    players
}

/// Kills per death. With zero deaths this is the raw kill count.
pub fn calculate_kd(kills: u64, deaths: u64) -> f64 {
    if deaths > 0 {
        kills as f64 / deaths as f64
    } else {
        kills as f64
    }
}

/// Kills plus assists per death. With zero deaths this is the raw sum.
pub fn calculate_kda(kills: u64, assists: u64, deaths: u64) -> f64 {
    let contributions = kills as f64 + assists as f64;
    if deaths > 0 {
        contributions / deaths as f64
    } else {
        contributions
    }
}
