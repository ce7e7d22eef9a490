//! Round-level team metrics.
//!
//! Every segment of every game contributes one round per team entry. The
//! composite metrics are computed over those round records:
//! - Round Timing Efficiency: `max(0, 100 - 10 * kill variance)`
//! - Objective Pressure Efficiency: `min(100, objectives per round * 50)`
//! - Decision Skew Variance: standard deviation of kills per round
//! - Tempo Leak: share of won-round to lost-round transitions
//! - Pace Deviation: standard deviation of per-round headshot rate

use std::collections::HashMap;

use crate::models::{RawSeriesDocument, TeamAdvancedMetrics};

use super::format::to_fixed;

const ROUND_TIMING_VARIANCE_WEIGHT: f64 = 10.0;
const OBJECTIVE_PRESSURE_SCALE: f64 = 50.0;
const METRIC_CEILING: f64 = 100.0;

/// One team's stat line for a single segment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoundRecord {
    pub kills: u64,
    pub deaths: u64,
    pub headshots: u64,
}

impl RoundRecord {
    pub fn new(kills: u64, deaths: u64, headshots: u64) -> Self {
        Self {
            kills,
            deaths,
            headshots,
        }
    }

    pub fn is_advantage(&self) -> bool {
        self.kills > self.deaths
    }

    pub fn is_disadvantage(&self) -> bool {
        self.deaths > self.kills
    }

    /// Headshot percentage, zero for a round without kills.
    pub fn headshot_rate(&self) -> f64 {
        if self.kills == 0 {
            0.0
        } else {
            self.headshots as f64 / self.kills as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveRecord {
    pub kind: Option<String>,
    pub completion_count: u64,
}

/// Rounds and objectives gathered for one team id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRounds {
    pub team_id: String,
    pub team_name: String,
    pub rounds: Vec<RoundRecord>,
    pub objectives: Vec<ObjectiveRecord>,
}

impl TeamRounds {
    pub fn metrics(&self) -> TeamAdvancedMetrics {
        let kills: Vec<f64> = self.rounds.iter().map(|r| r.kills as f64).collect();
        let kill_variance = population_variance(&kills);
        let total_rounds = self.rounds.len() as u64;
        let total_objectives = self.objectives.len() as u64;

        TeamAdvancedMetrics {
            team_id: self.team_id.clone(),
            team_name: self.team_name.clone(),
            round_timing_efficiency: to_fixed(calculate_round_timing_efficiency(kill_variance), 1),
            ope: to_fixed(
                calculate_objective_pressure(total_objectives, total_rounds),
                1,
            ),
            dsv: to_fixed(kill_variance.sqrt(), 2),
            tempo_leak: to_fixed(calculate_tempo_leak(&self.rounds), 1),
            pace_deviation: to_fixed(calculate_pace_deviation(&self.rounds), 2),
            total_rounds,
            total_objectives,
        }
    }
}

/// Scan every game and segment, grouping round records by team id.
///
/// Teams come back in first-seen order. Entries without an id share the
/// empty-string key.
pub fn collect_team_rounds(doc: &RawSeriesDocument) -> Vec<TeamRounds> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut teams: Vec<TeamRounds> = Vec::new();

    for segment in doc.games().iter().flat_map(|g| g.segments()) {
        for entry in segment.teams() {
            let team_id = entry.id.clone().unwrap_or_default();
            let slot = *index.entry(team_id.clone()).or_insert_with(|| {
                teams.push(TeamRounds {
                    team_name: entry.name.clone().unwrap_or_else(|| team_id.clone()),
                    team_id,
                    ..Default::default()
                });
                teams.len() - 1
            });

            let team = &mut teams[slot];
            team.rounds.push(RoundRecord::new(
                entry.kills.unwrap_or(0),
                entry.deaths.unwrap_or(0),
                entry.headshots.unwrap_or(0),
            ));
            team.objectives
                .extend(entry.objectives().iter().map(|obj| ObjectiveRecord {
                    kind: obj.kind.clone(),
                    completion_count: obj.completions(),
                }));
        }
    }

    teams
}

/// Advanced metrics for every team observed in the document's segments.
pub fn compute_team_analytics(doc: &RawSeriesDocument) -> Vec<TeamAdvancedMetrics> {
    collect_team_rounds(doc)
        .iter()
        .map(TeamRounds::metrics)
        .collect()
}

/// Population variance (divides by n). Zero for an empty sample.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

pub fn calculate_round_timing_efficiency(kill_variance: f64) -> f64 {
    (METRIC_CEILING - kill_variance * ROUND_TIMING_VARIANCE_WEIGHT).max(0.0)
}

/// Objective records per round, scaled and capped at 100.
pub fn calculate_objective_pressure(objectives: u64, rounds: u64) -> f64 {
    if rounds == 0 {
        return 0.0;
    }
    (objectives as f64 / rounds as f64 * OBJECTIVE_PRESSURE_SCALE).min(METRIC_CEILING)
}

/// Percentage of consecutive rounds going from advantage to disadvantage.
///
/// Defined as 0 when there are fewer than two rounds.
pub fn calculate_tempo_leak(rounds: &[RoundRecord]) -> f64 {
    if rounds.len() < 2 {
        return 0.0;
    }
    let leaks = rounds
        .windows(2)
        .filter(|pair| pair[0].is_advantage() && pair[1].is_disadvantage())
        .count();
    leaks as f64 / (rounds.len() - 1) as f64 * 100.0
}

pub fn calculate_pace_deviation(rounds: &[RoundRecord]) -> f64 {
    let rates: Vec<f64> = rounds.iter().map(RoundRecord::headshot_rate).collect();
    population_variance(&rates).sqrt()
}
