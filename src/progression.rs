use crate::rewards::Reward;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Changes the roster should apply to a competitor after a match.
/// The engine computes them; it never writes them back.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompetitorDelta {
    pub experience: u32,
    pub physical_fatigue: f64,
    pub mental_fatigue: f64,
}

/// Experience scaled by the match profile, plus fatigue earned from time on court
/// (softened by stamina) and games played (softened by mental strength)
pub fn competitor_delta(
    competitor: &Competitor,
    state: &MatchState,
    config: &MatchConfiguration,
    reward: &Reward,
) -> CompetitorDelta {
    let experience = (reward.experience as f64 * config.experience_multiplier).floor() as u32;
    let physical_fatigue = state.duration_minutes / 10.0
        * config.fatigue_multiplier
        * (1.0 - competitor.stamina / 200.0);
    let mental_fatigue = state.total_games() as f64 / 4.0
        * config.fatigue_multiplier
        * (1.0 - competitor.mental / 200.0);

    CompetitorDelta {
        experience,
        physical_fatigue,
        mental_fatigue,
    }
}
