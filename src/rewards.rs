use crate::error::Result;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Payout for one competitor's school after a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub funds: u64,
    pub reputation: u32,
    pub experience: u32,
}

impl Reward {
    /// Unscaled payout for a match type
    pub fn base(match_type: MatchType) -> Self {
        let (funds, reputation, experience) = match match_type {
            MatchType::Practice => (1_000, 2, 10),
            MatchType::PrefecturePreliminary => (5_000, 10, 30),
            MatchType::PrefectureMain => (10_000, 20, 50),
            MatchType::Regional => (20_000, 40, 80),
            MatchType::National => (50_000, 100, 150),
        };
        Self { funds, reputation, experience }
    }
}

pub struct RewardCalculator;

impl RewardCalculator {
    /// Base payout scaled by outcome (win ×1.5, draw ×1.0, lose ×0.5), floored
    pub fn calculate(match_type: MatchType, outcome: MatchOutcome) -> Reward {
        let base = Reward::base(match_type);
        let multiplier = outcome.reward_multiplier();
        Reward {
            funds: (base.funds as f64 * multiplier).floor() as u64,
            reputation: (base.reputation as f64 * multiplier).floor() as u32,
            experience: (base.experience as f64 * multiplier).floor() as u32,
        }
    }

    pub fn calculate_key(match_type: &str, outcome: MatchOutcome) -> Result<Reward> {
        Ok(Self::calculate(match_type.parse()?, outcome))
    }

    /// Rewards for (A, B) from a finished match
    pub fn for_match(state: &MatchState) -> (Reward, Reward) {
        (
            Self::calculate(state.match_type, MatchOutcome::for_side(state, Side::A)),
            Self::calculate(state.match_type, MatchOutcome::for_side(state, Side::B)),
        )
    }
}
