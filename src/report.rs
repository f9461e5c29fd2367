use crate::error::Result;
use crate::probability::{Odds, WinProbabilityModel};
use crate::progression::{competitor_delta, CompetitorDelta};
use crate::rewards::{Reward, RewardCalculator};
use crate::simulation::{MatchSimulator, RandomSource};
use crate::stats::{MatchStatistics, StatisticsAggregator};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Everything the result screen and the persistence adapter need from one match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub odds: Odds,
    pub state: MatchState,
    pub statistics: MatchStatistics,
    pub reward_a: Reward,
    pub reward_b: Reward,
    pub delta_a: CompetitorDelta,
    pub delta_b: CompetitorDelta,
}

impl MatchReport {
    /// Simulate, then run statistics and payouts once over the finished state
    pub fn run<R: RandomSource + ?Sized>(
        simulator: &MatchSimulator,
        a: &Competitor,
        b: &Competitor,
        config: &MatchConfiguration,
        rng: &mut R,
    ) -> Result<Self> {
        let state = simulator.simulate(a, b, config, rng)?;
        let odds = WinProbabilityModel::odds(a, b, config);
        let statistics = StatisticsAggregator::aggregate(&state, a, b);
        let (reward_a, reward_b) = RewardCalculator::for_match(&state);
        let delta_a = competitor_delta(a, &state, config, &reward_a);
        let delta_b = competitor_delta(b, &state, config, &reward_b);

        Ok(Self {
            odds,
            state,
            statistics,
            reward_a,
            reward_b,
            delta_a,
            delta_b,
        })
    }
}
