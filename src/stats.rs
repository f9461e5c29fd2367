use crate::types::*;
use serde::{Deserialize, Serialize};

/// Approximate shot counters for one side
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStatistics {
    pub sets_won: u32,
    pub aces: u32,
    pub winners: u32,
    pub unforced_errors: u32,
}

/// Post-match summary.
///
/// Shot counters are back-calculated from final attributes and aggregate totals; the
/// simulator never records individual shots. Live point counts live in
/// [`MatchState::tally`] and are copied here untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchStatistics {
    pub total_games: u32,
    pub duration_minutes: f64,
    pub side_a: SideStatistics,
    pub side_b: SideStatistics,
    pub tally: PointTally,
}

impl MatchStatistics {
    pub fn side(&self, side: Side) -> &SideStatistics {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

pub struct StatisticsAggregator;

impl StatisticsAggregator {
    pub fn aggregate(state: &MatchState, a: &Competitor, b: &Competitor) -> MatchStatistics {
        let total_games = state.total_games();
        MatchStatistics {
            total_games,
            duration_minutes: state.duration_minutes,
            side_a: Self::derive_side(state, Side::A, a, total_games),
            side_b: Self::derive_side(state, Side::B, b, total_games),
            tally: state.tally,
        }
    }

    fn derive_side(state: &MatchState, side: Side, competitor: &Competitor, total_games: u32) -> SideStatistics {
        let games = total_games as f64;
        let aces = competitor.serve / 20.0 * state.duration_minutes / 60.0;
        let unforced_errors = (100.0 - competitor.technique()) / 10.0 * games / 10.0;
        let winners = competitor.power() / 15.0 * games / 8.0;

        SideStatistics {
            sets_won: state.sets_won(side),
            aces: floor_count(aces),
            winners: floor_count(winners),
            unforced_errors: floor_count(unforced_errors),
        }
    }
}

fn floor_count(value: f64) -> u32 {
    value.max(0.0).floor() as u32
}
