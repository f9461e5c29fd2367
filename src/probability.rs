use crate::types::*;
use serde::{Deserialize, Serialize};

/// Floor and ceiling of any win probability; neither side is ever assured or hopeless
pub const MIN_WIN_PROBABILITY: f64 = 0.1;
pub const MAX_WIN_PROBABILITY: f64 = 0.9;

/// Shift applied to the server's point-win chance
pub const SERVE_ADVANTAGE: f64 = 0.1;

/// Pre-match odds for display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub probability_a: f64,
    pub probability_b: f64,
    pub strength_a: f64,
    pub strength_b: f64,
}

/// Converts two competitors plus match context into P(side A wins a point).
///
/// Stateless; every input is an explicit argument.
#[derive(Clone, Copy, Debug, Default)]
pub struct WinProbabilityModel;

impl WinProbabilityModel {
    /// Attribute total after condition, fatigue decay and experience bonus
    pub fn effective_strength(competitor: &Competitor) -> f64 {
        let raw = competitor.attribute_total();
        let condition = competitor.condition.multiplier();
        let fatigue = (1.0 - (competitor.physical_fatigue + competitor.mental_fatigue) / 200.0).max(0.7);
        let experience = 1.0 + (competitor.matches_played as f64 / 100.0).min(0.3);
        raw * condition * fatigue * experience
    }

    /// Final totals for (A, B) once the stakes-weighted mental gap is applied
    fn adjusted_strengths(a: &Competitor, b: &Competitor, config: &MatchConfiguration) -> (f64, f64) {
        let mental_edge = (a.mental - b.mental) * config.mental_weight;
        let strength_a = (Self::effective_strength(a) + mental_edge).max(0.0);
        let strength_b = (Self::effective_strength(b) - mental_edge).max(0.0);
        (strength_a, strength_b)
    }

    /// Probability that side A wins, clamped to [0.1, 0.9]
    pub fn probability(a: &Competitor, b: &Competitor, config: &MatchConfiguration) -> f64 {
        let (strength_a, strength_b) = Self::adjusted_strengths(a, b, config);
        let total = strength_a + strength_b;
        if total <= 0.0 {
            return 0.5;
        }
        (strength_a / total).clamp(MIN_WIN_PROBABILITY, MAX_WIN_PROBABILITY)
    }

    /// Probability that `server` wins a point on their own serve
    pub fn serve_probability(
        a: &Competitor,
        b: &Competitor,
        config: &MatchConfiguration,
        server: Side,
    ) -> f64 {
        let p_a = Self::probability(a, b, config);
        let base = match server {
            Side::A => p_a,
            Side::B => 1.0 - p_a,
        };
        (base + SERVE_ADVANTAGE).clamp(MIN_WIN_PROBABILITY, MAX_WIN_PROBABILITY)
    }

    pub fn odds(a: &Competitor, b: &Competitor, config: &MatchConfiguration) -> Odds {
        let (strength_a, strength_b) = Self::adjusted_strengths(a, b, config);
        let probability_a = Self::probability(a, b, config);
        Odds {
            probability_a,
            probability_b: 1.0 - probability_a,
            strength_a,
            strength_b,
        }
    }
}
