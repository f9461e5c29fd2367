use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two competitors in a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Day-to-day form of a competitor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Condition {
    Terrible,
    Poor,
    Normal,
    Good,
    Excellent,
}

impl Condition {
    /// Strength multiplier applied to the attribute total
    pub fn multiplier(&self) -> f64 {
        match self {
            Condition::Excellent => 1.2,
            Condition::Good => 1.1,
            Condition::Normal => 1.0,
            Condition::Poor => 0.9,
            Condition::Terrible => 0.8,
        }
    }
}

impl FromStr for Condition {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "terrible" => Ok(Condition::Terrible),
            "poor" => Ok(Condition::Poor),
            "normal" => Ok(Condition::Normal),
            "good" => Ok(Condition::Good),
            "excellent" => Ok(Condition::Excellent),
            other => Err(EngineError::UnknownCondition(other.to_string())),
        }
    }
}

impl TryFrom<String> for Condition {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Attribute snapshot of a match participant.
///
/// Owned by the roster; the engine only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub serve: f64,
    #[serde(rename = "return")]
    pub return_skill: f64,
    pub volley: f64,
    pub stroke: f64,
    pub mental: f64,
    pub stamina: f64,
    pub condition: Condition,
    #[serde(default)]
    pub physical_fatigue: f64,
    #[serde(default)]
    pub mental_fatigue: f64,
    #[serde(default)]
    pub matches_played: u32,
}

impl Competitor {
    /// Competitor with all six skills at `value`, normal condition, fresh and inexperienced
    pub fn with_uniform_skill(value: f64) -> Self {
        Self {
            serve: value,
            return_skill: value,
            volley: value,
            stroke: value,
            mental: value,
            stamina: value,
            condition: Condition::Normal,
            physical_fatigue: 0.0,
            mental_fatigue: 0.0,
            matches_played: 0,
        }
    }

    /// Sum of the six skill scalars
    pub fn attribute_total(&self) -> f64 {
        self.serve + self.return_skill + self.volley + self.stroke + self.mental + self.stamina
    }

    /// Shot-making consistency, used for unforced error estimates
    pub fn technique(&self) -> f64 {
        (self.stroke + self.volley) / 2.0
    }

    /// Hitting power, used for winner estimates
    pub fn power(&self) -> f64 {
        (self.serve + self.stroke) / 2.0
    }

    /// Reject non-finite or out-of-range attributes
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("serve", self.serve),
            ("return", self.return_skill),
            ("volley", self.volley),
            ("stroke", self.stroke),
            ("mental", self.mental),
            ("stamina", self.stamina),
            ("physical_fatigue", self.physical_fatigue),
            ("mental_fatigue", self.mental_fatigue),
        ];
        for (field, value) in fields {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(EngineError::InvalidAttribute { field, value });
            }
        }
        Ok(())
    }
}

/// Match-type keys, ordered by increasing stakes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Practice,
    PrefecturePreliminary,
    PrefectureMain,
    Regional,
    National,
}

impl MatchType {
    pub const ALL: [MatchType; 5] = [
        MatchType::Practice,
        MatchType::PrefecturePreliminary,
        MatchType::PrefectureMain,
        MatchType::Regional,
        MatchType::National,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MatchType::Practice => "practice",
            MatchType::PrefecturePreliminary => "prefecture_preliminary",
            MatchType::PrefectureMain => "prefecture_main",
            MatchType::Regional => "regional",
            MatchType::National => "national",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MatchType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        MatchType::ALL
            .into_iter()
            .find(|t| t.key() == s)
            .ok_or_else(|| EngineError::UnknownMatchType(s.to_string()))
    }
}

/// Immutable stakes profile for a match type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfiguration {
    pub match_type: MatchType,
    /// Best-of count (3 or 5)
    pub set_count: u32,
    pub games_to_win_set: u32,
    /// Game count at which a tied set goes to a tiebreak
    pub tiebreak_at: u32,
    pub experience_multiplier: f64,
    pub fatigue_multiplier: f64,
    /// Weight of the mental gap in the win probability model
    pub mental_weight: f64,
}

impl MatchConfiguration {
    pub fn for_match_type(match_type: MatchType) -> Self {
        let (set_count, experience_multiplier, fatigue_multiplier, mental_weight) = match match_type {
            MatchType::Practice => (3, 1.0, 0.8, 0.1),
            MatchType::PrefecturePreliminary => (3, 1.2, 1.0, 0.2),
            MatchType::PrefectureMain => (3, 1.5, 1.2, 0.3),
            MatchType::Regional => (3, 2.0, 1.4, 0.4),
            MatchType::National => (5, 3.0, 1.6, 0.5),
        };

        Self {
            match_type,
            set_count,
            games_to_win_set: 6,
            tiebreak_at: 6,
            experience_multiplier,
            fatigue_multiplier,
            mental_weight,
        }
    }

    /// Resolve a profile by its string key
    pub fn from_key(key: &str) -> Result<Self> {
        Ok(Self::for_match_type(key.parse()?))
    }

    pub fn all() -> Vec<MatchConfiguration> {
        MatchType::ALL.into_iter().map(Self::for_match_type).collect()
    }

    /// Reject profiles under which the set and match loops cannot produce a valid result
    pub fn validate(&self) -> Result<()> {
        let reason = if self.set_count % 2 == 0 {
            Some("set_count must be odd and at least 1")
        } else if self.games_to_win_set == 0 {
            Some("games_to_win_set must be at least 1")
        } else if self.tiebreak_at < self.games_to_win_set {
            Some("tiebreak_at must not be below games_to_win_set")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(EngineError::InvalidConfiguration {
                match_type: self.match_type.key().to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Sets needed to take the match, ⌈set_count / 2⌉
    pub fn sets_to_win(&self) -> u32 {
        (self.set_count + 1) / 2
    }
}

/// Points tally for the game (or tiebreak) in progress
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePoint {
    pub points_a: u32,
    pub points_b: u32,
    /// Server of the game, or of the first point of a tiebreak
    pub server: Side,
}

impl GamePoint {
    pub fn new(server: Side) -> Self {
        Self {
            points_a: 0,
            points_b: 0,
            server,
        }
    }

    pub fn record(&mut self, winner: Side) {
        match winner {
            Side::A => self.points_a += 1,
            Side::B => self.points_b += 1,
        }
    }

    pub fn points_played(&self) -> u32 {
        self.points_a + self.points_b
    }

    /// Side that has at least `min_points` and leads by two, if any
    pub fn leader(&self, min_points: u32) -> Option<Side> {
        if self.points_a >= min_points && self.points_a >= self.points_b + 2 {
            Some(Side::A)
        } else if self.points_b >= min_points && self.points_b >= self.points_a + 2 {
            Some(Side::B)
        } else {
            None
        }
    }
}

/// Final points of a tiebreak
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakScore {
    pub points_a: u32,
    pub points_b: u32,
}

impl TiebreakScore {
    pub fn winner(&self) -> Side {
        if self.points_a > self.points_b {
            Side::A
        } else {
            Side::B
        }
    }
}

/// Games of one set; a decided tiebreak is counted as a game for its winner
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSet {
    pub games_a: u32,
    pub games_b: u32,
    pub tiebreak: Option<TiebreakScore>,
    /// Estimated duration in minutes
    pub duration_minutes: f64,
}

impl GameSet {
    pub fn games(&self, side: Side) -> u32 {
        match side {
            Side::A => self.games_a,
            Side::B => self.games_b,
        }
    }

    pub fn total_games(&self) -> u32 {
        self.games_a + self.games_b
    }

    /// Set owner; the tiebreak decides when one was played
    pub fn winner(&self) -> Option<Side> {
        if let Some(tiebreak) = &self.tiebreak {
            return Some(tiebreak.winner());
        }
        if self.games_a > self.games_b {
            Some(Side::A)
        } else if self.games_b > self.games_a {
            Some(Side::B)
        } else {
            None
        }
    }
}

/// Point counters recorded while the match is played
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTally {
    pub points_won_a: u32,
    pub points_won_b: u32,
    pub service_points_won_a: u32,
    pub service_points_won_b: u32,
    pub tiebreaks_played: u32,
}

impl PointTally {
    pub fn record(&mut self, server: Side, winner: Side) {
        match winner {
            Side::A => self.points_won_a += 1,
            Side::B => self.points_won_b += 1,
        }
        if server == winner {
            match winner {
                Side::A => self.service_points_won_a += 1,
                Side::B => self.service_points_won_b += 1,
            }
        }
    }

    pub fn total_points(&self) -> u32 {
        self.points_won_a + self.points_won_b
    }

    pub fn points_won(&self, side: Side) -> u32 {
        match side {
            Side::A => self.points_won_a,
            Side::B => self.points_won_b,
        }
    }
}

/// Aggregate result of a simulated match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub match_type: MatchType,
    pub sets: Vec<GameSet>,
    pub is_finished: bool,
    pub winner: Option<Side>,
    /// Cumulative estimated duration in minutes
    pub duration_minutes: f64,
    pub tally: PointTally,
}

impl MatchState {
    pub fn new(match_type: MatchType) -> Self {
        Self {
            match_type,
            sets: Vec::new(),
            is_finished: false,
            winner: None,
            duration_minutes: 0.0,
            tally: PointTally::default(),
        }
    }

    pub fn sets_won(&self, side: Side) -> u32 {
        self.sets.iter().filter(|s| s.winner() == Some(side)).count() as u32
    }

    pub fn total_games(&self) -> u32 {
        self.sets.iter().map(GameSet::total_games).sum()
    }
}

/// Match result from one competitor's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Draw,
    Lose,
}

impl MatchOutcome {
    pub fn reward_multiplier(&self) -> f64 {
        match self {
            MatchOutcome::Win => 1.5,
            MatchOutcome::Draw => 1.0,
            MatchOutcome::Lose => 0.5,
        }
    }

    /// Outcome for `side`; an unfinished match counts as a draw
    pub fn for_side(state: &MatchState, side: Side) -> Self {
        match state.winner {
            Some(winner) if winner == side => MatchOutcome::Win,
            Some(_) => MatchOutcome::Lose,
            None => MatchOutcome::Draw,
        }
    }
}

impl FromStr for MatchOutcome {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "win" => Ok(MatchOutcome::Win),
            "draw" => Ok(MatchOutcome::Draw),
            "lose" => Ok(MatchOutcome::Lose),
            other => Err(EngineError::UnknownOutcome(other.to_string())),
        }
    }
}

/// Engine-level safety limits
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard cap on points simulated in one match
    pub max_points_per_match: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_points_per_match: 20_000,
        }
    }
}
