use crate::error::{EngineError, Result};
use crate::probability::WinProbabilityModel;
use crate::types::*;
use rand::Rng;

/// Fixed part of a game's estimated duration (minutes)
pub const GAME_BASE_MINUTES: f64 = 5.0;
/// Added per point played (minutes)
pub const MINUTES_PER_POINT: f64 = 0.5;
/// Points needed to take a regular game
pub const GAME_POINTS_TO_WIN: u32 = 4;
/// Points needed to take a tiebreak
pub const TIEBREAK_POINTS_TO_WIN: u32 = 7;

/// Uniform draws in [0, 1).
///
/// Every simulator takes its randomness through this trait so runs can be seeded
/// and replayed.
pub trait RandomSource {
    fn next_float(&mut self) -> f64;
}

impl<R: Rng> RandomSource for R {
    fn next_float(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// One Bernoulli trial per point, with the serve advantage baked in
#[derive(Clone, Copy, Debug)]
pub struct PointSimulator {
    serve_win_a: f64,
    serve_win_b: f64,
}

impl PointSimulator {
    pub fn new(a: &Competitor, b: &Competitor, config: &MatchConfiguration) -> Self {
        Self {
            serve_win_a: WinProbabilityModel::serve_probability(a, b, config, Side::A),
            serve_win_b: WinProbabilityModel::serve_probability(a, b, config, Side::B),
        }
    }

    pub fn server_win_probability(&self, server: Side) -> f64 {
        match server {
            Side::A => self.serve_win_a,
            Side::B => self.serve_win_b,
        }
    }

    /// Winner of a single point served by `server`
    pub fn play<R: RandomSource + ?Sized>(&self, server: Side, rng: &mut R) -> Side {
        if rng.next_float() < self.server_win_probability(server) {
            server
        } else {
            server.opponent()
        }
    }
}

/// Standalone point draw for callers that do not run a whole match
pub fn simulate_point<R: RandomSource + ?Sized>(
    a: &Competitor,
    b: &Competitor,
    config: &MatchConfiguration,
    server: Side,
    rng: &mut R,
) -> Side {
    PointSimulator::new(a, b, config).play(server, rng)
}

/// Result of one regular game
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameOutcome {
    pub winner: Side,
    pub score: GamePoint,
    pub duration_minutes: f64,
}

fn estimated_minutes(points_played: u32) -> f64 {
    GAME_BASE_MINUTES + MINUTES_PER_POINT * points_played as f64
}

/// State threaded through the nested loops of one match
pub(crate) struct Rally<'r, R: RandomSource + ?Sized> {
    points: PointSimulator,
    rng: &'r mut R,
    tally: PointTally,
    points_left: u32,
    limit: u32,
}

impl<'r, R: RandomSource + ?Sized> Rally<'r, R> {
    pub(crate) fn new(points: PointSimulator, rng: &'r mut R, limit: u32) -> Self {
        Self {
            points,
            rng,
            tally: PointTally::default(),
            points_left: limit,
            limit,
        }
    }

    fn play_point(&mut self, server: Side) -> Result<Side> {
        if self.points_left == 0 {
            log::warn!("Point limit of {} reached before the match resolved", self.limit);
            return Err(EngineError::SimulationLimitExceeded { limit: self.limit });
        }
        self.points_left -= 1;

        let winner = self.points.play(server, &mut *self.rng);
        self.tally.record(server, winner);
        Ok(winner)
    }

    /// Play points with a fixed server until someone has 4+ and leads by 2
    pub(crate) fn play_game(&mut self, server: Side) -> Result<GameOutcome> {
        let mut score = GamePoint::new(server);
        loop {
            let winner = self.play_point(score.server)?;
            score.record(winner);
            if let Some(winner) = score.leader(GAME_POINTS_TO_WIN) {
                return Ok(GameOutcome {
                    winner,
                    score,
                    duration_minutes: estimated_minutes(score.points_played()),
                });
            }
        }
    }

    /// First to 7 with a lead of 2; `first_server` serves once, then serve changes every two points
    pub(crate) fn play_tiebreak(&mut self, first_server: Side) -> Result<(TiebreakScore, f64)> {
        let mut score = GamePoint::new(first_server);
        self.tally.tiebreaks_played += 1;
        loop {
            let index = score.points_played();
            let server = if ((index + 1) / 2) % 2 == 0 {
                score.server
            } else {
                score.server.opponent()
            };
            let winner = self.play_point(server)?;
            score.record(winner);
            if score.leader(TIEBREAK_POINTS_TO_WIN).is_some() {
                log::trace!("Tiebreak decided {}-{}", score.points_a, score.points_b);
                let tiebreak = TiebreakScore {
                    points_a: score.points_a,
                    points_b: score.points_b,
                };
                return Ok((tiebreak, estimated_minutes(score.points_played())));
            }
        }
    }

    /// Play games, alternating serve, until the set is won outright or by tiebreak
    pub(crate) fn play_set(&mut self, config: &MatchConfiguration, first_server: Side) -> Result<GameSet> {
        let mut set = GameSet::default();
        let mut server = first_server;

        loop {
            let game = self.play_game(server)?;
            match game.winner {
                Side::A => set.games_a += 1,
                Side::B => set.games_b += 1,
            }
            set.duration_minutes += game.duration_minutes;
            server = server.opponent();

            let leader = [Side::A, Side::B].into_iter().find(|&side| {
                set.games(side) >= config.games_to_win_set
                    && set.games(side) >= set.games(side.opponent()) + 2
            });
            if leader.is_some() {
                return Ok(set);
            }

            if set.games_a == config.tiebreak_at && set.games_b == config.tiebreak_at {
                let (tiebreak, minutes) = self.play_tiebreak(server)?;
                match tiebreak.winner() {
                    Side::A => set.games_a += 1,
                    Side::B => set.games_b += 1,
                }
                set.tiebreak = Some(tiebreak);
                set.duration_minutes += minutes;
                return Ok(set);
            }
        }
    }
}

/// Plays whole matches. Holds only the safety limits, so one instance can serve
/// any number of concurrent callers that each bring their own random source.
#[derive(Clone, Debug, Default)]
pub struct MatchSimulator {
    config: EngineConfig,
}

impl MatchSimulator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulate a match by match-type key
    pub fn simulate_key<R: RandomSource + ?Sized>(
        &self,
        a: &Competitor,
        b: &Competitor,
        match_type: &str,
        rng: &mut R,
    ) -> Result<MatchState> {
        let config = MatchConfiguration::from_key(match_type)?;
        self.simulate(a, b, &config, rng)
    }

    /// Play sets, alternating the first server, until one side takes ⌈set_count/2⌉
    pub fn simulate<R: RandomSource + ?Sized>(
        &self,
        a: &Competitor,
        b: &Competitor,
        config: &MatchConfiguration,
        rng: &mut R,
    ) -> Result<MatchState> {
        config.validate()?;
        a.validate()?;
        b.validate()?;

        let mut rally = Rally::new(
            PointSimulator::new(a, b, config),
            rng,
            self.config.max_points_per_match,
        );
        let mut state = MatchState::new(config.match_type);
        let target = config.sets_to_win();
        let mut first_server = Side::A;

        while !state.is_finished {
            let set = rally.play_set(config, first_server)?;
            log::debug!(
                "{} set {}: {}-{} ({:.1} min)",
                config.match_type,
                state.sets.len() + 1,
                set.games_a,
                set.games_b,
                set.duration_minutes
            );
            state.duration_minutes += set.duration_minutes;
            state.sets.push(set);
            first_server = first_server.opponent();

            if let Some(winner) = [Side::A, Side::B]
                .into_iter()
                .find(|&side| state.sets_won(side) >= target)
            {
                state.winner = Some(winner);
                state.is_finished = true;
            }
        }

        state.tally = rally.tally;
        log::debug!(
            "{} match finished: {:?} wins {}-{} after {} points",
            config.match_type,
            state.winner,
            state.sets_won(Side::A),
            state.sets_won(Side::B),
            state.tally.total_points()
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn practice() -> MatchConfiguration {
        MatchConfiguration::for_match_type(MatchType::Practice)
    }

    fn even_points() -> PointSimulator {
        let a = Competitor::with_uniform_skill(50.0);
        let b = Competitor::with_uniform_skill(50.0);
        PointSimulator::new(&a, &b, &practice())
    }

    /// Server wins every point for the first `holds` draws, then hands over to a seeded rng
    struct HoldServe {
        holds: usize,
        fallback: StdRng,
    }

    impl RandomSource for HoldServe {
        fn next_float(&mut self) -> f64 {
            if self.holds > 0 {
                self.holds -= 1;
                0.55
            } else {
                self.fallback.gen()
            }
        }
    }

    fn assert_match_invariants(state: &MatchState, config: &MatchConfiguration) {
        assert!(state.is_finished);
        let winner = state.winner.expect("finished match has a winner");
        assert_eq!(state.sets_won(winner), config.sets_to_win());
        assert!(state.sets_won(winner.opponent()) < config.sets_to_win());

        for set in &state.sets {
            let set_winner = set.winner().expect("every set has a winner");
            match &set.tiebreak {
                Some(tiebreak) => {
                    assert_eq!(set.games(set_winner), config.tiebreak_at + 1);
                    assert_eq!(set.games(set_winner.opponent()), config.tiebreak_at);
                    let (won, lost) = match set_winner {
                        Side::A => (tiebreak.points_a, tiebreak.points_b),
                        Side::B => (tiebreak.points_b, tiebreak.points_a),
                    };
                    assert!(won >= TIEBREAK_POINTS_TO_WIN && won >= lost + 2);
                }
                None => {
                    assert!(set.games(set_winner) >= config.games_to_win_set);
                    assert!(set.games(set_winner) >= set.games(set_winner.opponent()) + 2);
                }
            }
        }

        let summed: f64 = state.sets.iter().map(|s| s.duration_minutes).sum();
        assert!((state.duration_minutes - summed).abs() < 1e-9);
    }

    #[test]
    fn test_point_follows_serve_probability() {
        let points = even_points();
        let mut low = HoldServe { holds: 1, fallback: StdRng::seed_from_u64(0) };
        assert_eq!(points.play(Side::B, &mut low), Side::B);

        let a = Competitor::with_uniform_skill(50.0);
        let mut high = StdRng::seed_from_u64(1);
        let mut receiver_wins = 0;
        for _ in 0..2000 {
            if simulate_point(&a, &a, &practice(), Side::A, &mut high) == Side::B {
                receiver_wins += 1;
            }
        }
        // 40% expected
        assert!((600..1000).contains(&receiver_wins));
    }

    #[test]
    fn test_game_termination_invariant() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut rally = Rally::new(even_points(), &mut rng, u32::MAX);

        for i in 0..500 {
            let server = if i % 2 == 0 { Side::A } else { Side::B };
            let game = rally.play_game(server).unwrap();
            let (won, lost) = match game.winner {
                Side::A => (game.score.points_a, game.score.points_b),
                Side::B => (game.score.points_b, game.score.points_a),
            };
            assert!(won >= GAME_POINTS_TO_WIN);
            assert!(won >= lost + 2);
            assert_eq!(
                game.duration_minutes,
                GAME_BASE_MINUTES + MINUTES_PER_POINT * game.score.points_played() as f64
            );
        }
    }

    #[test]
    fn test_love_game_duration() {
        let mut source = HoldServe { holds: 4, fallback: StdRng::seed_from_u64(0) };
        let mut rally = Rally::new(even_points(), &mut source, u32::MAX);
        let game = rally.play_game(Side::A).unwrap();
        assert_eq!(game.winner, Side::A);
        assert_eq!((game.score.points_a, game.score.points_b), (4, 0));
        assert_eq!(game.duration_minutes, 7.0);
    }

    #[test]
    fn test_tiebreak_triggered_at_six_all() {
        // 12 held games at 4 points each reach 6-6
        let mut source = HoldServe { holds: 48, fallback: StdRng::seed_from_u64(99) };
        let config = practice();
        let mut rally = Rally::new(even_points(), &mut source, u32::MAX);

        let set = rally.play_set(&config, Side::A).unwrap();
        let tiebreak = set.tiebreak.expect("6-6 goes to a tiebreak");
        assert_eq!(set.winner(), Some(tiebreak.winner()));
        assert_eq!(set.total_games(), 13);
        assert_eq!(set.games(tiebreak.winner()), 7);

        let (won, lost) = match tiebreak.winner() {
            Side::A => (tiebreak.points_a, tiebreak.points_b),
            Side::B => (tiebreak.points_b, tiebreak.points_a),
        };
        assert!(won >= 7 && won >= lost + 2);
        assert_eq!(rally.tally.tiebreaks_played, 1);
    }

    #[test]
    fn test_tiebreak_serve_rotation() {
        // Every server holds: the first server takes points 1, 4, 5, 8, 9, ...
        let mut source = HoldServe { holds: 5, fallback: StdRng::seed_from_u64(0) };
        let mut rally = Rally::new(even_points(), &mut source, 5);
        let err = rally.play_tiebreak(Side::B).unwrap_err();
        assert_eq!(err, EngineError::SimulationLimitExceeded { limit: 5 });
        assert_eq!(rally.tally.points_won_b, 3);
        assert_eq!(rally.tally.points_won_a, 2);
    }

    #[test]
    fn test_point_limit_stops_endless_tiebreak() {
        let mut source = HoldServe { holds: usize::MAX, fallback: StdRng::seed_from_u64(0) };
        let simulator = MatchSimulator::new(EngineConfig { max_points_per_match: 1000 });
        let a = Competitor::with_uniform_skill(50.0);

        let result = simulator.simulate(&a, &a, &practice(), &mut source);
        assert_eq!(result, Err(EngineError::SimulationLimitExceeded { limit: 1000 }));
    }

    #[test]
    fn test_even_practice_match_is_clean_best_of_three() {
        let a = Competitor::with_uniform_skill(50.0);
        let b = Competitor::with_uniform_skill(50.0);
        let config = practice();
        let simulator = MatchSimulator::default();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let state = simulator.simulate(&a, &b, &config, &mut rng).unwrap();
            assert!((2..=3).contains(&state.sets.len()));
            assert_match_invariants(&state, &config);
            assert_eq!(
                state.tally.points_won_a + state.tally.points_won_b,
                state.tally.total_points()
            );
        }
    }

    #[test]
    fn test_national_match_is_best_of_five() {
        let a = Competitor::with_uniform_skill(70.0);
        let b = Competitor::with_uniform_skill(60.0);
        let config = MatchConfiguration::for_match_type(MatchType::National);
        let mut rng = StdRng::seed_from_u64(3);

        let state = MatchSimulator::default().simulate(&a, &b, &config, &mut rng).unwrap();
        assert!((3..=5).contains(&state.sets.len()));
        assert_match_invariants(&state, &config);
    }

    #[test]
    fn test_seeded_replay_is_identical() {
        let a = Competitor::with_uniform_skill(65.0);
        let mut b = Competitor::with_uniform_skill(60.0);
        b.condition = Condition::Good;
        let simulator = MatchSimulator::default();

        let first = simulator
            .simulate_key(&a, &b, "regional", &mut StdRng::seed_from_u64(2024))
            .unwrap();
        let second = simulator
            .simulate_key(&a, &b, "regional", &mut StdRng::seed_from_u64(2024))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_inputs_fail_fast() {
        let a = Competitor::with_uniform_skill(50.0);
        let mut b = Competitor::with_uniform_skill(50.0);
        let simulator = MatchSimulator::default();
        let mut rng = StdRng::seed_from_u64(0);

        let err = simulator.simulate_key(&a, &b, "exhibition", &mut rng).unwrap_err();
        assert!(err.is_configuration());

        b.serve = 120.0;
        let err = simulator.simulate_key(&a, &b, "practice", &mut rng).unwrap_err();
        assert_eq!(err, EngineError::InvalidAttribute { field: "serve", value: 120.0 });
    }

    #[test]
    fn test_inconsistent_profile_is_rejected_before_play() {
        let a = Competitor::with_uniform_skill(10.0);
        let b = Competitor::with_uniform_skill(100.0);
        let simulator = MatchSimulator::default();

        for set_count in [0, 2] {
            let config = MatchConfiguration { set_count, ..practice() };
            for seed in 0..20 {
                let mut rng = StdRng::seed_from_u64(seed);
                let err = simulator.simulate(&a, &b, &config, &mut rng).unwrap_err();
                assert!(err.is_configuration());
            }
        }

        let config = MatchConfiguration { tiebreak_at: 5, ..practice() };
        let mut rng = StdRng::seed_from_u64(0);
        let err = simulator.simulate(&a, &b, &config, &mut rng).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidConfiguration {
                match_type: "practice".to_string(),
                reason: "tiebreak_at must not be below games_to_win_set",
            }
        );
    }

    #[test]
    fn test_single_set_profile_is_decided_by_one_set() {
        let a = Competitor::with_uniform_skill(10.0);
        let b = Competitor::with_uniform_skill(100.0);
        let config = MatchConfiguration { set_count: 1, ..practice() };

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let state = MatchSimulator::default().simulate(&a, &b, &config, &mut rng).unwrap();
            assert_eq!(state.sets.len(), 1);
            assert_eq!(state.winner, state.sets[0].winner());
            assert_match_invariants(&state, &config);
        }
    }

    #[test]
    fn test_stronger_competitor_usually_wins() {
        let a = Competitor::with_uniform_skill(90.0);
        let b = Competitor::with_uniform_skill(30.0);
        let simulator = MatchSimulator::default();
        let config = practice();

        let wins = (0..40)
            .filter(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                simulator.simulate(&a, &b, &config, &mut rng).unwrap().winner == Some(Side::A)
            })
            .count();
        assert!(wins >= 36);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_match_termination_invariant(
            seed in any::<u64>(),
            skill_a in 0.0f64..=100.0,
            skill_b in 0.0f64..=100.0,
            type_index in 0usize..5,
        ) {
            let a = Competitor::with_uniform_skill(skill_a);
            let b = Competitor::with_uniform_skill(skill_b);
            let config = MatchConfiguration::for_match_type(MatchType::ALL[type_index]);
            let mut rng = StdRng::seed_from_u64(seed);

            let state = MatchSimulator::default().simulate(&a, &b, &config, &mut rng).unwrap();
            let winner = state.winner.unwrap();
            prop_assert!(state.is_finished);
            prop_assert_eq!(state.sets_won(winner), config.sets_to_win());
            prop_assert!(state.sets_won(winner.opponent()) < state.sets_won(winner));
        }
    }
}
