pub mod error;
pub mod probability;
pub mod progression;
pub mod report;
pub mod rewards;
pub mod simulation;
pub mod stats;
pub mod types;

pub use error::EngineError;
pub use probability::{Odds, WinProbabilityModel};
pub use report::MatchReport;
pub use rewards::{Reward, RewardCalculator};
pub use simulation::{MatchSimulator, PointSimulator, RandomSource};
pub use stats::{MatchStatistics, StatisticsAggregator};
pub use types::*;

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

/// Forwards `log` records to the browser console
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    if log::set_logger(&LOGGER).is_ok() {
        #[cfg(feature = "debug")]
        log::set_max_level(log::LevelFilter::Trace);
        #[cfg(not(feature = "debug"))]
        log::set_max_level(log::LevelFilter::Warn);
    }
}

fn parse_competitor(json: &str, label: &str) -> Result<Competitor, JsValue> {
    let competitor: Competitor = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Competitor {} parse error: {}", label, e)))?;
    competitor
        .validate()
        .map_err(|e| JsValue::from_str(&format!("Competitor {}: {}", label, e)))?;
    Ok(competitor)
}

fn parse_configuration(match_type: &str) -> Result<MatchConfiguration, JsValue> {
    MatchConfiguration::from_key(match_type).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// WASM-exposed match engine
#[wasm_bindgen]
pub struct MatchEngine {
    simulator: MatchSimulator,
    rng: StdRng,
}

#[wasm_bindgen]
impl MatchEngine {
    /// Create an engine with default limits
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> MatchEngine {
        MatchEngine {
            simulator: MatchSimulator::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with custom engine limits
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<MatchEngine, JsValue> {
        let config: EngineConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Config parse error: {}", e)))?;
        Ok(MatchEngine {
            simulator: MatchSimulator::new(config),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Create an engine seeded from the browser's `Math.random()`
    pub fn unseeded() -> MatchEngine {
        let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
        MatchEngine::new(seed)
    }

    /// Simulate a match and return the full report as JSON
    pub fn simulate(&mut self, a_json: &str, b_json: &str, match_type: &str) -> Result<String, JsValue> {
        let a = parse_competitor(a_json, "A")?;
        let b = parse_competitor(b_json, "B")?;
        let config = parse_configuration(match_type)?;

        let report = MatchReport::run(&self.simulator, &a, &b, &config, &mut self.rng)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_json(&report)
    }

    /// Simulate with a one-off seed, leaving the engine's own stream untouched
    pub fn simulate_seeded(
        &self,
        a_json: &str,
        b_json: &str,
        match_type: &str,
        seed: u64,
    ) -> Result<String, JsValue> {
        let a = parse_competitor(a_json, "A")?;
        let b = parse_competitor(b_json, "B")?;
        let config = parse_configuration(match_type)?;

        let mut rng = StdRng::seed_from_u64(seed);
        let report = MatchReport::run(&self.simulator, &a, &b, &config, &mut rng)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_json(&report)
    }

    /// Pre-match odds as JSON
    pub fn win_probability(a_json: &str, b_json: &str, match_type: &str) -> Result<String, JsValue> {
        let a = parse_competitor(a_json, "A")?;
        let b = parse_competitor(b_json, "B")?;
        let config = parse_configuration(match_type)?;
        to_json(&WinProbabilityModel::odds(&a, &b, &config))
    }

    /// Reward for a match type and an outcome ("win", "draw", "lose")
    pub fn calculate_reward(match_type: &str, outcome: &str) -> Result<String, JsValue> {
        let outcome: MatchOutcome = outcome
            .parse()
            .map_err(|e: EngineError| JsValue::from_str(&e.to_string()))?;
        let reward = RewardCalculator::calculate_key(match_type, outcome)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_json(&reward)
    }

    /// All five match profiles as JSON
    pub fn get_match_configurations() -> String {
        serde_json::to_string(&MatchConfiguration::all()).unwrap_or_default()
    }

    /// Get default engine config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&EngineConfig::default()).unwrap_or_default()
    }

    /// Current point limit
    pub fn get_max_points(&self) -> u32 {
        self.simulator.config().max_points_per_match
    }
}
