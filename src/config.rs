use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{CoverError, CoverResult};
use crate::exact::ExactSolver;
use crate::franchise::FranchiseMap;
use crate::greedy::{GreedyOutcome, GreedySolver};
use crate::index::CoverageIndex;
use crate::model::franchise::Franchise;
use crate::model::universe::Universe;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    #[serde(default)]
    pub greedy: GreedyConfig,
    #[serde(default)]
    pub exact: ExactConfig,
    #[serde(default)]
    pub franchises: FranchiseConfig,
}

impl SolverConfig {
    pub fn from_toml(source: &str) -> CoverResult<SolverConfig> {
        let config: SolverConfig = toml::from_str(source).map_err(|e| CoverError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoverResult<()> {
        if self.franchises.expected_count < 2 {
            return Err(CoverError::ConfigValidation(format!(
                "franchises.expected_count must be at least 2, got {}",
                self.franchises.expected_count
            )));
        }
        if self.franchises.min_games == 0 {
            return Err(CoverError::ConfigValidation("franchises.min_games must be positive".to_string()));
        }
        if self.exact.time_budget_secs == 0 {
            return Err(CoverError::ConfigValidation("exact.time_budget_secs must be positive".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Greedy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GreedyConfig {
    /// Extra seeded passes on top of the lowest-id pass.
    #[serde(default)]
    pub restarts: usize,
    #[serde(default)]
    pub seed: u64,
}

impl GreedyConfig {
    pub fn run(&self, index: &CoverageIndex, universe: &Universe) -> GreedyOutcome {
        GreedySolver::best_of_restarts(index, universe, self.restarts, self.seed)
    }
}

// ---------------------------------------------------------------------------
// Exact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExactConfig {
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,
    #[serde(default = "default_true")]
    pub warm_start: bool,
}

fn default_time_budget_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for ExactConfig {
    fn default() -> Self {
        ExactConfig { time_budget_secs: default_time_budget_secs(), warm_start: true }
    }
}

impl ExactConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    pub fn solver(&self) -> ExactSolver {
        ExactSolver::new(self.time_budget()).warm_start(self.warm_start)
    }
}

// ---------------------------------------------------------------------------
// Franchises
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FranchiseConfig {
    #[serde(default = "default_expected_count")]
    pub expected_count: usize,
    #[serde(default = "default_current_year")]
    pub current_year: i32,
    #[serde(default = "default_min_games")]
    pub min_games: u32,
}

fn default_expected_count() -> usize {
    30
}

fn default_current_year() -> i32 {
    2024
}

fn default_min_games() -> u32 {
    1
}

impl Default for FranchiseConfig {
    fn default() -> Self {
        FranchiseConfig {
            expected_count: default_expected_count(),
            current_year: default_current_year(),
            min_games: default_min_games(),
        }
    }
}

impl FranchiseConfig {
    /// Whether `current` has the configured number of franchises. A mismatch
    /// is logged, not fatal: the universe is built from whatever is current.
    pub fn check_count(&self, current: &BTreeSet<Franchise>) -> bool {
        let matches = FranchiseMap::validate_franchise_count(current, self.expected_count);
        if !matches {
            warn!(expected = self.expected_count, found = current.len(), "unexpected current franchise count");
        }
        matches
    }
}
