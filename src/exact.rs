use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::greedy::GreedySolver;
use crate::index::CoverageIndex;
use crate::milp::{CoverModel, MicroLpBackend, MilpBackend, MilpOutcome, MilpStatus};
use crate::model::entity::EntityId;
use crate::model::franchise::Pair;
use crate::model::universe::Universe;

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    Error,
}

impl SolveStatus {
    /// A full cover was found, proven minimal or not.
    pub fn is_success(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
    pub fn is_proven_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }
}

impl From<MilpStatus> for SolveStatus {
    fn from(status: MilpStatus) -> Self {
        match status {
            MilpStatus::Optimal => SolveStatus::Optimal,
            MilpStatus::Feasible => SolveStatus::Feasible,
            MilpStatus::Infeasible => SolveStatus::Infeasible,
            MilpStatus::Unbounded => SolveStatus::Unbounded,
            MilpStatus::Error => SolveStatus::Error,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Feasible => "Feasible",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::Error => "Error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactStats {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub pairs_covered: usize,
    pub total_pairs: usize,
    /// Pairs with no covering entity; non-empty only for a structurally infeasible index.
    pub uncoverable: BTreeSet<Pair>,
    pub variables: usize,
    pub constraints: usize,
    pub elapsed: Duration,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactOutcome {
    pub selection: Vec<EntityId>,
    pub stats: ExactStats,
}

/// One binary variable per entity with at least one pair, one row per universe pair.
struct Formulation<'a> {
    entities: Vec<&'a EntityId>,
    rows: Vec<Vec<usize>>,
}

impl<'a> Formulation<'a> {
    fn new(index: &'a CoverageIndex, universe: &Universe) -> Formulation<'a> {
        let mut entities = Vec::new();
        let mut covering: BTreeMap<&Pair, Vec<usize>> = BTreeMap::new();
        for (id, pairs) in index.iter().filter(|(_, pairs)| !pairs.is_empty()) {
            let var = entities.len();
            entities.push(id);
            for pair in pairs {
                covering.entry(pair).or_default().push(var);
            }
        }
        let rows = universe
            .iter()
            .map(|pair| covering.remove(pair).unwrap_or_default())
            .collect();
        Formulation { entities, rows }
    }

    fn assignment_of(&self, selection: &[EntityId]) -> Vec<bool> {
        self.entities.iter().map(|id| selection.contains(id)).collect()
    }

    fn selection_of(&self, assignment: &[bool]) -> Vec<EntityId> {
        self.entities
            .iter()
            .zip(assignment)
            .filter(|&(_, &chosen)| chosen)
            .map(|(id, _)| (*id).clone())
            .collect()
    }
}

/// Minimum-cardinality cover through a MILP backend.
#[derive(Debug, Clone)]
pub struct ExactSolver<B = MicroLpBackend> {
    backend: B,
    time_budget: Duration,
    warm_start: bool,
}

impl ExactSolver<MicroLpBackend> {
    pub fn new(time_budget: Duration) -> ExactSolver<MicroLpBackend> {
        ExactSolver::with_backend(MicroLpBackend, time_budget)
    }
}

impl Default for ExactSolver<MicroLpBackend> {
    fn default() -> Self {
        ExactSolver::new(DEFAULT_TIME_BUDGET)
    }
}

impl<B: MilpBackend> ExactSolver<B> {
    pub fn with_backend(backend: B, time_budget: Duration) -> ExactSolver<B> {
        ExactSolver { backend, time_budget, warm_start: true }
    }

    /// Seed the backend with the greedy cover so an expired budget still
    /// yields a `Feasible` selection.
    pub fn warm_start(mut self, enabled: bool) -> ExactSolver<B> {
        self.warm_start = enabled;
        self
    }

    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    pub fn solve(&self, index: &CoverageIndex, universe: &Universe) -> ExactOutcome {
        self.solve_within(index, universe, self.time_budget)
    }

    pub fn solve_within(&self, index: &CoverageIndex, universe: &Universe, time_budget: Duration) -> ExactOutcome {
        index.assert_within(universe);
        let started = Instant::now();

        let uncoverable = index.uncoverable(universe);
        if !uncoverable.is_empty() {
            warn!(
                uncoverable = uncoverable.len(),
                first = %uncoverable.iter().next().map(ToString::to_string).unwrap_or_default(),
                "instance is infeasible, skipping MILP"
            );
            return ExactOutcome {
                selection: Vec::new(),
                stats: ExactStats {
                    status: SolveStatus::Infeasible,
                    objective: None,
                    pairs_covered: 0,
                    total_pairs: universe.len(),
                    uncoverable,
                    variables: 0,
                    constraints: 0,
                    elapsed: started.elapsed(),
                    message: Some("some pairs have no covering entity".to_string()),
                },
            };
        }

        let mut formulation = Formulation::new(index, universe);
        let rows = std::mem::take(&mut formulation.rows);
        let mut model = CoverModel::unit(formulation.entities.len(), rows);
        if self.warm_start {
            let greedy = GreedySolver::default().solve(index, universe);
            model = model.with_incumbent(formulation.assignment_of(&greedy.selection));
        }
        // the warm start is charged against the same budget
        let remaining = time_budget.saturating_sub(started.elapsed());
        info!(
            variables = model.num_variables(),
            constraints = model.constraints().len(),
            budget = ?remaining,
            "solving exact cover"
        );

        let milp = self.backend.solve(&model, remaining);
        let outcome = package(&formulation, index, universe, &model, milp, started);
        info!(
            status = %outcome.stats.status,
            selected = outcome.selection.len(),
            covered = outcome.stats.pairs_covered,
            total = outcome.stats.total_pairs,
            "exact cover finished"
        );
        outcome
    }
}

fn package(
    formulation: &Formulation<'_>,
    index: &CoverageIndex,
    universe: &Universe,
    model: &CoverModel,
    milp: MilpOutcome,
    started: Instant,
) -> ExactOutcome {
    let mut stats = ExactStats {
        status: milp.status.into(),
        objective: milp.objective,
        pairs_covered: 0,
        total_pairs: universe.len(),
        uncoverable: BTreeSet::new(),
        variables: model.num_variables(),
        constraints: model.constraints().len(),
        elapsed: Duration::ZERO,
        message: milp.message,
    };

    let mut selection = Vec::new();
    if stats.status.is_success() {
        match milp.assignment {
            Some(assignment) if assignment.len() == formulation.entities.len() => {
                selection = formulation.selection_of(&assignment);
                stats.pairs_covered = index.covered_by(&selection).len();
                if stats.pairs_covered != universe.len() {
                    warn!(covered = stats.pairs_covered, total = universe.len(), "backend assignment is not a cover");
                    stats.status = SolveStatus::Error;
                    stats.message = Some(format!(
                        "backend assignment covers {} of {} pairs",
                        stats.pairs_covered,
                        universe.len()
                    ));
                }
            }
            _ => {
                stats.status = SolveStatus::Error;
                stats.message = Some("backend reported success without a usable assignment".to_string());
            }
        }
    }
    if !stats.status.is_success() {
        selection.clear();
        stats.pairs_covered = 0;
        stats.objective = None;
    }

    stats.elapsed = started.elapsed();
    ExactOutcome { selection, stats }
}
