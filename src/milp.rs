//! Binary covering programs and the backends that solve them.
//!
//! A [`CoverModel`] is "minimize Σ wᵢ·xᵢ subject to Σ_{i ∈ C} xᵢ ≥ 1 for every
//! covering list C, xᵢ ∈ {0, 1}". Backends are plain values handed to the
//! caller; there is no process-wide solver handle.

use std::time::{Duration, Instant};

use good_lp::{
    microlp, variable, variables, Expression, ResolutionError, Solution, SolutionStatus, SolverModel, Variable,
    WithInitialSolution, WithTimeLimit,
};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CoverModel {
    weights: Vec<f64>,
    constraints: Vec<Vec<usize>>,
    incumbent: Option<Vec<bool>>,
}

impl CoverModel {
    /// Cardinality objective: every variable weighs 1.
    pub fn unit(num_variables: usize, constraints: Vec<Vec<usize>>) -> CoverModel {
        CoverModel::weighted(vec![1.0; num_variables], constraints)
    }

    /// Panics on a negative or non-finite weight, an out-of-range variable,
    /// or a variable listed twice in one constraint.
    pub fn weighted(weights: Vec<f64>, constraints: Vec<Vec<usize>>) -> CoverModel {
        for (i, weight) in weights.iter().enumerate() {
            assert!(weight.is_finite() && *weight >= 0.0, "variable {i} has invalid weight {weight}");
        }
        let mut seen = vec![false; weights.len()];
        for (row, covering) in constraints.iter().enumerate() {
            for &var in covering {
                assert!(var < weights.len(), "constraint {row} references unknown variable {var}");
                assert!(!seen[var], "constraint {row} lists variable {var} twice");
                seen[var] = true;
            }
            for &var in covering {
                seen[var] = false;
            }
        }
        CoverModel { weights, constraints, incumbent: None }
    }

    /// Attaches a known feasible assignment. Panics if it is not one.
    pub fn with_incumbent(mut self, incumbent: Vec<bool>) -> CoverModel {
        assert_eq!(incumbent.len(), self.weights.len(), "incumbent length must match variable count");
        assert!(self.is_satisfied_by(&incumbent), "incumbent leaves a constraint uncovered");
        self.incumbent = Some(incumbent);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.weights.len()
    }
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
    pub fn constraints(&self) -> &[Vec<usize>] {
        &self.constraints
    }
    pub fn incumbent(&self) -> Option<&[bool]> {
        self.incumbent.as_deref()
    }

    pub fn objective_of(&self, assignment: &[bool]) -> f64 {
        self.weights
            .iter()
            .zip(assignment)
            .filter(|&(_, &chosen)| chosen)
            .map(|(weight, _)| weight)
            .sum()
    }

    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        self.constraints
            .iter()
            .all(|covering| covering.iter().any(|&var| assignment.get(var).copied().unwrap_or(false)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MilpStatus {
    Optimal,
    /// Valid assignment, optimality not proven (usually the budget ran out).
    Feasible,
    Infeasible,
    Unbounded,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilpOutcome {
    pub status: MilpStatus,
    pub assignment: Option<Vec<bool>>,
    pub objective: Option<f64>,
    pub message: Option<String>,
}

impl MilpOutcome {
    pub fn solved(status: MilpStatus, model: &CoverModel, assignment: Vec<bool>) -> MilpOutcome {
        MilpOutcome {
            status,
            objective: Some(model.objective_of(&assignment)),
            assignment: Some(assignment),
            message: None,
        }
    }

    pub fn failed(status: MilpStatus, message: impl Into<String>) -> MilpOutcome {
        MilpOutcome { status, assignment: None, objective: None, message: Some(message.into()) }
    }
}

/// `(model, time_budget) -> outcome`. Implementations must return once the
/// budget has elapsed, with the best assignment they hold if any.
pub trait MilpBackend {
    fn solve(&self, model: &CoverModel, time_budget: Duration) -> MilpOutcome;
}

impl<B: MilpBackend + ?Sized> MilpBackend for &B {
    fn solve(&self, model: &CoverModel, time_budget: Duration) -> MilpOutcome {
        (**self).solve(model, time_budget)
    }
}

/// `good_lp` with the pure-Rust `microlp` branch and bound.
///
/// The search runs on the calling thread under microlp's own time limit and
/// is seeded with the model's incumbent. When the limit stops the search, the
/// better of microlp's best assignment and the incumbent comes back as
/// `Feasible`. Without either the result is `Error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MilpBackend for MicroLpBackend {
    fn solve(&self, model: &CoverModel, time_budget: Duration) -> MilpOutcome {
        let deadline = Instant::now().checked_add(time_budget);
        if model.constraints().iter().any(Vec::is_empty) {
            return MilpOutcome::failed(MilpStatus::Infeasible, "a constraint has no covering variable");
        }
        if model.constraints().is_empty() {
            return MilpOutcome::solved(MilpStatus::Optimal, model, vec![false; model.num_variables()]);
        }

        let mut vars = variables!();
        let xs: Vec<Variable> = (0..model.num_variables()).map(|_| vars.add(variable().binary())).collect();

        let mut objective = Expression::with_capacity(xs.len());
        for (&x, &weight) in xs.iter().zip(model.weights()) {
            objective.add_mul(weight, x);
        }
        let mut problem = vars.minimise(objective).using(microlp);
        for covering in model.constraints() {
            let mut row = Expression::with_capacity(covering.len());
            for &var in covering {
                row.add_mul(1.0, xs[var]);
            }
            problem.add_constraint(row.geq(1.0));
        }
        if let Some(incumbent) = model.incumbent() {
            let start = xs.iter().zip(incumbent).map(|(&x, &chosen)| (x, if chosen { 1.0 } else { 0.0 }));
            problem = problem.with_initial_solution(start);
        }
        let remaining = deadline.map_or(time_budget, |deadline| deadline.saturating_duration_since(Instant::now()));
        let problem = problem.with_time_limit(remaining.as_secs_f64());

        debug!(variables = xs.len(), constraints = model.constraints().len(), budget = ?remaining, "solving with microlp");
        match problem.solve() {
            Ok(solution) => {
                let assignment: Vec<bool> = xs.iter().map(|&x| solution.value(x) > 0.5).collect();
                match solution.status() {
                    SolutionStatus::Optimal => MilpOutcome::solved(MilpStatus::Optimal, model, assignment),
                    SolutionStatus::TimeLimit | SolutionStatus::GapLimit => stopped_early(model, assignment, time_budget),
                }
            }
            Err(ResolutionError::Infeasible) => MilpOutcome::failed(MilpStatus::Infeasible, "model is infeasible"),
            Err(ResolutionError::Unbounded) => MilpOutcome::failed(MilpStatus::Unbounded, "model is unbounded"),
            // microlp reports a limit hit before any feasible point this way
            Err(ResolutionError::Other(reason)) => timed_out(model, time_budget, reason),
            Err(err) => MilpOutcome::failed(MilpStatus::Error, err.to_string()),
        }
    }
}

/// The search stopped on its limit holding `assignment`; keep whichever of it
/// and the incumbent is the cheaper valid cover.
fn stopped_early(model: &CoverModel, assignment: Vec<bool>, time_budget: Duration) -> MilpOutcome {
    let found = model.is_satisfied_by(&assignment).then_some(assignment);
    let best = match (found, model.incumbent()) {
        (Some(found), Some(incumbent)) if model.objective_of(incumbent) < model.objective_of(&found) => {
            incumbent.to_vec()
        }
        (Some(found), _) => found,
        (None, Some(incumbent)) => incumbent.to_vec(),
        (None, None) => return timed_out(model, time_budget, "search stopped without a valid cover"),
    };
    warn!(budget = ?time_budget, objective = model.objective_of(&best), "MILP time budget exhausted");
    MilpOutcome {
        message: Some(format!("time budget of {time_budget:?} exhausted, optimality not proven")),
        ..MilpOutcome::solved(MilpStatus::Feasible, model, best)
    }
}

fn timed_out(model: &CoverModel, time_budget: Duration, reason: &str) -> MilpOutcome {
    warn!(budget = ?time_budget, has_incumbent = model.incumbent().is_some(), reason, "MILP time budget exhausted");
    match model.incumbent() {
        Some(incumbent) => MilpOutcome {
            message: Some(format!("time budget of {time_budget:?} exhausted, returning incumbent")),
            ..MilpOutcome::solved(MilpStatus::Feasible, model, incumbent.to_vec())
        },
        None => MilpOutcome::failed(
            MilpStatus::Error,
            format!("time budget of {time_budget:?} exhausted without a feasible assignment"),
        ),
    }
}
