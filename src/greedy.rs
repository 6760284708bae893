use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::index::CoverageIndex;
use crate::model::entity::EntityId;
use crate::model::franchise::Pair;
use crate::model::universe::Universe;

/// How to choose among entities with the same maximal marginal gain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// First maximal entity in index order, i.e. the lowest id.
    #[default]
    LowestId,
    /// Uniformly among the maximal entities, reproducible from the seed.
    Seeded(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreedyStats {
    pub iterations: usize,
    /// Newly covered pairs per iteration, aligned with the selection.
    pub marginal_gains: Vec<usize>,
    /// Pairs no entity could reach once progress stopped.
    pub residual: BTreeSet<Pair>,
    pub pairs_covered: usize,
    pub total_pairs: usize,
    pub elapsed: Duration,
}

impl GreedyStats {
    pub fn is_complete(&self) -> bool {
        self.residual.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreedyOutcome {
    /// Entities in the order they were picked.
    pub selection: Vec<EntityId>,
    pub stats: GreedyStats,
}

#[derive(Debug, Clone, Default)]
pub struct GreedySolver {
    pub tie_break: TieBreak,
}

struct Candidate<'a> {
    id: &'a EntityId,
    gain: usize,
}

impl GreedySolver {
    pub fn new(tie_break: TieBreak) -> GreedySolver {
        GreedySolver { tie_break }
    }

    pub fn solve(&self, index: &CoverageIndex, universe: &Universe) -> GreedyOutcome {
        index.assert_within(universe);
        let started = Instant::now();
        let mut rng = match self.tie_break {
            TieBreak::LowestId => None,
            TieBreak::Seeded(seed) => Some(SmallRng::seed_from_u64(seed)),
        };

        let mut uncovered: BTreeSet<Pair> = universe.pairs().clone();
        let mut selected: BTreeSet<&EntityId> = BTreeSet::new();
        let mut selection = Vec::new();
        let mut marginal_gains = Vec::new();

        while !uncovered.is_empty() {
            let Some(best) = pick_best(index, &uncovered, &selected, rng.as_mut()) else {
                warn!(
                    remaining = uncovered.len(),
                    selected = selection.len(),
                    "no remaining entity covers an uncovered pair"
                );
                break;
            };
            if let Some(pairs) = index.get(best.id) {
                uncovered.retain(|pair| !pairs.contains(pair));
            }
            debug!(
                iteration = selection.len() + 1,
                entity = %best.id,
                gain = best.gain,
                remaining = uncovered.len(),
                "greedy pick"
            );
            selected.insert(best.id);
            selection.push(best.id.clone());
            marginal_gains.push(best.gain);
        }

        let stats = GreedyStats {
            iterations: selection.len(),
            marginal_gains,
            pairs_covered: universe.len() - uncovered.len(),
            total_pairs: universe.len(),
            residual: uncovered,
            elapsed: started.elapsed(),
        };
        info!(
            selected = selection.len(),
            covered = stats.pairs_covered,
            total = stats.total_pairs,
            "greedy cover finished"
        );
        GreedyOutcome { selection, stats }
    }

    /// Runs one lowest-id pass and `restarts` seeded passes, keeping the
    /// smallest selection. Among equal sizes the earliest pass wins.
    pub fn best_of_restarts(
        index: &CoverageIndex,
        universe: &Universe,
        restarts: usize,
        seed: u64,
    ) -> GreedyOutcome {
        let mut best = GreedySolver::new(TieBreak::LowestId).solve(index, universe);
        for restart in 0..restarts as u64 {
            let candidate = GreedySolver::new(TieBreak::Seeded(seed.wrapping_add(restart))).solve(index, universe);
            if is_better(&candidate, &best) {
                debug!(restart, size = candidate.selection.len(), "restart improved greedy cover");
                best = candidate;
            }
        }
        best
    }
}

fn is_better(candidate: &GreedyOutcome, incumbent: &GreedyOutcome) -> bool {
    let key = |outcome: &GreedyOutcome| (outcome.stats.residual.len(), outcome.selection.len());
    key(candidate) < key(incumbent)
}

/// Unselected entity with the largest positive marginal gain, or `None` when
/// nothing left can cover an uncovered pair.
fn pick_best<'a>(
    index: &'a CoverageIndex,
    uncovered: &BTreeSet<Pair>,
    selected: &BTreeSet<&EntityId>,
    mut rng: Option<&mut SmallRng>,
) -> Option<Candidate<'a>> {
    let mut best: Option<Candidate<'a>> = None;
    let mut ties = 0u32;
    for (id, pairs) in index.iter() {
        if selected.contains(id) {
            continue;
        }
        let gain = pairs.iter().filter(|pair| uncovered.contains(*pair)).count();
        if gain == 0 {
            continue;
        }
        match best.as_ref().map(|current| current.gain) {
            Some(best_gain) if gain < best_gain => {}
            Some(best_gain) if gain == best_gain => {
                ties += 1;
                // reservoir sampling keeps each tied entity with probability 1/ties
                if let Some(rng) = rng.as_deref_mut() {
                    if rng.gen_range(0..ties) == 0 {
                        best = Some(Candidate { id, gain });
                    }
                }
            }
            _ => {
                ties = 1;
                best = Some(Candidate { id, gain });
            }
        }
    }
    best
}
