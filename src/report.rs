use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::exact::{ExactOutcome, SolveStatus};
use crate::greedy::GreedyOutcome;
use crate::index::CoverageIndex;
use crate::model::entity::{display_name, EntityId, EntityInfo};
use crate::model::universe::Universe;

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        100.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageStats {
    pub total_pairs: usize,
    pub covered_pairs: usize,
    pub uncovered_pairs: usize,
    pub total_entities: usize,
    pub entities_with_pairs: usize,
}

impl CoverageStats {
    pub fn coverage_percentage(&self) -> f64 {
        percentage(self.covered_pairs, self.total_pairs)
    }
}

/// How much of the universe the whole index can reach.
pub fn coverage_stats(index: &CoverageIndex, universe: &Universe) -> CoverageStats {
    let uncovered = index.uncoverable(universe).len();
    CoverageStats {
        total_pairs: universe.len(),
        covered_pairs: universe.len() - uncovered,
        uncovered_pairs: uncovered,
        total_entities: index.len(),
        entities_with_pairs: index.iter().filter(|(_, pairs)| !pairs.is_empty()).count(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub entity: EntityId,
    pub name: String,
    pub pairs: usize,
    pub franchises: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionAnalysis {
    pub selected: usize,
    pub total_pairs: usize,
    pub covered_pairs: usize,
    pub uncovered_pairs: usize,
    pub contributions: Vec<Contribution>,
}

impl SelectionAnalysis {
    pub fn coverage_percentage(&self) -> f64 {
        percentage(self.covered_pairs, self.total_pairs)
    }

    /// Contributions ordered by pairs covered, largest first.
    pub fn top_contributors(&self, limit: usize) -> Vec<&Contribution> {
        let mut ranked: Vec<&Contribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| b.pairs.cmp(&a.pairs).then_with(|| a.entity.cmp(&b.entity)));
        ranked.truncate(limit);
        ranked
    }
}

pub fn analyze_selection(
    selection: &[EntityId],
    index: &CoverageIndex,
    universe: &Universe,
    info: &BTreeMap<EntityId, EntityInfo>,
) -> SelectionAnalysis {
    let covered = index.covered_by(selection);
    let contributions = selection
        .iter()
        .map(|id| Contribution {
            entity: id.clone(),
            name: display_name(id, info),
            pairs: index.get(id).map_or(0, BTreeSet::len),
            franchises: index.franchises_of(id).len(),
        })
        .collect();
    SelectionAnalysis {
        selected: selection.len(),
        total_pairs: universe.len(),
        covered_pairs: covered.len(),
        uncovered_pairs: universe.len() - covered.len(),
        contributions,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub greedy_size: usize,
    pub exact_size: usize,
    pub exact_status: SolveStatus,
    /// Entities the exact selection saves over greedy; negative if greedy was smaller.
    pub improvement: i64,
    /// `greedy_size / exact_size`, when the exact solver produced a non-empty cover.
    pub approximation_ratio: Option<f64>,
    pub common: BTreeSet<EntityId>,
    pub greedy_only: BTreeSet<EntityId>,
    pub exact_only: BTreeSet<EntityId>,
}

pub fn compare(greedy: &GreedyOutcome, exact: &ExactOutcome) -> Comparison {
    let greedy_set: BTreeSet<EntityId> = greedy.selection.iter().cloned().collect();
    let exact_set: BTreeSet<EntityId> = exact.selection.iter().cloned().collect();
    let approximation_ratio = (exact.stats.status.is_success() && !exact.selection.is_empty())
        .then(|| greedy.selection.len() as f64 / exact.selection.len() as f64);

    Comparison {
        greedy_size: greedy.selection.len(),
        exact_size: exact.selection.len(),
        exact_status: exact.stats.status,
        improvement: greedy.selection.len() as i64 - exact.selection.len() as i64,
        approximation_ratio,
        common: greedy_set.intersection(&exact_set).cloned().collect(),
        greedy_only: greedy_set.difference(&exact_set).cloned().collect(),
        exact_only: exact_set.difference(&greedy_set).cloned().collect(),
    }
}
