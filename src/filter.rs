use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{CoverError, CoverResult};
use crate::index::CoverageIndex;
use crate::model::entity::FranchiseSets;
use crate::model::franchise::{Franchise, Pair};
use crate::model::universe::Universe;

/// Keeps the entities whose franchise set includes `target`.
///
/// Retained entities keep their full coverage, including pairs that do not
/// involve `target`. Entities missing from `franchises` are dropped. Matching
/// is exact, so `nyy` does not match `NYY`.
pub fn filter_by_franchise(index: &CoverageIndex, franchises: &FranchiseSets, target: &Franchise) -> CoverageIndex {
    let mut filtered = index.clone();
    filtered.retain(|id| franchises.get(id).is_some_and(|set| set.contains(target)));
    filtered
}

/// A coverage problem restricted to one franchise's entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstrainedProblem {
    pub target: Franchise,
    #[serde(skip)]
    pub index: CoverageIndex,
    pub eligible: usize,
    /// Eligible entities with at least one pair.
    pub with_pairs: usize,
    pub achievable: BTreeSet<Pair>,
    /// Pairs no eligible entity covers. No solver can close these under the constraint.
    pub uncoverable: BTreeSet<Pair>,
}

impl ConstrainedProblem {
    pub fn is_fully_coverable(&self) -> bool {
        self.uncoverable.is_empty()
    }

    pub fn coverage_percentage(&self) -> f64 {
        let total = self.achievable.len() + self.uncoverable.len();
        if total == 0 {
            100.0
        } else {
            self.achievable.len() as f64 / total as f64 * 100.0
        }
    }
}

/// Filters `index` to `target` and measures what the restricted set can still reach.
pub fn constrain_to_franchise(
    index: &CoverageIndex,
    franchises: &FranchiseSets,
    universe: &Universe,
    target: &Franchise,
) -> CoverResult<ConstrainedProblem> {
    if !universe.has_franchise(target) {
        return Err(CoverError::UnknownFranchise(target.clone()));
    }

    let restricted = filter_by_franchise(index, franchises, target);
    let with_pairs = restricted.iter().filter(|(_, pairs)| !pairs.is_empty()).count();
    let coverable = restricted.coverable_pairs();
    let (achievable, uncoverable): (BTreeSet<Pair>, BTreeSet<Pair>) =
        universe.iter().cloned().partition(|pair| coverable.contains(pair));

    info!(
        franchise = %target,
        eligible = restricted.len(),
        with_pairs,
        achievable = achievable.len(),
        total = universe.len(),
        "restricted index to franchise"
    );
    if !uncoverable.is_empty() {
        warn!(franchise = %target, uncoverable = uncoverable.len(), "pairs unreachable under franchise constraint");
    }

    Ok(ConstrainedProblem {
        target: target.clone(),
        eligible: restricted.len(),
        index: restricted,
        with_pairs,
        achievable,
        uncoverable,
    })
}
