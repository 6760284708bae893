use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::debug;

use crate::model::entity::{EntityId, FranchiseSets};
use crate::model::franchise::{Franchise, Pair};
use crate::model::universe::Universe;

/// Pairs each entity covers, iterated in ascending entity id.
///
/// Both solvers treat the index as read-only and walk it in this order, so
/// "first maximal entity" always means "lowest id among the maximal ones".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageIndex {
    entries: BTreeMap<EntityId, BTreeSet<Pair>>,
}

impl CoverageIndex {
    pub fn new() -> CoverageIndex {
        CoverageIndex::default()
    }

    pub fn insert(&mut self, id: impl Into<EntityId>, pairs: impl IntoIterator<Item = Pair>) {
        self.entries.insert(id.into(), pairs.into_iter().collect());
    }

    pub fn get(&self, id: &str) -> Option<&BTreeSet<Pair>> {
        self.entries.get(id)
    }
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &BTreeSet<Pair>)> {
        self.entries.iter()
    }
    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.keys()
    }

    /// Union of every entity's pairs.
    pub fn coverable_pairs(&self) -> BTreeSet<Pair> {
        self.entries.values().flatten().cloned().collect()
    }

    /// Universe pairs that no entity in the index covers.
    pub fn uncoverable(&self, universe: &Universe) -> BTreeSet<Pair> {
        let coverable = self.coverable_pairs();
        universe.iter().filter(|pair| !coverable.contains(*pair)).cloned().collect()
    }

    /// Union of the pairs covered by `selection`. Unknown ids contribute nothing.
    pub fn covered_by<'a>(&self, selection: impl IntoIterator<Item = &'a EntityId>) -> BTreeSet<Pair> {
        selection
            .into_iter()
            .filter_map(|id| self.entries.get(id))
            .flatten()
            .cloned()
            .collect()
    }

    /// Distinct franchises appearing in an entity's pairs.
    pub fn franchises_of(&self, id: &str) -> BTreeSet<Franchise> {
        self.get(id)
            .into_iter()
            .flatten()
            .flat_map(|pair| [pair.low().clone(), pair.high().clone()])
            .collect()
    }

    /// Panics if any entity covers a pair outside `universe`.
    pub fn assert_within(&self, universe: &Universe) {
        for (id, pairs) in &self.entries {
            if let Some(stray) = pairs.iter().find(|pair| !universe.contains(pair)) {
                panic!("entity {id} covers {stray}, which is outside the universe");
            }
        }
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&EntityId) -> bool) {
        self.entries.retain(|id, _| keep(id));
    }
}

impl FromIterator<(EntityId, BTreeSet<Pair>)> for CoverageIndex {
    fn from_iter<T: IntoIterator<Item = (EntityId, BTreeSet<Pair>)>>(iter: T) -> Self {
        CoverageIndex { entries: iter.into_iter().collect() }
    }
}

/// Every pair implied by `franchises`, keeping only members of `current`.
pub fn pairs_for(franchises: &BTreeSet<Franchise>, current: &BTreeSet<Franchise>) -> BTreeSet<Pair> {
    franchises
        .iter()
        .filter(|franchise| current.contains(*franchise))
        .tuple_combinations()
        .map(|(a, b)| Pair::new(a.clone(), b.clone()))
        .collect()
}

/// Builds the coverage index and the universe from entity→franchise associations.
///
/// Franchises outside `current` are discarded before combining, so every
/// coverage set is a subset of the returned universe. Entities with fewer
/// than two current franchises stay in the index with an empty set.
pub fn build_coverage_index(
    associations: &FranchiseSets,
    current: &BTreeSet<Franchise>,
) -> (CoverageIndex, Universe) {
    let universe = Universe::new(current.iter().cloned());
    let index: CoverageIndex = associations
        .iter()
        .map(|(id, franchises)| (id.clone(), pairs_for(franchises, current)))
        .collect();

    let associations_total: usize = index.entries.values().map(BTreeSet::len).sum();
    debug!(
        entities = index.len(),
        associations = associations_total,
        universe = universe.len(),
        "built coverage index"
    );
    (index, universe)
}
