//! Historical team codes to current franchises, and the per-entity franchise
//! sets the coverage index is built from.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::entity::{EntityId, FranchiseSets};
use crate::model::franchise::Franchise;

/// One team season: `team` played in `year` as part of `franchise`.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeason {
    pub year: i32,
    pub team: String,
    pub franchise: Franchise,
}

impl TeamSeason {
    pub fn new(year: i32, team: &str, franchise: &str) -> TeamSeason {
        TeamSeason { year, team: team.to_string(), franchise: Franchise::new(franchise) }
    }
}

/// Games an entity played for a team. Repeated rows for the same pair are fine.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    pub entity: EntityId,
    pub team: String,
    pub games: u32,
}

impl Appearance {
    pub fn new(entity: &str, team: &str, games: u32) -> Appearance {
        Appearance { entity: entity.to_string(), team: team.to_string(), games }
    }
}

pub trait FranchiseResolver {
    fn current_franchises(&self) -> BTreeSet<Franchise>;
    fn resolve(&self, team: &str) -> Option<&Franchise>;
}

#[derive(Debug, Clone, Default)]
pub struct FranchiseMap {
    teams: HashMap<String, Franchise>,
    seasons: Vec<(i32, Franchise)>,
}

impl FranchiseMap {
    /// Later seasons override earlier ones for the same team code.
    pub fn new(seasons: impl IntoIterator<Item = TeamSeason>) -> FranchiseMap {
        let mut map = FranchiseMap::default();
        for season in seasons {
            map.teams.insert(season.team, season.franchise.clone());
            map.seasons.push((season.year, season.franchise));
        }
        debug!(teams = map.teams.len(), seasons = map.seasons.len(), "loaded franchise map");
        map
    }

    pub fn resolve(&self, team: &str) -> Option<&Franchise> {
        self.teams.get(team)
    }

    /// Franchises with at least one team season in `year`.
    pub fn current_franchises(&self, year: i32) -> BTreeSet<Franchise> {
        self.seasons
            .iter()
            .filter(|(season, _)| *season == year)
            .map(|(_, franchise)| franchise.clone())
            .collect()
    }

    pub fn at_year(&self, year: i32) -> CurrentFranchises<'_> {
        CurrentFranchises { map: self, year }
    }

    pub fn validate_franchise_count(franchises: &BTreeSet<Franchise>, expected: usize) -> bool {
        franchises.len() == expected
    }
}

/// A [`FranchiseMap`] viewed from one season.
#[derive(Debug, Clone, Copy)]
pub struct CurrentFranchises<'a> {
    map: &'a FranchiseMap,
    year: i32,
}

impl FranchiseResolver for CurrentFranchises<'_> {
    fn current_franchises(&self) -> BTreeSet<Franchise> {
        self.map.current_franchises(self.year)
    }
    fn resolve(&self, team: &str) -> Option<&Franchise> {
        self.map.resolve(team)
    }
}

/// Rows dropped while collecting franchise sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssociationSummary {
    pub rows: usize,
    pub below_min_games: usize,
    pub unmapped: usize,
    pub not_current: usize,
    pub entities: usize,
}

/// Groups appearances into entity→franchise sets.
///
/// Rows with fewer than `min_games` games, unknown team codes, or franchises
/// outside the current set are dropped and counted in the summary.
pub fn collect_franchise_sets<'a>(
    appearances: impl IntoIterator<Item = &'a Appearance>,
    resolver: &impl FranchiseResolver,
    min_games: u32,
) -> (FranchiseSets, AssociationSummary) {
    let current = resolver.current_franchises();
    let mut sets = FranchiseSets::new();
    let mut summary = AssociationSummary::default();

    for appearance in appearances {
        summary.rows += 1;
        if appearance.games < min_games {
            summary.below_min_games += 1;
            continue;
        }
        let Some(franchise) = resolver.resolve(&appearance.team) else {
            summary.unmapped += 1;
            continue;
        };
        if !current.contains(franchise) {
            summary.not_current += 1;
            continue;
        }
        sets.entry(appearance.entity.clone()).or_default().insert(franchise.clone());
    }

    summary.entities = sets.len();
    if summary.unmapped > 0 {
        warn!(unmapped = summary.unmapped, "dropped appearances with unmapped team codes");
    }
    info!(
        rows = summary.rows,
        kept_entities = summary.entities,
        below_min_games = summary.below_min_games,
        not_current = summary.not_current,
        "collected franchise sets"
    );
    (sets, summary)
}
