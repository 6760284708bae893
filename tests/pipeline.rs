use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use minmaculate::report::{analyze_selection, compare, coverage_stats};
use minmaculate::{
    build_coverage_index, collect_franchise_sets, constrain_to_franchise, Appearance, CoverageIndex, EntityInfo,
    ExactSolver, Franchise, FranchiseMap, FranchiseSets, GreedySolver, Pair, SolveStatus, SolverConfig, TeamSeason,
    Universe,
};

const BUDGET: Duration = Duration::from_secs(60);

fn universe(codes: &[&str]) -> Universe {
    Universe::new(codes.iter().map(|code| Franchise::new(*code)))
}

fn index(rows: &[(&str, &[(&str, &str)])]) -> CoverageIndex {
    let mut index = CoverageIndex::new();
    for (id, pairs) in rows {
        index.insert(*id, pairs.iter().map(|pair| Pair::from(*pair)));
    }
    index
}

// -------------------------------------------------------------------------
// Hand-built scenarios
// -------------------------------------------------------------------------

#[test]
fn three_franchise_cover() {
    let index = index(&[
        ("p1", &[("A", "B"), ("A", "C")]),
        ("p2", &[("B", "C")]),
        ("p3", &[("A", "B")]),
    ]);
    let universe = universe(&["A", "B", "C"]);

    let greedy = GreedySolver::default().solve(&index, &universe);
    assert_eq!(greedy.selection, vec!["p1", "p2"]);
    assert!(greedy.stats.is_complete());

    let exact = ExactSolver::new(BUDGET).solve(&index, &universe);
    assert_eq!(exact.stats.status, SolveStatus::Optimal);
    assert_eq!(exact.selection.len(), 2);
    assert_eq!(exact.stats.pairs_covered, 3);
}

#[test]
fn unreachable_pair() {
    let index = index(&[("p1", &[("A", "C")]), ("p2", &[("B", "C")])]);
    let universe = universe(&["A", "B", "C"]);
    let missing = BTreeSet::from([Pair::from(("A", "B"))]);

    let exact = ExactSolver::new(BUDGET).solve(&index, &universe);
    assert_eq!(exact.stats.status, SolveStatus::Infeasible);
    assert_eq!(exact.stats.uncoverable, missing);
    assert!(exact.selection.is_empty());

    let greedy = GreedySolver::default().solve(&index, &universe);
    assert_eq!(greedy.selection.len(), 2);
    assert_eq!(greedy.stats.residual, missing);
}

#[test]
fn super_entity_covers_everything() {
    let all = [("A", "B"), ("A", "C"), ("A", "D"), ("B", "C"), ("B", "D"), ("C", "D")];
    let index = index(&[("extra", &[("A", "C")]), ("super", &all)]);
    let universe = universe(&["A", "B", "C", "D"]);

    let greedy = GreedySolver::default().solve(&index, &universe);
    let exact = ExactSolver::new(BUDGET).solve(&index, &universe);
    assert_eq!(greedy.selection, vec!["super"]);
    assert_eq!(exact.selection, vec!["super"]);
    assert_eq!(exact.stats.status, SolveStatus::Optimal);
}

#[test]
fn index_is_reusable_across_solvers() {
    let index = index(&[("p1", &[("A", "B"), ("A", "C")]), ("p2", &[("B", "C")])]);
    let universe = universe(&["A", "B", "C"]);
    let before = index.clone();

    GreedySolver::default().solve(&index, &universe);
    ExactSolver::new(BUDGET).solve(&index, &universe);
    GreedySolver::default().solve(&index, &universe);
    assert_eq!(index, before);
}

// -------------------------------------------------------------------------
// Randomized comparisons
// -------------------------------------------------------------------------

/// Feasible instance: random multi-franchise entities plus one "journeyman"
/// per pair so every pair has at least one cover.
fn feasible_instance(seed: u64) -> (CoverageIndex, Universe) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let codes: Vec<Franchise> = (0..6).map(|i| Franchise::new(format!("F{i}"))).collect();
    let universe = Universe::new(codes.clone());
    let mut index = CoverageIndex::new();
    for e in 0..15 {
        let picks: BTreeSet<Franchise> = (0..rng.gen_range(2..=4)).map(|_| codes[rng.gen_range(0..codes.len())].clone()).collect();
        let pairs = picks.iter().tuple_combinations().map(|(a, b)| Pair::new(a.clone(), b.clone()));
        index.insert(format!("e{e:02}"), pairs);
    }
    for (k, pair) in universe.iter().enumerate() {
        index.insert(format!("j{k:02}"), [pair.clone()]);
    }
    (index, universe)
}

#[test]
fn exact_never_larger_than_greedy() {
    for seed in 0..8 {
        let (index, universe) = feasible_instance(seed);
        let greedy = GreedySolver::default().solve(&index, &universe);
        let exact = ExactSolver::new(BUDGET).solve(&index, &universe);
        assert!(greedy.stats.is_complete(), "seed {seed}");
        assert_eq!(exact.stats.status, SolveStatus::Optimal, "seed {seed}");
        assert!(exact.selection.len() <= greedy.selection.len(), "seed {seed}");
        assert_eq!(index.covered_by(&exact.selection).len(), universe.len(), "seed {seed}");

        let comparison = compare(&greedy, &exact);
        assert!(comparison.improvement >= 0);
        assert!(comparison.approximation_ratio.is_some_and(|ratio| ratio >= 1.0));
    }
}

/// Thirty franchises and thousands of wide entities: far too large for the
/// exact search to finish within a fraction of a second.
fn league_sized_instance(seed: u64) -> (CoverageIndex, Universe) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let codes: Vec<Franchise> = (0..30).map(|i| Franchise::new(format!("F{i:02}"))).collect();
    let universe = Universe::new(codes.clone());
    let mut index = CoverageIndex::new();
    for e in 0..3000 {
        let picks: BTreeSet<Franchise> = (0..rng.gen_range(2..=8)).map(|_| codes[rng.gen_range(0..codes.len())].clone()).collect();
        let pairs = picks.iter().tuple_combinations().map(|(a, b)| Pair::new(a.clone(), b.clone()));
        index.insert(format!("e{e:04}"), pairs);
    }
    for (k, pair) in universe.iter().enumerate() {
        index.insert(format!("j{k:03}"), [pair.clone()]);
    }
    (index, universe)
}

#[test]
fn expired_budget_returns_warm_start_cover_on_time() {
    let (index, universe) = league_sized_instance(11);
    let solver = ExactSolver::new(BUDGET);
    let budget = Duration::from_millis(300);

    for _ in 0..3 {
        let started = Instant::now();
        let exact = solver.solve_within(&index, &universe, budget);
        let elapsed = started.elapsed();
        assert_eq!(exact.stats.status, SolveStatus::Feasible);
        assert!(!exact.stats.status.is_proven_optimal());
        assert_eq!(index.covered_by(&exact.selection).len(), universe.len());
        assert!(exact.stats.message.is_some());
        assert!(elapsed < budget + Duration::from_secs(3), "took {elapsed:?}");
    }
}

// -------------------------------------------------------------------------
// Seasons → associations → index → solvers
// -------------------------------------------------------------------------

fn league() -> (FranchiseMap, Vec<Appearance>) {
    let seasons = vec![
        TeamSeason::new(1955, "BRO", "LAD"),
        TeamSeason::new(1955, "NY1", "SFG"),
        TeamSeason::new(1955, "MLN", "ATL"),
        TeamSeason::new(1955, "NYA", "NYY"),
        TeamSeason::new(2024, "LAN", "LAD"),
        TeamSeason::new(2024, "SFN", "SFG"),
        TeamSeason::new(2024, "ATL", "ATL"),
        TeamSeason::new(2024, "NYA", "NYY"),
        TeamSeason::new(2024, "MIN", "MIN"),
    ];
    let appearances = vec![
        Appearance::new("alpha", "BRO", 90),
        Appearance::new("alpha", "MLN", 40),
        Appearance::new("alpha", "MIN", 10),
        Appearance::new("bravo", "NY1", 120),
        Appearance::new("bravo", "NYA", 30),
        Appearance::new("bravo", "MIN", 5),
        Appearance::new("charlie", "LAN", 60),
        Appearance::new("charlie", "SFN", 60),
        Appearance::new("charlie", "ATL", 60),
        Appearance::new("delta", "NYA", 150),
        Appearance::new("delta", "ATL", 2),
        Appearance::new("delta", "LAN", 1),
        Appearance::new("echo", "MIN", 162),
    ];
    (FranchiseMap::new(seasons), appearances)
}

#[test]
fn full_pipeline_from_seasons() {
    let config = SolverConfig::from_toml("[franchises]\nexpected_count = 5").unwrap();
    let (map, appearances) = league();
    let resolver = map.at_year(config.franchises.current_year);
    let current = map.current_franchises(config.franchises.current_year);
    assert!(config.franchises.check_count(&current));
    assert!(!SolverConfig::default().franchises.check_count(&current));

    let (sets, summary) = collect_franchise_sets(&appearances, &resolver, config.franchises.min_games);
    assert_eq!(summary.entities, 5);
    let (index, universe) = build_coverage_index(&sets, &current);
    assert_eq!(universe.len(), 10);

    let stats = coverage_stats(&index, &universe);
    assert_eq!(stats.entities_with_pairs, 4);
    assert_eq!(stats.uncovered_pairs, 0);

    // alpha, bravo, charlie and delta each hold one pair nobody else has
    let everyone = vec!["alpha", "bravo", "charlie", "delta"];
    let greedy = config.greedy.run(&index, &universe);
    assert!(greedy.stats.is_complete());
    assert_eq!(greedy.selection.iter().sorted().collect::<Vec<_>>(), everyone);

    let exact = config.exact.solver().solve(&index, &universe);
    assert_eq!(exact.stats.status, SolveStatus::Optimal);
    assert_eq!(exact.selection, everyone);
    assert_eq!(exact.stats.objective, Some(4.0));

    let mut info = BTreeMap::new();
    info.insert("alpha".to_string(), EntityInfo::named("Al", "Pha"));
    let analysis = analyze_selection(&greedy.selection, &index, &universe, &info);
    assert_eq!(analysis.covered_pairs, greedy.stats.pairs_covered);
}

#[test]
fn franchise_constrained_pipeline() {
    let (map, appearances) = league();
    let current = map.current_franchises(2024);
    let (sets, _) = collect_franchise_sets(&appearances, &map.at_year(2024), 1);
    let (index, universe) = build_coverage_index(&sets, &current);

    let problem = constrain_to_franchise(&index, &sets, &universe, &Franchise::new("MIN")).unwrap();
    let eligible: Vec<&String> = problem.index.entity_ids().collect();
    assert_eq!(eligible, vec!["alpha", "bravo", "echo"]);
    assert_eq!(problem.with_pairs, 2);
    for id in problem.index.entity_ids() {
        assert_eq!(problem.index.get(id), index.get(id));
        assert!(sets[id].contains(&Franchise::new("MIN")));
    }

    let greedy = GreedySolver::default().solve(&problem.index, &universe);
    assert_eq!(greedy.stats.residual, problem.uncoverable);
    let exact = ExactSolver::new(BUDGET).solve(&problem.index, &universe);
    assert_eq!(exact.stats.status, SolveStatus::Infeasible);
    assert_eq!(exact.stats.uncoverable, problem.uncoverable);
}

#[test]
fn unknown_target_franchise_is_an_error() {
    let (map, appearances) = league();
    let current = map.current_franchises(2024);
    let (sets, _): (FranchiseSets, _) = collect_franchise_sets(&appearances, &map.at_year(2024), 1);
    let (index, universe) = build_coverage_index(&sets, &current);
    assert!(constrain_to_franchise(&index, &sets, &universe, &Franchise::new("MON")).is_err());
}
