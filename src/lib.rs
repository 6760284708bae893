//! Smallest set of players that, between them, connects every pair of
//! current franchises.
//!
//! Pure library: callers hand in franchise seasons and appearances (or a
//! ready-made coverage index) and get selections plus statistics back. No
//! file, database or network access happens here.

pub mod config;
pub mod error;
pub mod exact;
pub mod filter;
pub mod franchise;
pub mod greedy;
pub mod index;
pub mod milp;
pub mod model;
pub mod report;

pub use config::SolverConfig;
pub use error::{CoverError, CoverResult};
pub use exact::{ExactOutcome, ExactSolver, SolveStatus};
pub use filter::{constrain_to_franchise, filter_by_franchise, ConstrainedProblem};
pub use franchise::{collect_franchise_sets, Appearance, FranchiseMap, FranchiseResolver, TeamSeason};
pub use greedy::{GreedyOutcome, GreedySolver, TieBreak};
pub use index::{build_coverage_index, CoverageIndex};
pub use milp::{CoverModel, MicroLpBackend, MilpBackend, MilpOutcome, MilpStatus};
pub use model::entity::{EntityId, EntityInfo, FranchiseSets};
pub use model::franchise::{Franchise, Pair};
pub use model::universe::Universe;
