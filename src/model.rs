pub mod franchise {
    use std::fmt;

    use serde::Serialize;

    use crate::error::{CoverError, CoverResult};

    /// Short code of a current top-level organization, e.g. `NYY`.
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
    #[serde(transparent)]
    pub struct Franchise(String);

    impl Franchise {
        pub fn new(code: impl Into<String>) -> Franchise {
            Franchise(code.into())
        }
        pub fn code(&self) -> &str {
            &self.0
        }
    }

    impl From<&str> for Franchise {
        fn from(code: &str) -> Self {
            Franchise::new(code)
        }
    }

    impl fmt::Display for Franchise {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Unordered pair of distinct franchises, stored as `(low, high)`.
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
    pub struct Pair {
        low: Franchise,
        high: Franchise,
    }

    impl Pair {
        /// Panics when both members are the same franchise.
        pub fn new(a: Franchise, b: Franchise) -> Pair {
            assert!(a != b, "pair members must differ (got {a} twice)");
            if a < b {
                Pair { low: a, high: b }
            } else {
                Pair { low: b, high: a }
            }
        }

        pub fn try_new(a: Franchise, b: Franchise) -> CoverResult<Pair> {
            if a == b {
                return Err(CoverError::DegeneratePair(a));
            }
            Ok(Pair::new(a, b))
        }

        pub fn low(&self) -> &Franchise {
            &self.low
        }
        pub fn high(&self) -> &Franchise {
            &self.high
        }
        pub fn contains(&self, franchise: &Franchise) -> bool {
            &self.low == franchise || &self.high == franchise
        }

        /// The member that is not `franchise`, if `franchise` is one of the two.
        pub fn other(&self, franchise: &Franchise) -> Option<&Franchise> {
            if &self.low == franchise {
                Some(&self.high)
            } else if &self.high == franchise {
                Some(&self.low)
            } else {
                None
            }
        }
    }

    impl From<(&str, &str)> for Pair {
        fn from((a, b): (&str, &str)) -> Self {
            Pair::new(a.into(), b.into())
        }
    }

    impl fmt::Display for Pair {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

pub mod universe {
    use std::collections::BTreeSet;

    use itertools::Itertools;

    use super::franchise::{Franchise, Pair};

    /// Every pair over the current franchises. Built once, read-only afterwards.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Universe {
        franchises: BTreeSet<Franchise>,
        pairs: BTreeSet<Pair>,
    }

    impl Universe {
        pub fn new(franchises: impl IntoIterator<Item = Franchise>) -> Universe {
            let franchises: BTreeSet<Franchise> = franchises.into_iter().collect();
            let pairs: BTreeSet<Pair> = franchises
                .iter()
                .tuple_combinations()
                .map(|(a, b)| Pair::new(a.clone(), b.clone()))
                .collect();
            let n = franchises.len();
            assert_eq!(
                pairs.len(),
                n * n.saturating_sub(1) / 2,
                "universe over {n} franchises must hold C({n}, 2) pairs"
            );
            Universe { franchises, pairs }
        }

        pub fn len(&self) -> usize {
            self.pairs.len()
        }
        pub fn is_empty(&self) -> bool {
            self.pairs.is_empty()
        }
        pub fn contains(&self, pair: &Pair) -> bool {
            self.pairs.contains(pair)
        }
        pub fn iter(&self) -> impl Iterator<Item = &Pair> {
            self.pairs.iter()
        }
        pub fn pairs(&self) -> &BTreeSet<Pair> {
            &self.pairs
        }
        pub fn franchises(&self) -> &BTreeSet<Franchise> {
            &self.franchises
        }
        pub fn has_franchise(&self, franchise: &Franchise) -> bool {
            self.franchises.contains(franchise)
        }
    }
}

pub mod entity {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::Serialize;

    use super::franchise::Franchise;

    pub type EntityId = String;
    pub type FranchiseSets = BTreeMap<EntityId, BTreeSet<Franchise>>;

    /// Display metadata. Never consulted by the solvers.
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct EntityInfo {
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub birth_year: Option<i32>,
        pub debut: Option<String>,
        pub final_game: Option<String>,
    }

    impl EntityInfo {
        pub fn named(first: &str, last: &str) -> EntityInfo {
            EntityInfo {
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
                ..EntityInfo::default()
            }
        }

        /// "First Last", or `id` when no name is known.
        pub fn display_name(&self, id: &str) -> String {
            let name = [self.first_name.as_deref(), self.last_name.as_deref()]
                .into_iter()
                .flatten()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if name.is_empty() {
                id.to_string()
            } else {
                name
            }
        }
    }

    pub fn display_name(id: &str, info: &BTreeMap<EntityId, EntityInfo>) -> String {
        info.get(id)
            .map(|entity| entity.display_name(id))
            .unwrap_or_else(|| id.to_string())
    }
}
