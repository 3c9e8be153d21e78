//! Exact optimal expected query cost for k-ary twenty-questions oracles.
//!
//! Objects carry categorical attributes. Asking an attribute partitions the remaining candidates
//! by their value, and the oracle minimizes the expected number of questions needed to isolate an
//! object drawn uniformly at random. Two state encodings share one memoized solver: candidate
//! subsets ([`solvers::SubsetDp`]) and partial assignments ([`solvers::AssignmentDp`]). A solved
//! policy can be read back as a decision [`tree::Tree`] or propagated forward into a per-turn
//! [`simulation::Curve`].
//!
//! # Examples
//!
//! ```
//! use kary_oracle::prelude::*;
//! use kary_oracle::{simulation, solvers, tree};
//!
//! let table: ObjectTable = serde_json::from_str(
//!     r#"{
//!         "ant": {"legs": 6, "wings": false},
//!         "bee": {"legs": 6, "wings": true},
//!         "owl": {"legs": 2, "wings": true}
//!     }"#,
//! ).unwrap();
//! let index = ObjectIndex::new(&table).unwrap();
//! let mut search = solvers::create_subset_search(&index, Parameters::default());
//! let solution = search.solve().unwrap();
//! assert!((solution.cost - 5.0 / 3.0).abs() < 1e-12);
//!
//! let policy = search.policy();
//! let tree = tree::build_tree(&policy, index.universe()).unwrap();
//! assert_eq!(tree.expected_queries(), solution.cost);
//!
//! let curve = simulation::simulate(&policy, index.universe(), None).unwrap();
//! assert!(curve.last().unwrap().resolved_mass >= 1.0 - 1e-12);
//! ```

mod dp;
pub mod error;
pub mod index;
pub mod io;
pub mod simulation;
pub mod solvers;
pub mod timer;
pub mod tree;

pub use dp::Dp;
pub use error::{OracleError, Result};
pub use index::{ObjectIndex, ObjectTable, Value};
pub use solvers::Solution;

pub mod prelude {
    pub use super::solvers::{MemoizedSearch, Parameters, PolicyView};
    pub use super::{Dp, ObjectIndex, ObjectTable, OracleError, Solution, Value};
}
