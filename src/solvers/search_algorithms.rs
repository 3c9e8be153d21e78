//! Memoized search over the expected-cost recurrence.

mod memoized_search;
mod policy_registry;

pub use memoized_search::{MemoizedSearch, Parameters, Solution};
pub use policy_registry::{PolicyEntry, PolicyRegistry, PolicyView};
