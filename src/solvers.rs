mod assignment;
pub mod search_algorithms;
mod subset;

pub use assignment::{create_assignment_search, Assignment, AssignmentDp};
pub use search_algorithms::{
    MemoizedSearch, Parameters, PolicyEntry, PolicyRegistry, PolicyView, Solution,
};
pub use subset::{create_subset_search, SubsetDp};
