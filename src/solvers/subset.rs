use super::search_algorithms::{MemoizedSearch, Parameters};
use crate::dp::Dp;
use crate::error::{OracleError, Result};
use crate::index::{ObjectIndex, Part};
use fixedbitset::FixedBitSet;

/// State encoding by candidate set.
///
/// Every attribute is a query in every state; attributes on which the candidates agree are
/// skipped by the search because they do not split.
/// The number of states is the number of distinct reachable candidate sets.
pub struct SubsetDp<'a> {
    index: &'a ObjectIndex,
}

impl<'a> SubsetDp<'a> {
    pub fn new(index: &'a ObjectIndex) -> Self {
        Self { index }
    }
}

impl Dp for SubsetDp<'_> {
    type State = FixedBitSet;

    fn get_index(&self) -> &ObjectIndex {
        self.index
    }

    fn get_target(&self) -> Self::State {
        self.index.universe().clone()
    }

    fn get_candidates(&self, state: &Self::State) -> Result<FixedBitSet> {
        if let Some(object) = state.ones().find(|&object| object >= self.index.len()) {
            return Err(OracleError::InvalidState(format!(
                "object {} is out of range for {} objects",
                object,
                self.index.len()
            )));
        }

        Ok(state.clone())
    }

    fn is_candidate_set(&self) -> bool {
        true
    }

    fn get_queries(&self, _: &Self::State) -> impl IntoIterator<Item = usize> {
        0..self.index.attribute_count()
    }

    fn get_successor(&self, _: &Self::State, _: usize, part: &Part) -> Self::State {
        part.candidates.clone()
    }
}

/// Creates a search over candidate sets.
///
/// # Examples
///
/// ```
/// use kary_oracle::prelude::*;
/// use kary_oracle::solvers;
///
/// let table: ObjectTable = serde_json::from_str(
///     r#"{
///         "a": {"fur": true, "big": true},
///         "b": {"fur": true, "big": false},
///         "c": {"fur": false, "big": true},
///         "d": {"fur": false, "big": false}
///     }"#,
/// ).unwrap();
/// let index = ObjectIndex::new(&table).unwrap();
/// let parameters = Parameters {
///     quiet: true,
///     ..Default::default()
/// };
/// let mut search = solvers::create_subset_search(&index, parameters);
/// let solution = search.solve().unwrap();
/// assert_eq!(solution.cost, 2.0);
/// ```
pub fn create_subset_search(
    index: &ObjectIndex,
    parameters: Parameters,
) -> MemoizedSearch<SubsetDp<'_>> {
    MemoizedSearch::new(SubsetDp::new(index), parameters)
}
