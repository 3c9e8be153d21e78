use super::search_algorithms::{MemoizedSearch, Parameters};
use crate::dp::Dp;
use crate::error::{OracleError, Result};
use crate::index::{ObjectIndex, Part};
use fixedbitset::FixedBitSet;
use smallvec::{smallvec, SmallVec};

/// Partial assignment: one slot per attribute, `None` while the attribute has not been asked,
/// otherwise the index of the observed value.
pub type Assignment = SmallVec<[Option<u32>; 8]>;

/// State encoding by partial assignment.
///
/// Only unassigned attributes are queries, since asking an attribute again reveals nothing
/// new. Different assignments may imply the same candidate set and are still different
/// states; their costs are equal because the recurrence only depends on the candidates and on
/// the attributes that split them.
///
/// The candidate set of a state is derived from the assignment once, when the state is first
/// solved, and kept in its policy entry. Successors intersect the parent's candidates with a
/// single value mask.
pub struct AssignmentDp<'a> {
    index: &'a ObjectIndex,
}

impl<'a> AssignmentDp<'a> {
    pub fn new(index: &'a ObjectIndex) -> Self {
        Self { index }
    }
}

impl Dp for AssignmentDp<'_> {
    type State = Assignment;

    fn get_index(&self) -> &ObjectIndex {
        self.index
    }

    fn get_target(&self) -> Self::State {
        smallvec![None; self.index.attribute_count()]
    }

    fn get_candidates(&self, state: &Self::State) -> Result<FixedBitSet> {
        if state.len() != self.index.attribute_count() {
            return Err(OracleError::InvalidState(format!(
                "expected {} attributes, got {}",
                self.index.attribute_count(),
                state.len()
            )));
        }

        let mut candidates = self.index.universe().clone();

        for (attribute, value) in state.iter().enumerate() {
            let Some(value) = value.map(|value| value as usize) else {
                continue;
            };

            if value >= self.index.values(attribute).len() {
                return Err(OracleError::InvalidState(format!(
                    "value {} is out of range for attribute `{}`",
                    value,
                    self.index.attributes()[attribute]
                )));
            }

            candidates.intersect_with(self.index.mask(attribute, value));
        }

        Ok(candidates)
    }

    fn get_queries(&self, state: &Self::State) -> impl IntoIterator<Item = usize> {
        state
            .iter()
            .enumerate()
            .filter_map(|(attribute, value)| value.is_none().then_some(attribute))
    }

    fn get_successor(&self, state: &Self::State, attribute: usize, part: &Part) -> Self::State {
        let mut successor = state.clone();
        successor[attribute] = Some(part.value as u32);

        successor
    }
}

/// Creates a search over partial assignments.
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
/// let mut subset = solvers::create_subset_search(&index, parameters.clone());
/// let mut assignment = solvers::create_assignment_search(&index, parameters);
/// assert_eq!(subset.solve().unwrap().cost, assignment.solve().unwrap().cost);
/// ```
pub fn create_assignment_search(
    index: &ObjectIndex,
    parameters: Parameters,
) -> MemoizedSearch<AssignmentDp<'_>> {
    MemoizedSearch::new(AssignmentDp::new(index), parameters)
}
