use crate::error::Result;
use crate::index::{ObjectIndex, Part};
use fixedbitset::FixedBitSet;
use std::hash::Hash;

/// Trait for state encodings of the question-asking dynamic program.
///
/// A state stands for a set of candidate objects that are still consistent with the answers
/// observed so far. The recurrence itself is implemented once by
/// [`MemoizedSearch`](crate::solvers::MemoizedSearch): the cost of a state is zero if it holds
/// at most one candidate or no query splits it, and otherwise the minimum over the queries of
/// one plus the expected cost of the successors under a uniform prior.
///
/// Implementations only decide how states are keyed, which attributes may be asked in a state,
/// and how a successor is encoded once an answer is observed.
/// Two states are the same memo entry iff they are equal.
///
/// # Examples
///
/// ```
/// use kary_oracle::index::Part;
/// use kary_oracle::prelude::*;
/// use fixedbitset::FixedBitSet;
///
/// // Candidate sets as states, but only the first attribute may ever be asked.
/// struct FirstOnly<'a> {
///     index: &'a ObjectIndex,
/// }
///
/// impl Dp for FirstOnly<'_> {
///     type State = FixedBitSet;
///
///     fn get_index(&self) -> &ObjectIndex {
///         self.index
///     }
///
///     fn get_target(&self) -> FixedBitSet {
///         self.index.universe().clone()
///     }
///
///     fn get_candidates(&self, state: &FixedBitSet) -> kary_oracle::Result<FixedBitSet> {
///         Ok(state.clone())
///     }
///
///     fn get_queries(&self, _: &FixedBitSet) -> impl IntoIterator<Item = usize> {
///         0..1
///     }
///
///     fn get_successor(&self, _: &FixedBitSet, _: usize, part: &Part) -> FixedBitSet {
///         part.candidates.clone()
///     }
/// }
///
/// let table: ObjectTable = serde_json::from_str(
///     r#"{"a": {"x": 0, "y": 0}, "b": {"x": 0, "y": 1}, "c": {"x": 1, "y": 1}}"#,
/// ).unwrap();
/// let index = ObjectIndex::new(&table).unwrap();
/// let parameters = Parameters {
///     quiet: true,
///     ..Default::default()
/// };
/// let mut search = MemoizedSearch::new(FirstOnly { index: &index }, parameters);
///
/// // Asking `x` separates `c`, and `{a, b}` is left as an irreducible class.
/// let solution = search.solve().unwrap();
/// assert_eq!(solution.cost, 1.0);
/// ```
pub trait Dp {
    /// Type of the state. Also used as the memo key.
    type State: Clone + Hash + Eq;

    /// Returns the index the states refer to.
    fn get_index(&self) -> &ObjectIndex;

    /// Gets the target (initial) state, standing for the whole universe.
    fn get_target(&self) -> Self::State;

    /// Derives the candidate set of a state.
    ///
    /// The search calls this only for states it did not reach through a split, since the
    /// candidates of a successor are known from the partition that produced it.
    ///
    /// Fails with `InvalidState` if the state does not fit the index.
    fn get_candidates(&self, state: &Self::State) -> Result<FixedBitSet>;

    /// Returns whether every state is its own candidate set.
    ///
    /// If so, policy entries do not keep a copy of the candidates.
    fn is_candidate_set(&self) -> bool {
        false
    }

    /// Gets the attributes that may be asked in a state, in ascending order.
    ///
    /// The order is the tie-breaking order: among queries with equal cost, the first one wins.
    fn get_queries(&self, state: &Self::State) -> impl IntoIterator<Item = usize>;

    /// Encodes the state reached by asking `attribute` and observing the value of `part`.
    fn get_successor(&self, state: &Self::State, attribute: usize, part: &Part) -> Self::State;
}
