use crate::dp::Dp;
use crate::error::{OracleError, Result};
use crate::index::{ObjectIndex, Part};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// Memo entry of a solved state.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyEntry {
    /// Candidates of the state, or `None` if the state is its own candidate set.
    pub candidates: Option<FixedBitSet>,
    /// Optimal expected number of queries from the state.
    pub cost: f64,
    /// Attribute to ask, or `None` if the state is not split any further.
    pub attribute: Option<usize>,
}

impl PolicyEntry {
    /// Returns whether the state is a leaf of the optimal policy.
    pub fn is_leaf(&self) -> bool {
        self.attribute.is_none()
    }
}

/// Write-once map from states to their policy entries.
pub struct PolicyRegistry<S> {
    map: FxHashMap<S, PolicyEntry>,
}

impl<S> Default for PolicyRegistry<S> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }
}

impl<S> PolicyRegistry<S>
where
    S: Hash + Eq,
{
    /// Creates a new registry with the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Gets the entry of a state.
    #[inline]
    pub fn get(&self, state: &S) -> Option<&PolicyEntry> {
        self.map.get(state)
    }

    /// Records the entry of a state.
    ///
    /// Fails if the state already has an entry, since entries are never overwritten.
    pub fn insert(&mut self, state: S, entry: PolicyEntry) -> Result<()> {
        match self.map.entry(state) {
            Entry::Occupied(_) => Err(OracleError::InvariantViolation(String::from(
                "policy entry recorded twice for the same state",
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(())
            }
        }
    }

    /// Removes the entry of a state.
    pub fn remove(&mut self, state: &S) -> Option<PolicyEntry> {
        self.map.remove(state)
    }

    /// Number of recorded states.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &PolicyEntry)> {
        self.map.iter()
    }
}

/// Read-only view of a finished policy table.
///
/// The view borrows the search immutably, so no entry can be written while it is alive.
pub struct PolicyView<'a, D: Dp> {
    dp: &'a D,
    registry: &'a PolicyRegistry<D::State>,
}

impl<D: Dp> Clone for PolicyView<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Dp> Copy for PolicyView<'_, D> {}

impl<'a, D: Dp> PolicyView<'a, D> {
    pub(crate) fn new(dp: &'a D, registry: &'a PolicyRegistry<D::State>) -> Self {
        Self { dp, registry }
    }

    /// Returns the state encoding.
    pub fn dp(&self) -> &'a D {
        self.dp
    }

    /// Returns the object index.
    pub fn index(&self) -> &'a ObjectIndex {
        self.dp.get_index()
    }

    /// Gets the entry of a state.
    pub fn get(&self, state: &D::State) -> Option<&'a PolicyEntry> {
        self.registry.get(state)
    }

    /// Candidates of a state, read from its entry if the entry keeps them.
    pub fn candidates(&self, state: &D::State) -> Result<FixedBitSet> {
        match self.get(state).and_then(|entry| entry.candidates.as_ref()) {
            Some(candidates) => Ok(candidates.clone()),
            None => self.dp.get_candidates(state),
        }
    }

    /// Number of recorded states.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Iterates over recorded states in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a D::State, &'a PolicyEntry)> {
        self.registry.iter()
    }

    /// Splits a state by `attribute` and encodes each block as a successor state.
    pub fn children(
        &self,
        state: &D::State,
        candidates: &FixedBitSet,
        attribute: usize,
    ) -> Result<SmallVec<[(D::State, Part); 4]>> {
        let partition = self.index().partition(candidates, attribute)?;

        Ok(partition
            .into_iter()
            .map(|part| (self.dp.get_successor(state, attribute, &part), part))
            .collect())
    }
}
