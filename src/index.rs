//! Object tables and the bitmask index built over them.
//!
//! Every object gets a dense index in sorted-id order, and every realized
//! (attribute, value) pair gets the [`FixedBitSet`] of objects holding it.
//! Candidate sets handled by the solvers are bitsets over the same indices.

use crate::error::{OracleError, Result};
use fixedbitset::FixedBitSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Categorical attribute value.
///
/// Values are unordered categories for the purpose of querying; the derived
/// ordering only fixes the enumeration order of attribute domains.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// Attributes of one object.
pub type Attributes = BTreeMap<String, Value>;

/// Object table: object id -> attribute name -> value.
pub type ObjectTable = BTreeMap<String, Attributes>;

/// One block of an attribute-value partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    /// Index of the value in the attribute's realized domain.
    pub value: usize,
    /// Candidates holding the value.
    pub candidates: FixedBitSet,
    /// Number of candidates.
    pub size: usize,
}

/// Non-empty proper blocks of a candidate set split by one attribute, in value order.
pub type Partition = SmallVec<[Part; 4]>;

/// Read-only index over an object table.
#[derive(Clone, Debug)]
pub struct ObjectIndex {
    ids: Vec<String>,
    attributes: Vec<String>,
    values: Vec<Vec<Value>>,
    masks: Vec<Vec<FixedBitSet>>,
    defined: Vec<FixedBitSet>,
    universe: FixedBitSet,
}

impl ObjectIndex {
    /// Builds the index.
    ///
    /// Attributes are the union of the attribute names over all objects, and the domain
    /// of each attribute is the set of values actually observed.
    ///
    /// # Examples
    ///
    /// ```
    /// use kary_oracle::index::{ObjectIndex, ObjectTable, Value};
    ///
    /// let table: ObjectTable = serde_json::from_str(
    ///     r#"{"cat": {"fur": true}, "frog": {"fur": false}, "dog": {"fur": true}}"#,
    /// ).unwrap();
    /// let index = ObjectIndex::new(&table).unwrap();
    ///
    /// assert_eq!(index.ids(), ["cat", "dog", "frog"]);
    /// assert_eq!(index.values(0), [Value::Bool(false), Value::Bool(true)]);
    /// assert_eq!(index.ids_of(index.mask(0, 1)), vec!["cat", "dog"]);
    /// ```
    pub fn new(table: &ObjectTable) -> Result<Self> {
        if table.is_empty() {
            return Err(OracleError::EmptyUniverse);
        }

        let n = table.len();
        let ids = table.keys().cloned().collect::<Vec<_>>();
        let attributes = table
            .values()
            .flat_map(|object| object.keys())
            .sorted()
            .dedup()
            .cloned()
            .collect::<Vec<_>>();
        let values = attributes
            .iter()
            .map(|attribute| {
                table
                    .values()
                    .filter_map(|object| object.get(attribute))
                    .sorted()
                    .dedup()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let mut masks = values
            .iter()
            .map(|domain| vec![FixedBitSet::with_capacity(n); domain.len()])
            .collect::<Vec<_>>();
        let mut defined = vec![FixedBitSet::with_capacity(n); attributes.len()];

        for (i, object) in table.values().enumerate() {
            for (name, value) in object {
                // Both lookups succeed since the tables were built from the same objects.
                let Ok(a) = attributes.binary_search(name) else {
                    continue;
                };
                let Ok(v) = values[a].binary_search(value) else {
                    continue;
                };
                masks[a][v].insert(i);
                defined[a].insert(i);
            }
        }

        let mut universe = FixedBitSet::with_capacity(n);
        universe.insert_range(..);

        Ok(Self {
            ids,
            attributes,
            values,
            masks,
            defined,
            universe,
        })
    }

    /// Checks that every object has a value for every attribute.
    pub fn validate(&self) -> Result<()> {
        (0..self.attributes.len()).try_for_each(|a| self.check_defined(&self.universe, a))
    }

    fn check_defined(&self, candidates: &FixedBitSet, attribute: usize) -> Result<()> {
        match candidates.difference(&self.defined[attribute]).next() {
            Some(object) => Err(OracleError::MalformedInput {
                object: self.ids[object].clone(),
                attribute: self.attributes[attribute].clone(),
            }),
            None => Ok(()),
        }
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false, since an index cannot be built over an empty table.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Object ids in index order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Attribute names in index order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Number of attributes.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Realized domain of an attribute, sorted.
    pub fn values(&self, attribute: usize) -> &[Value] {
        &self.values[attribute]
    }

    /// Objects holding a value.
    pub fn mask(&self, attribute: usize, value: usize) -> &FixedBitSet {
        &self.masks[attribute][value]
    }

    /// Candidate set containing every object.
    pub fn universe(&self) -> &FixedBitSet {
        &self.universe
    }

    /// Index of an object id.
    pub fn object_index(&self, id: &str) -> Option<usize> {
        self.ids.binary_search_by(|x| x.as_str().cmp(id)).ok()
    }

    /// Index of an attribute name.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes
            .binary_search_by(|x| x.as_str().cmp(name))
            .ok()
    }

    /// Index of a value in an attribute's domain.
    pub fn value_index(&self, attribute: usize, value: &Value) -> Option<usize> {
        self.values[attribute].binary_search(value).ok()
    }

    /// Value an object holds for an attribute.
    pub fn value_of(&self, object: usize, attribute: usize) -> Option<&Value> {
        self.masks[attribute]
            .iter()
            .position(|mask| mask.contains(object))
            .map(|v| &self.values[attribute][v])
    }

    /// Ids of the objects in a candidate set.
    pub fn ids_of(&self, candidates: &FixedBitSet) -> Vec<String> {
        candidates.ones().map(|i| self.ids[i].clone()).collect()
    }

    /// Splits a candidate set by an attribute.
    ///
    /// Only non-empty blocks that are proper subsets of `candidates` are returned, so an
    /// attribute on which all candidates agree yields an empty partition.
    /// Fails with `MalformedInput` if a candidate has no value for the attribute.
    pub fn partition(&self, candidates: &FixedBitSet, attribute: usize) -> Result<Partition> {
        self.check_defined(candidates, attribute)?;

        let size = candidates.count_ones(..);
        let mut partition = Partition::new();

        for (value, mask) in self.masks[attribute].iter().enumerate() {
            let count = candidates.intersection_count(mask);

            if count == 0 || count == size {
                continue;
            }

            partition.push(Part {
                value,
                candidates: candidates & mask,
                size: count,
            });
        }

        Ok(partition)
    }
}
