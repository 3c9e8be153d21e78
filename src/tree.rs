//! Decision trees read from a solved policy.

use crate::dp::Dp;
use crate::error::{OracleError, Result};
use crate::index::{Attributes, Value};
use crate::solvers::PolicyView;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

/// Decision tree.
///
/// Serialized with a `type` tag, e.g. `{"type": "leaf", "size": 1, "ids": ["cat"]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Tree {
    /// At most one candidate, or candidates no attribute can tell apart.
    Leaf { size: usize, ids: Vec<String> },
    /// Ask `attribute` and follow the branch of the answer.
    Node {
        attribute: String,
        size: usize,
        children: Vec<Branch>,
    },
}

/// Child of a node, reached when the asked attribute has `value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub value: Value,
    pub subset_size: usize,
    pub subtree: Tree,
}

impl Tree {
    /// Number of candidates at the root of the tree.
    pub fn size(&self) -> usize {
        match self {
            Tree::Leaf { size, .. } | Tree::Node { size, .. } => *size,
        }
    }

    /// Returns whether the tree is a single leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf { .. })
    }

    /// Maximum number of queries along any path.
    pub fn depth(&self) -> usize {
        match self {
            Tree::Leaf { .. } => 0,
            Tree::Node { children, .. } => {
                1 + children
                    .iter()
                    .map(|branch| branch.subtree.depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf { .. } => 1,
            Tree::Node { children, .. } => children
                .iter()
                .map(|branch| branch.subtree.leaf_count())
                .sum(),
        }
    }

    /// Expected number of queries under a uniform prior over the root candidates.
    ///
    /// For a tree built from an optimal policy, this is the optimal cost of its root.
    pub fn expected_queries(&self) -> f64 {
        match self {
            Tree::Leaf { .. } => 0.0,
            Tree::Node { size, children, .. } => {
                let mut residual = 0.0;

                for branch in children {
                    let weight = branch.subset_size as f64 / *size as f64;
                    residual += weight * branch.subtree.expected_queries();
                }

                1.0 + residual
            }
        }
    }

    /// Follows the branches matching an object's attributes and returns the ids at the leaf.
    ///
    /// Returns `None` if the object has no value for an asked attribute, or a value no branch
    /// holds.
    pub fn classify(&self, attributes: &Attributes) -> Option<&[String]> {
        let mut tree = self;

        loop {
            match tree {
                Tree::Leaf { ids, .. } => return Some(ids.as_slice()),
                Tree::Node {
                    attribute,
                    children,
                    ..
                } => {
                    let value = attributes.get(attribute)?;
                    tree = &children
                        .iter()
                        .find(|branch| branch.value == *value)?
                        .subtree;
                }
            }
        }
    }
}

/// Reconstructs the decision tree of the optimal policy below `state`.
///
/// The policy must have been computed for `state` first; reaching a splittable state without a
/// policy entry is an `InvariantViolation`.
///
/// # Examples
///
/// ```
/// use kary_oracle::prelude::*;
/// use kary_oracle::solvers;
/// use kary_oracle::tree::{self, Tree};
///
/// let table: ObjectTable = serde_json::from_str(
///     r#"{"cat": {"flies": false}, "crow": {"flies": true}}"#,
/// ).unwrap();
/// let index = ObjectIndex::new(&table).unwrap();
/// let mut search = solvers::create_subset_search(&index, Parameters::default());
/// search.solve().unwrap();
///
/// let tree = tree::build_tree(&search.policy(), index.universe()).unwrap();
/// assert_eq!(tree.depth(), 1);
/// assert_eq!(tree.leaf_count(), 2);
/// let Tree::Node { attribute, children, .. } = tree else { panic!() };
/// assert_eq!(attribute, "flies");
/// assert_eq!(children[0].value, Value::Bool(false));
/// assert_eq!(children[0].subtree, Tree::Leaf { size: 1, ids: vec![String::from("cat")] });
/// ```
pub fn build_tree<D: Dp>(policy: &PolicyView<'_, D>, state: &D::State) -> Result<Tree> {
    let candidates = policy.candidates(state)?;

    build(policy, state, &candidates)
}

fn build<D: Dp>(
    policy: &PolicyView<'_, D>,
    state: &D::State,
    candidates: &FixedBitSet,
) -> Result<Tree> {
    let index = policy.index();
    let size = candidates.count_ones(..);
    let leaf = || Tree::Leaf {
        size,
        ids: index.ids_of(candidates),
    };

    if size <= 1 {
        return Ok(leaf());
    }

    let entry = policy.get(state).ok_or_else(|| {
        OracleError::InvariantViolation(format!(
            "no policy entry for a state with {} candidates",
            size
        ))
    })?;

    let Some(attribute) = entry.attribute else {
        return Ok(leaf());
    };

    let children = policy.children(state, candidates, attribute)?;

    if children.len() < 2 {
        return Err(OracleError::InvariantViolation(format!(
            "recorded attribute `{}` does not split its state",
            index.attributes()[attribute]
        )));
    }

    let children = children
        .into_iter()
        .map(|(successor, part)| {
            Ok(Branch {
                value: index.values(attribute)[part.value].clone(),
                subset_size: part.size,
                subtree: build(policy, &successor, &part.candidates)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Tree::Node {
        attribute: index.attributes()[attribute].clone(),
        size,
        children,
    })
}
