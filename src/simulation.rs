//! Forward propagation of the optimal policy, turn by turn.
//!
//! Starting from the root with probability 1, every turn splits each unresolved state by its
//! recorded attribute and hands each block `|block| / |state|` of the state's mass. Leaf
//! states keep their mass. The distribution is exact, there is no sampling.

use crate::dp::Dp;
use crate::error::Result;
use crate::solvers::PolicyView;
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resolved mass at which the propagation stops.
pub const RESOLUTION_TOLERANCE: f64 = 1e-12;

/// Expectations over the state distribution at the start of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnStatistics {
    /// Number of queries asked so far.
    pub turn: usize,
    /// Expected number of candidates.
    pub expected_candidates: f64,
    /// Expected `log2` of the number of candidates.
    pub expected_entropy_bits: f64,
    /// Probability that the policy has already stopped.
    pub resolved_mass: f64,
}

/// Per-turn statistics, one row per turn starting at turn 0.
pub type Curve = Vec<TurnStatistics>;

struct Mass<S> {
    state: S,
    candidates: FixedBitSet,
    size: usize,
    probability: f64,
    // `None` for absorbing states.
    attribute: Option<usize>,
}

impl<S> Mass<S> {
    fn new<D>(
        policy: &PolicyView<'_, D>,
        state: S,
        candidates: FixedBitSet,
        probability: f64,
    ) -> Self
    where
        D: Dp<State = S>,
    {
        let size = candidates.count_ones(..);
        // A state without a policy entry is treated as absorbing.
        let attribute = if size <= 1 {
            None
        } else {
            policy.get(&state).and_then(|entry| entry.attribute)
        };

        Self {
            state,
            candidates,
            size,
            probability,
            attribute,
        }
    }

    fn entropy_bits(&self) -> f64 {
        if self.size <= 1 {
            0.0
        } else {
            (self.size as f64).log2()
        }
    }
}

fn add<S: std::hash::Hash + Eq + Clone>(
    distribution: &mut Vec<Mass<S>>,
    positions: &mut FxHashMap<S, usize>,
    mass: Mass<S>,
) {
    if let Some(&i) = positions.get(&mass.state) {
        distribution[i].probability += mass.probability;
    } else {
        positions.insert(mass.state.clone(), distribution.len());
        distribution.push(mass);
    }
}

/// Propagates the optimal policy from `root` and records the curve.
///
/// Stops once the resolved mass reaches `1 - RESOLUTION_TOLERANCE`, or after the row of turn
/// `max_turns` if a cap is given.
///
/// # Examples
///
/// ```
/// use kary_oracle::prelude::*;
/// use kary_oracle::simulation;
/// use kary_oracle::solvers;
///
/// let table: ObjectTable = serde_json::from_str(
///     r#"{"cat": {"flies": false}, "crow": {"flies": true}}"#,
/// ).unwrap();
/// let index = ObjectIndex::new(&table).unwrap();
/// let mut search = solvers::create_subset_search(&index, Parameters::default());
/// search.solve().unwrap();
///
/// let curve = simulation::simulate(&search.policy(), index.universe(), None).unwrap();
/// assert_eq!(curve.len(), 2);
/// assert_eq!(curve[0].expected_candidates, 2.0);
/// assert_eq!(curve[0].resolved_mass, 0.0);
/// assert_eq!(curve[1].resolved_mass, 1.0);
/// ```
pub fn simulate<D: Dp>(
    policy: &PolicyView<'_, D>,
    root: &D::State,
    max_turns: Option<usize>,
) -> Result<Curve> {
    let candidates = policy.candidates(root)?;
    let mut distribution = vec![Mass::new(policy, root.clone(), candidates, 1.0)];
    let mut curve = Curve::new();

    for turn in 0.. {
        let mut expected_candidates = 0.0;
        let mut expected_entropy_bits = 0.0;
        let mut resolved_mass = 0.0;

        for mass in &distribution {
            expected_candidates += mass.probability * mass.size as f64;
            expected_entropy_bits += mass.probability * mass.entropy_bits();

            if mass.attribute.is_none() {
                resolved_mass += mass.probability;
            }
        }

        debug!(
            turn,
            states = distribution.len(),
            resolved_mass,
            "propagated policy"
        );
        curve.push(TurnStatistics {
            turn,
            expected_candidates,
            expected_entropy_bits,
            resolved_mass,
        });

        if resolved_mass >= 1.0 - RESOLUTION_TOLERANCE
            || max_turns.is_some_and(|max_turns| turn >= max_turns)
        {
            break;
        }

        let mut next = Vec::with_capacity(distribution.len() * 2);
        let mut positions = FxHashMap::default();

        for mass in distribution {
            let Some(attribute) = mass.attribute else {
                add(&mut next, &mut positions, mass);
                continue;
            };

            for (successor, part) in policy.children(&mass.state, &mass.candidates, attribute)? {
                let probability = mass.probability * (part.size as f64 / mass.size as f64);
                let child = Mass::new(policy, successor, part.candidates, probability);
                add(&mut next, &mut positions, child);
            }
        }

        distribution = next;
    }

    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ObjectIndex, ObjectTable};
    use crate::solvers::{create_assignment_search, create_subset_search, Parameters};
    use approx::assert_relative_eq;

    fn quiet() -> Parameters {
        Parameters {
            quiet: true,
            ..Default::default()
        }
    }

    fn index(json: &str) -> ObjectIndex {
        let table: ObjectTable = serde_json::from_str(json).unwrap();
        ObjectIndex::new(&table).unwrap()
    }

    #[test]
    fn test_two_objects() {
        let index = index(r#"{"a": {"p": true}, "b": {"p": false}}"#);
        let mut search = create_subset_search(&index, quiet());
        search.solve().unwrap();
        let curve = simulate(&search.policy(), index.universe(), None).unwrap();

        assert_eq!(
            curve,
            vec![
                TurnStatistics {
                    turn: 0,
                    expected_candidates: 2.0,
                    expected_entropy_bits: 1.0,
                    resolved_mass: 0.0,
                },
                TurnStatistics {
                    turn: 1,
                    expected_candidates: 1.0,
                    expected_entropy_bits: 0.0,
                    resolved_mass: 1.0,
                },
            ]
        );
    }

    #[test]
    fn test_uneven_resolution() {
        // Every attribute isolates a single object, so candidates shrink one at a time.
        let index = index(
            r#"{
                "a": {"p": 1, "q": 0, "r": 0},
                "b": {"p": 0, "q": 1, "r": 0},
                "c": {"p": 0, "q": 0, "r": 1},
                "d": {"p": 0, "q": 0, "r": 0}
            }"#,
        );
        let mut search = create_subset_search(&index, quiet());
        let cost = search.solve().unwrap().cost;
        assert_relative_eq!(cost, 2.25);

        let curve = simulate(&search.policy(), index.universe(), None).unwrap();
        assert_eq!(curve.len(), 4);
        assert_relative_eq!(curve[0].expected_candidates, 4.0);
        assert_relative_eq!(curve[1].resolved_mass, 0.25);
        assert_relative_eq!(curve[1].expected_candidates, 2.5);
        assert_relative_eq!(curve[2].expected_candidates, 1.5);
        assert_relative_eq!(curve[2].resolved_mass, 0.5);
        assert_relative_eq!(curve[2].expected_entropy_bits, 0.5);
        assert_relative_eq!(curve[3].resolved_mass, 1.0);

        // The expected number of turns spent before resolution is the optimal cost.
        let unresolved = curve.iter().map(|row| 1.0 - row.resolved_mass).sum::<f64>();
        assert_relative_eq!(unresolved, cost, epsilon = 1e-12);
    }

    #[test]
    fn test_turn_cap() {
        let index = index(
            r#"{
                "a": {"p": 0, "q": 0},
                "b": {"p": 0, "q": 1},
                "c": {"p": 1, "q": 0},
                "d": {"p": 1, "q": 1}
            }"#,
        );
        let mut search = create_subset_search(&index, quiet());
        search.solve().unwrap();

        let capped = simulate(&search.policy(), index.universe(), Some(1)).unwrap();
        assert_eq!(capped.len(), 2);
        assert_relative_eq!(capped[1].expected_candidates, 2.0);
        assert_eq!(capped[1].resolved_mass, 0.0);

        let only_root = simulate(&search.policy(), index.universe(), Some(0)).unwrap();
        assert_eq!(only_root.len(), 1);
    }

    #[test]
    fn test_irreducible_root_is_resolved() {
        let index = index(r#"{"a": {"p": 0}, "b": {"p": 0}, "c": {"p": 0}}"#);
        let mut search = create_subset_search(&index, quiet());
        search.solve().unwrap();
        let curve = simulate(&search.policy(), index.universe(), None).unwrap();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve[0].expected_candidates, 3.0);
        assert_relative_eq!(curve[0].expected_entropy_bits, 3f64.log2());
        assert_eq!(curve[0].resolved_mass, 1.0);
    }

    #[test]
    fn test_missing_policy_is_absorbing() {
        let index = index(r#"{"a": {"p": 0}, "b": {"p": 1}}"#);
        let search = create_subset_search(&index, quiet());
        let curve = simulate(&search.policy(), index.universe(), None).unwrap();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve[0].resolved_mass, 1.0);
    }

    #[test]
    fn test_assignment_policy_gives_same_curve() {
        let json = r#"{
            "a": {"p": 0, "q": 0, "r": 1},
            "b": {"p": 0, "q": 1, "r": 1},
            "c": {"p": 1, "q": 2, "r": 0},
            "d": {"p": 1, "q": 2, "r": 1},
            "e": {"p": 2, "q": 0, "r": 0}
        }"#;
        let index = index(json);
        let mut subset = create_subset_search(&index, quiet());
        subset.solve().unwrap();
        let mut assignment = create_assignment_search(&index, quiet());
        assignment.solve().unwrap();

        let from_subset = simulate(&subset.policy(), index.universe(), None).unwrap();
        let target = assignment.dp().get_target();
        let from_assignment = simulate(&assignment.policy(), &target, None).unwrap();
        assert_eq!(from_subset, from_assignment);
    }
}
