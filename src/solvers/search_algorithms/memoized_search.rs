use super::policy_registry::{PolicyEntry, PolicyRegistry, PolicyView};
use crate::dp::Dp;
use crate::error::{OracleError, Result};
use crate::timer::Timer;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info};

/// Search parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Maximum number of distinct states to solve.
    pub state_limit: Option<usize>,
    /// Time limit in seconds for one call.
    pub time_limit: Option<f64>,
    /// Initial capacity of the policy registry.
    pub initial_registry_capacity: Option<usize>,
    /// Whether to suppress summary logs.
    pub quiet: bool,
}

/// Solution information.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Solution {
    /// Optimal expected number of queries from the target state.
    pub cost: f64,
    /// Number of states in the policy registry.
    pub states: usize,
    /// Elapsed time in seconds.
    pub time: f64,
}

/// Memoized depth-first evaluation of the expected-cost recurrence.
///
/// Each distinct state is solved at most once, and its [`PolicyEntry`] is written after all of
/// its successors are solved. The recursion depth is bounded by the number of attributes,
/// since an attribute that has split a state cannot split any of its successors.
///
/// If a call fails, the entries it recorded are removed again, so a policy view never exposes
/// the entries of an unfinished computation. Entries of earlier successful calls are kept.
/// Limits apply to each call separately.
pub struct MemoizedSearch<D: Dp> {
    dp: D,
    parameters: Parameters,
    registry: PolicyRegistry<D::State>,
    // States recorded by the running call.
    recorded: Vec<D::State>,
    expanded: usize,
    timer: Timer,
}

impl<D: Dp> MemoizedSearch<D> {
    /// Creates a new search.
    pub fn new(dp: D, parameters: Parameters) -> Self {
        let registry = parameters
            .initial_registry_capacity
            .map(PolicyRegistry::with_capacity)
            .unwrap_or_default();
        let timer = Timer::new(parameters.time_limit);

        Self {
            dp,
            parameters,
            registry,
            recorded: Vec::new(),
            expanded: 0,
            timer,
        }
    }

    /// Returns the state encoding.
    pub fn dp(&self) -> &D {
        &self.dp
    }

    /// Returns the parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns a read-only view of the policy table.
    pub fn policy(&self) -> PolicyView<'_, D> {
        PolicyView::new(&self.dp, &self.registry)
    }

    /// Computes the optimal expected number of queries from a state.
    ///
    /// On success, every state reachable from `state` under the optimal policy has a policy
    /// entry.
    pub fn optimal_cost(&mut self, state: &D::State) -> Result<f64> {
        if let Some(entry) = self.registry.get(state) {
            return Ok(entry.cost);
        }

        let candidates = self.dp.get_candidates(state)?;
        debug!(
            candidates = candidates.count_ones(..),
            registered = self.registry.len(),
            "solving state"
        );
        self.timer.restart();
        self.expanded = 0;

        let result = self.visit(state.clone(), candidates);

        if result.is_err() {
            for state in &self.recorded {
                self.registry.remove(state);
            }
        }

        self.recorded.clear();

        result
    }

    /// Solves the target state.
    pub fn solve(&mut self) -> Result<Solution> {
        let target = self.dp.get_target();
        let cost = self.optimal_cost(&target)?;
        let solution = Solution {
            cost,
            states: self.registry.len(),
            time: self.timer.get_elapsed_time(),
        };

        if !self.parameters.quiet {
            info!(
                cost = solution.cost,
                states = solution.states,
                time = solution.time,
                "solved"
            );
        }

        Ok(solution)
    }

    fn check_limits(&self) -> Result<()> {
        if let Some(limit) = self.parameters.state_limit {
            if self.expanded >= limit {
                return Err(OracleError::ResourceExhausted(format!(
                    "state limit of {} reached",
                    limit
                )));
            }
        }

        if self.timer.check_time_limit() {
            return Err(OracleError::ResourceExhausted(format!(
                "time limit reached after {:.3}s",
                self.timer.get_elapsed_time()
            )));
        }

        Ok(())
    }

    fn record(
        &mut self,
        state: D::State,
        candidates: FixedBitSet,
        cost: f64,
        attribute: Option<usize>,
    ) -> Result<()> {
        let entry = PolicyEntry {
            candidates: (!self.dp.is_candidate_set()).then_some(candidates),
            cost,
            attribute,
        };
        self.registry.insert(state.clone(), entry)?;
        self.recorded.push(state);

        Ok(())
    }

    fn visit(&mut self, state: D::State, candidates: FixedBitSet) -> Result<f64> {
        if let Some(entry) = self.registry.get(&state) {
            return Ok(entry.cost);
        }

        self.check_limits()?;
        self.expanded += 1;

        let size = candidates.count_ones(..);

        if size <= 1 {
            self.record(state, candidates, 0.0, None)?;

            return Ok(0.0);
        }

        let queries = self
            .dp
            .get_queries(&state)
            .into_iter()
            .collect::<SmallVec<[usize; 16]>>();
        let mut best: Option<(usize, f64)> = None;

        for attribute in queries {
            let partition = self.dp.get_index().partition(&candidates, attribute)?;

            if partition.len() < 2 {
                continue;
            }

            let mut residual = 0.0;

            for part in partition {
                let weight = part.size as f64 / size as f64;
                let successor = self.dp.get_successor(&state, attribute, &part);
                residual += weight * self.visit(successor, part.candidates)?;
            }

            let cost = 1.0 + residual;

            // Strict comparison keeps the first attribute among ties.
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((attribute, cost));
            }
        }

        let (attribute, cost) = match best {
            Some((attribute, cost)) => (Some(attribute), cost),
            None => (None, 0.0),
        };
        self.record(state, candidates, cost, attribute)?;

        Ok(cost)
    }
}
