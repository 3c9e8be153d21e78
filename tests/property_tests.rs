//! Property-based tests for the solvers, trees and curves.

use proptest::prelude::*;
use std::collections::BTreeSet;

use kary_oracle::prelude::*;
use kary_oracle::solvers::{create_assignment_search, create_subset_search};
use kary_oracle::simulation;
use kary_oracle::tree::{self, Tree};

fn quiet() -> Parameters {
    Parameters {
        quiet: true,
        ..Default::default()
    }
}

/// Strategy: rows of 1-7 objects over 1-4 attributes with up to three values each.
fn rows_strategy() -> impl Strategy<Value = Vec<Vec<i64>>> {
    (1..=7usize, 1..=4usize).prop_flat_map(|(n, d)| {
        prop::collection::vec(prop::collection::vec(0..3i64, d), n)
    })
}

fn table_of(rows: &[Vec<i64>], attributes: usize) -> ObjectTable {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let object = row
                .iter()
                .take(attributes)
                .enumerate()
                .map(|(a, value)| (format!("a{}", a), Value::Int(*value)))
                .collect();
            (format!("o{}", i), object)
        })
        .collect()
}

fn subset_cost(table: &ObjectTable) -> f64 {
    let index = ObjectIndex::new(table).unwrap();
    let mut search = create_subset_search(&index, quiet());
    search.solve().unwrap().cost
}

proptest! {
    // 1. Cost is zero exactly for singletons and irreducible universes
    #[test]
    fn cost_zero_iff_unsplittable(rows in rows_strategy()) {
        let table = table_of(&rows, rows[0].len());
        let cost = subset_cost(&table);
        let irreducible = rows.iter().all(|row| *row == rows[0]);
        prop_assert!(cost >= 0.0, "cost={cost}");
        prop_assert_eq!(cost == 0.0, irreducible, "cost={}", cost);
    }

    // 2. Both encodings give bit-identical root costs
    #[test]
    fn encodings_agree(rows in rows_strategy()) {
        let table = table_of(&rows, rows[0].len());
        let index = ObjectIndex::new(&table).unwrap();
        let mut subset = create_subset_search(&index, quiet());
        let mut assignment = create_assignment_search(&index, quiet());
        prop_assert_eq!(
            subset.solve().unwrap().cost,
            assignment.solve().unwrap().cost
        );
    }

    // 3. Every assignment state costs what its candidate set costs
    #[test]
    fn assignment_costs_match_subset_costs(rows in rows_strategy()) {
        let table = table_of(&rows, rows[0].len());
        let index = ObjectIndex::new(&table).unwrap();
        let mut subset = create_subset_search(&index, quiet());
        let mut assignment = create_assignment_search(&index, quiet());
        assignment.solve().unwrap();

        for (state, entry) in assignment.policy().iter() {
            let candidates = entry.candidates.as_ref().unwrap();
            let cost = subset.optimal_cost(candidates).unwrap();
            prop_assert_eq!(entry.cost, cost, "state={:?}", state);
        }
    }

    // 4. More attributes never cost more once every object is identifiable
    #[test]
    fn extra_attribute_never_hurts(rows in rows_strategy()) {
        let d = rows[0].len();
        prop_assume!(d >= 2);
        let distinct = rows.iter().map(|row| &row[..d - 1]).collect::<BTreeSet<_>>();
        prop_assume!(distinct.len() == rows.len());
        let fewer = subset_cost(&table_of(&rows, d - 1));
        let more = subset_cost(&table_of(&rows, d));
        prop_assert!(more <= fewer + 1e-12, "more={more} fewer={fewer}");
    }

    // 5. Walking the tree with an object's values reaches a leaf holding it
    #[test]
    fn tree_is_sound(rows in rows_strategy()) {
        let table = table_of(&rows, rows[0].len());
        let index = ObjectIndex::new(&table).unwrap();
        let mut search = create_subset_search(&index, quiet());
        let cost = search.solve().unwrap().cost;
        let tree = tree::build_tree(&search.policy(), index.universe()).unwrap();

        prop_assert_eq!(tree.size(), rows.len());
        prop_assert_eq!(tree.expected_queries(), cost);
        prop_assert!(tree.depth() <= rows[0].len());
        for (id, attributes) in &table {
            let ids = tree.classify(attributes);
            prop_assert!(ids.is_some_and(|ids| ids.contains(id)), "id={}", id);
        }
    }

    // 6. Resolved mass never decreases and the curve sums to the cost
    #[test]
    fn curve_resolves_monotonically(rows in rows_strategy()) {
        let table = table_of(&rows, rows[0].len());
        let index = ObjectIndex::new(&table).unwrap();
        let mut search = create_subset_search(&index, quiet());
        let cost = search.solve().unwrap().cost;
        let curve = simulation::simulate(&search.policy(), index.universe(), None).unwrap();

        for pair in curve.windows(2) {
            prop_assert!(pair[1].resolved_mass >= pair[0].resolved_mass - 1e-12);
            prop_assert!(pair[1].expected_candidates <= pair[0].expected_candidates + 1e-12);
        }
        let last = curve.last().unwrap();
        prop_assert!(last.resolved_mass >= 1.0 - 1e-9);
        let unresolved = curve.iter().map(|row| 1.0 - row.resolved_mass).sum::<f64>();
        prop_assert!((unresolved - cost).abs() < 1e-9, "unresolved={unresolved} cost={cost}");
    }
}

#[test]
fn scenario_single_difference() {
    let table: ObjectTable =
        serde_json::from_str(r#"{"a": {"p": true}, "b": {"p": false}}"#).unwrap();
    let index = ObjectIndex::new(&table).unwrap();
    let mut search = create_subset_search(&index, quiet());
    assert_eq!(search.solve().unwrap().cost, 1.0);

    let tree = tree::build_tree(&search.policy(), index.universe()).unwrap();
    let Tree::Node {
        attribute,
        children,
        ..
    } = tree
    else {
        panic!("expected a node");
    };
    assert_eq!(attribute, "p");
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|branch| branch.subtree.is_leaf()));
}

#[test]
fn extra_attribute_can_split_irreducible_class() {
    // The pair is irreducible under `a0` alone and costs nothing; `a1` makes it cost a query.
    let rows = vec![vec![0, 2], vec![0, 0]];
    assert_eq!(subset_cost(&table_of(&rows, 1)), 0.0);
    assert_eq!(subset_cost(&table_of(&rows, 2)), 1.0);
}

#[test]
fn scenario_two_balanced_booleans() {
    let table: ObjectTable = serde_json::from_str(
        r#"{
            "a": {"p": false, "q": false},
            "b": {"p": false, "q": true},
            "c": {"p": true, "q": false},
            "d": {"p": true, "q": true}
        }"#,
    )
    .unwrap();
    let index = ObjectIndex::new(&table).unwrap();
    let mut subset = create_subset_search(&index, quiet());
    let mut assignment = create_assignment_search(&index, quiet());
    assert_eq!(subset.solve().unwrap().cost, 2.0);
    assert_eq!(assignment.solve().unwrap().cost, 2.0);
}

#[test]
fn scenario_identical_objects() {
    let table: ObjectTable = serde_json::from_str(
        r#"{"a": {"p": 1, "q": "x"}, "b": {"p": 1, "q": "x"}, "c": {"p": 1, "q": "x"}}"#,
    )
    .unwrap();
    let index = ObjectIndex::new(&table).unwrap();
    let mut search = create_subset_search(&index, quiet());
    assert_eq!(search.solve().unwrap().cost, 0.0);

    let tree = tree::build_tree(&search.policy(), index.universe()).unwrap();
    assert_eq!(
        tree,
        Tree::Leaf {
            size: 3,
            ids: vec![String::from("a"), String::from("b"), String::from("c")],
        }
    );
}

#[test]
fn scenario_curve_of_single_difference() {
    let table: ObjectTable =
        serde_json::from_str(r#"{"a": {"p": true}, "b": {"p": false}}"#).unwrap();
    let index = ObjectIndex::new(&table).unwrap();
    let mut search = create_subset_search(&index, quiet());
    search.solve().unwrap();

    let curve = simulation::simulate(&search.policy(), index.universe(), None).unwrap();
    assert_eq!(curve.len(), 2);
    assert_eq!(curve[0].turn, 0);
    assert_eq!(curve[0].expected_candidates, 2.0);
    assert_eq!(curve[0].resolved_mass, 0.0);
    assert_eq!(curve[1].turn, 1);
    assert_eq!(curve[1].resolved_mass, 1.0);
}

#[test]
fn empty_table_is_rejected() {
    let table = ObjectTable::new();
    assert!(matches!(
        ObjectIndex::new(&table),
        Err(OracleError::EmptyUniverse)
    ));
}
