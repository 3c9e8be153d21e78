use crate::error::{OracleError, Result};
use crate::index::{ObjectIndex, ObjectTable};
use crate::simulation::Curve;
use crate::solvers::Solution;
use crate::tree::Tree;
use itertools::Itertools;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header of the curve CSV.
pub const CURVE_HEADER: &str = "turn,expected_candidates,expected_entropy_bits,resolved_mass";

/// Parses an object table from a JSON object mapping ids to attribute objects.
///
/// # Examples
///
/// ```
/// use kary_oracle::io;
/// use kary_oracle::Value;
///
/// let table = io::parse_object_table(r#"{"cat": {"legs": 4, "fur": true}}"#).unwrap();
/// assert_eq!(table["cat"]["legs"], Value::Int(4));
/// assert_eq!(table["cat"]["fur"], Value::Bool(true));
/// ```
pub fn parse_object_table(input: &str) -> Result<ObjectTable> {
    Ok(serde_json::from_str(input)?)
}

/// Reads an object table from a JSON file.
pub fn read_object_table(path: impl AsRef<Path>) -> Result<ObjectTable> {
    let path = path.as_ref();
    let input = fs::read_to_string(path)
        .map_err(|e| OracleError::io(format!("cannot read `{}`", path.display()), e))?;

    parse_object_table(&input)
}

fn create(path: &Path) -> Result<BufWriter<fs::File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| OracleError::io(format!("cannot create `{}`", path.display()), e))?;

    Ok(BufWriter::new(file))
}

/// Writes a decision tree as pretty-printed JSON.
pub fn write_tree_json(tree: &Tree, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, tree)?;
    writer
        .flush()
        .map_err(|e| OracleError::io(format!("cannot write `{}`", path.display()), e))
}

/// Formats a curve as CSV with six decimals per expectation.
///
/// # Examples
///
/// ```
/// use kary_oracle::io;
/// use kary_oracle::simulation::TurnStatistics;
///
/// let curve = vec![TurnStatistics {
///     turn: 0,
///     expected_candidates: 2.0,
///     expected_entropy_bits: 1.0,
///     resolved_mass: 0.0,
/// }];
/// let csv = io::format_curve_csv(&curve);
/// assert_eq!(
///     csv,
///     "turn,expected_candidates,expected_entropy_bits,resolved_mass\n0,2.000000,1.000000,0.000000\n"
/// );
/// ```
pub fn format_curve_csv(curve: &Curve) -> String {
    let mut csv = format!("{}\n", CURVE_HEADER);

    for row in curve {
        let line = [
            row.turn.to_string(),
            format!("{:.6}", row.expected_candidates),
            format!("{:.6}", row.expected_entropy_bits),
            format!("{:.6}", row.resolved_mass),
        ]
        .iter()
        .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }

    csv
}

/// Writes a curve to a CSV file.
pub fn write_curve_csv(curve: &Curve, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    writer
        .write_all(format_curve_csv(curve).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| OracleError::io(format!("cannot write `{}`", path.display()), e))
}

/// Formats the size of the instance and the optimal cost.
///
/// # Examples
///
/// ```
/// use kary_oracle::prelude::*;
/// use kary_oracle::{io, solvers};
///
/// let table = io::parse_object_table(r#"{"cat": {"fur": true}, "crow": {"fur": false}}"#).unwrap();
/// let index = ObjectIndex::new(&table).unwrap();
/// let mut search = solvers::create_subset_search(&index, Parameters::default());
/// let solution = search.solve().unwrap();
///
/// let statistics = io::format_solution_statistics(&index, &solution);
/// assert!(statistics.starts_with("Objects: 2, Attributes: 1\n"));
/// assert!(statistics.contains("(uniform prior): 1.000000\n"));
/// io::print_solution_statistics(&index, &solution);
/// ```
pub fn format_solution_statistics(index: &ObjectIndex, solution: &Solution) -> String {
    format!(
        "Objects: {}, Attributes: {}\n\
         Optimal expected number of queries (uniform prior): {:.6}\n\
         States: {}\n\
         Search time: {}s\n",
        index.len(),
        index.attribute_count(),
        solution.cost,
        solution.states,
        solution.time
    )
}

/// Print the size of the instance and the optimal cost.
pub fn print_solution_statistics(index: &ObjectIndex, solution: &Solution) {
    print!("{}", format_solution_statistics(index, solution));
}
