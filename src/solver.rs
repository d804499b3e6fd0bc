//! Engine-generic branch-and-cut driver for the PC-TSP.
//!
//! Validates the instance, builds the integer program into the supplied
//! engine, runs the search with the lazy subtour separator attached and
//! converts the final edge matrix into an ordered tour. The engine owns
//! termination; this driver never loops on its own.

use std::time::Instant;

use log::info;

use crate::engine::{MipModel, SolveStatus, SolverError};
use crate::instance::PcTspInstance;
use crate::model::build_model;
use crate::solution::{extract_tour, Solution};
use crate::subtour::SubtourSeparator;

/// Outcome of a PC-TSP solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Best solution found
    pub solution: Solution,
    /// Engine termination status
    pub status: SolveStatus,
    /// Objective value of the incumbent (total collected prize)
    pub objective: f64,
    /// Number of lazy subtour cuts submitted during the search
    pub cuts_added: usize,
    /// Number of integer-feasible candidates inspected
    pub candidates_seen: usize,
}

/// Solve a PC-TSP instance on the given engine model.
///
/// Infeasibility reported by the engine is surfaced unchanged as
/// `SolverError::Infeasible`. With the mandatory-depot policy the depot has
/// degree 2 in every feasible solution, so a budget below the cheapest
/// depot round trip is genuinely infeasible.
pub fn solve(
    instance: &PcTspInstance,
    model: &mut dyn MipModel,
    algorithm: &str,
) -> Result<SolveReport, SolverError> {
    let start = Instant::now();
    let vars = build_model(instance, model)?;

    let mut separator = SubtourSeparator::new(&vars);
    let status = model.solve(&mut separator)?;

    info!(
        "search finished: status={}, {} candidates, {} subtour cuts",
        status, separator.candidates_seen, separator.cuts_added
    );

    match status {
        SolveStatus::Infeasible => return Err(SolverError::Infeasible),
        SolveStatus::Unknown => {
            return Err(SolverError::Engine(
                "engine terminated without an incumbent".to_string(),
            ))
        }
        SolveStatus::Optimal | SolveStatus::Feasible | SolveStatus::TimeLimit => {}
    }

    let n = vars.n;
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            values[i][j] = model.value(vars.x[i][j])?;
        }
    }

    let tour = extract_tour(&mut values)?;
    let objective = model.objective_value()?;
    let mut solution = Solution::from_tour(instance, tour, algorithm);
    solution.computation_time = start.elapsed().as_secs_f64();

    Ok(SolveReport {
        solution,
        status,
        objective,
        cuts_added: separator.cuts_added,
        candidates_seen: separator.candidates_seen,
    })
}
