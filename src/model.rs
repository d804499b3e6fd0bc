//! Integer-program construction for the PC-TSP.
//!
//! Declares the edge-selection matrix `x[i][j]`, the visit indicators `v[i]`,
//! the prize-maximizing objective and the static constraints into any engine
//! implementing the `MipModel` contract. Subtour elimination is NOT declared
//! here; it is discovered lazily by the callback in `subtour`.

use crate::engine::{Constraint, ConstrSense, LinExpr, MipModel, Objective, SolverError, VarId};
use crate::instance::PcTspInstance;

/// Handles to the decision variables of a built PC-TSP model.
///
/// `x[i][j]` is 1 iff the edge between locations i and j is used by the tour;
/// the matrix is kept symmetric by linking constraints. `v[i]` is 1 iff
/// location i is visited.
#[derive(Debug, Clone)]
pub struct ModelVars {
    pub x: Vec<Vec<VarId>>,
    pub v: Vec<VarId>,
    pub n: usize,
}

/// Declare variables, objective and static constraints of the PC-TSP
/// integer program into `model`.
///
/// Constraints:
/// - budget: sum of dist[i][j] * x[i][j] over i < j is at most the budget
/// - no self-loops: x[i][i] = 0
/// - symmetry: x[i][j] = x[j][i] for i < j
/// - degree: sum_j x[i][j] = 2 * v[i] (degree 2 iff visited)
/// - depot mandatory: v[0] = 1
pub fn build_model(
    instance: &PcTspInstance,
    model: &mut dyn MipModel,
) -> Result<ModelVars, SolverError> {
    instance.validate()?;
    let n = instance.dimension;

    let mut x: Vec<Vec<VarId>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut row = Vec::with_capacity(n);
        for j in 0..n {
            row.push(model.add_binary(&format!("x_{}_{}", i, j))?);
        }
        x.push(row);
    }

    let mut v: Vec<VarId> = Vec::with_capacity(n);
    for i in 0..n {
        v.push(model.add_binary(&format!("v_{}", i))?);
    }

    // Objective: maximize total collected prize
    let mut objective = LinExpr::with_capacity(n);
    for i in 0..n {
        objective.add_term(v[i], instance.locations[i].prize);
    }
    model.set_objective(objective, Objective::Maximize)?;

    // Budget over the upper triangle; symmetry makes the lower redundant
    let mut budget_expr = LinExpr::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            budget_expr.add_term(x[i][j], instance.distance(i, j));
        }
    }
    model.add_constr(Constraint::new("budget", budget_expr, ConstrSense::Le, instance.budget))?;

    for i in 0..n {
        model.add_constr(Constraint::new(
            format!("no_loop_{}", i),
            LinExpr::new().term(x[i][i], 1.0),
            ConstrSense::Eq,
            0.0,
        ))?;
    }

    for i in 0..n {
        for j in i + 1..n {
            model.add_constr(Constraint::new(
                format!("sym_{}_{}", i, j),
                LinExpr::new().term(x[i][j], 1.0).term(x[j][i], -1.0),
                ConstrSense::Eq,
                0.0,
            ))?;
        }
    }

    // Degree-2-iff-visited: sum_j x[i][j] - 2 v[i] = 0
    for i in 0..n {
        let mut expr = LinExpr::with_capacity(n);
        for j in 0..n {
            if j != i {
                expr.add_term(x[i][j], 1.0);
            }
        }
        expr.add_term(v[i], -2.0);
        model.add_constr(Constraint::new(format!("degree_{}", i), expr, ConstrSense::Eq, 0.0))?;
    }

    // Depot is always part of the tour
    model.add_constr(Constraint::new(
        "depot_visited",
        LinExpr::new().term(v[0], 1.0),
        ConstrSense::Eq,
        1.0,
    ))?;

    Ok(ModelVars { x, v, n })
}
