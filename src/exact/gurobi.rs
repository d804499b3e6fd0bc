//! Gurobi backend for the PC-TSP branch-and-cut.
//!
//! Implements the `MipModel` contract on top of the `grb` crate. Lazy subtour
//! cuts flow through Gurobi's MIPSol callback channel, so the solver must run
//! with the `LazyConstraints` parameter enabled.

use grb::callback::{Callback, CbResult, Where};
use grb::prelude::*;

use crate::engine::{
    CandidateContext, Constraint, ConstrSense, LazyCutCallback, LinExpr, MipModel, Objective,
    SolveStatus, SolverError, VarId,
};
use crate::instance::PcTspInstance;
use crate::solver::{self, SolveReport};

/// Gurobi solver configuration
#[derive(Debug, Clone)]
pub struct GurobiConfig {
    /// Time limit in seconds
    pub time_limit: f64,
    /// MIP gap tolerance
    pub mip_gap: f64,
    /// Number of threads (0 = automatic)
    pub threads: i32,
    /// Enable verbose output
    pub verbose: bool,
}

impl Default for GurobiConfig {
    fn default() -> Self {
        GurobiConfig { time_limit: 3600.0, mip_gap: 1e-6, threads: 0, verbose: false }
    }
}

fn grb_err(context: &str, e: grb::Error) -> SolverError {
    SolverError::Engine(format!("{}: {}", context, e))
}

/// `MipModel` implementation backed by a Gurobi model.
pub struct GurobiEngine {
    model: Model,
    vars: Vec<Var>,
}

impl GurobiEngine {
    pub fn new(config: &GurobiConfig) -> Result<Self, SolverError> {
        let env = Env::new("").map_err(|e| grb_err("failed to create Gurobi environment", e))?;
        let mut model =
            Model::with_env("PCTSP", env).map_err(|e| grb_err("failed to create model", e))?;

        model
            .set_param(param::TimeLimit, config.time_limit)
            .map_err(|e| grb_err("failed to set time limit", e))?;
        model
            .set_param(param::MIPGap, config.mip_gap)
            .map_err(|e| grb_err("failed to set MIP gap", e))?;
        model
            .set_param(param::Threads, config.threads)
            .map_err(|e| grb_err("failed to set threads", e))?;
        // required for ctx.add_lazy to be honored
        model
            .set_param(param::LazyConstraints, 1)
            .map_err(|e| grb_err("failed to enable lazy constraints", e))?;

        if !config.verbose {
            model
                .set_param(param::OutputFlag, 0)
                .map_err(|e| grb_err("failed to set output flag", e))?;
        }

        Ok(GurobiEngine { model, vars: Vec::new() })
    }

    fn to_expr(&self, expr: &LinExpr) -> Expr {
        expr.terms().iter().map(|&(v, c)| c * self.vars[v.index()]).grb_sum()
    }
}

impl MipModel for GurobiEngine {
    fn add_binary(&mut self, name: &str) -> Result<VarId, SolverError> {
        let model = &mut self.model;
        let var = add_binvar!(model, name: name)
            .map_err(|e| grb_err("failed to add binary variable", e))?;
        self.vars.push(var);
        Ok(VarId(self.vars.len() - 1))
    }

    fn add_continuous(&mut self, name: &str, lb: f64, ub: f64) -> Result<VarId, SolverError> {
        let model = &mut self.model;
        let var = add_ctsvar!(model, name: name, bounds: lb..ub)
            .map_err(|e| grb_err("failed to add continuous variable", e))?;
        self.vars.push(var);
        Ok(VarId(self.vars.len() - 1))
    }

    fn add_constr(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        let expr = self.to_expr(&constraint.expr);
        let rhs = constraint.rhs;
        let result = match constraint.sense {
            ConstrSense::Le => self.model.add_constr(&constraint.name, c!(expr <= rhs)),
            ConstrSense::Ge => self.model.add_constr(&constraint.name, c!(expr >= rhs)),
            ConstrSense::Eq => self.model.add_constr(&constraint.name, c!(expr == rhs)),
        };
        result.map_err(|e| grb_err("failed to add constraint", e))?;
        Ok(())
    }

    fn set_objective(&mut self, expr: LinExpr, direction: Objective) -> Result<(), SolverError> {
        let obj = self.to_expr(&expr);
        let sense = match direction {
            Objective::Maximize => ModelSense::Maximize,
            Objective::Minimize => ModelSense::Minimize,
        };
        self.model
            .set_objective(obj, sense)
            .map_err(|e| grb_err("failed to set objective", e))
    }

    fn solve(&mut self, callback: &mut dyn LazyCutCallback) -> Result<SolveStatus, SolverError> {
        self.model.update().map_err(|e| grb_err("failed to update model", e))?;

        let mut adapter = CbAdapter { vars: &self.vars, user: callback };
        self.model
            .optimize_with_callback(&mut adapter)
            .map_err(|e| grb_err("optimization failed", e))?;

        let status = self.model.status().map_err(|e| grb_err("failed to get status", e))?;
        Ok(match status {
            Status::Optimal => SolveStatus::Optimal,
            Status::SubOptimal | Status::SolutionLimit => SolveStatus::Feasible,
            Status::TimeLimit => SolveStatus::TimeLimit,
            Status::Infeasible | Status::InfOrUnbd => SolveStatus::Infeasible,
            _ => SolveStatus::Unknown,
        })
    }

    fn value(&self, var: VarId) -> Result<f64, SolverError> {
        self.model
            .get_obj_attr(attr::X, &self.vars[var.index()])
            .map_err(|e| grb_err("failed to read variable value", e))
    }

    fn objective_value(&self) -> Result<f64, SolverError> {
        self.model
            .get_attr(attr::ObjVal)
            .map_err(|e| grb_err("failed to read objective value", e))
    }
}

/// Bridges Gurobi's callback API onto the engine-agnostic `LazyCutCallback`.
struct CbAdapter<'a, 'b> {
    vars: &'a [Var],
    user: &'b mut dyn LazyCutCallback,
}

/// Candidate snapshot handed to the separator inside a MIPSol callback.
struct SolCandidate {
    values: Vec<f64>,
    pending: Vec<Constraint>,
}

impl CandidateContext for SolCandidate {
    fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    fn add_lazy(&mut self, cut: Constraint) {
        self.pending.push(cut);
    }
}

impl Callback for CbAdapter<'_, '_> {
    fn callback(&mut self, w: Where) -> CbResult {
        if let Where::MIPSol(ctx) = w {
            let values = ctx.get_solution(self.vars.iter())?;
            let mut candidate = SolCandidate { values, pending: Vec::new() };
            self.user.on_candidate(&mut candidate)?;

            for cut in candidate.pending {
                let expr: Expr =
                    cut.expr.terms().iter().map(|&(v, c)| c * self.vars[v.index()]).grb_sum();
                let rhs = cut.rhs;
                match cut.sense {
                    ConstrSense::Le => ctx.add_lazy(c!(expr <= rhs))?,
                    ConstrSense::Ge => ctx.add_lazy(c!(expr >= rhs))?,
                    ConstrSense::Eq => ctx.add_lazy(c!(expr == rhs))?,
                }
            }
        }
        Ok(())
    }
}

/// Gurobi-based exact solver for the PC-TSP
pub struct GurobiSolver {
    pub config: GurobiConfig,
}

impl GurobiSolver {
    pub fn new(config: GurobiConfig) -> Self {
        GurobiSolver { config }
    }

    /// Solve the instance to optimality (or until the configured limits).
    pub fn solve(&self, instance: &PcTspInstance) -> Result<SolveReport, SolverError> {
        let mut engine = GurobiEngine::new(&self.config)?;
        solver::solve(instance, &mut engine, "Gurobi-BranchAndCut")
    }
}
