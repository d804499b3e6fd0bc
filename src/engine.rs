//! Narrow contract with the external MIP solving engine.
//!
//! The branch-and-cut core never talks to a concrete solver directly. It only
//! needs an engine that can declare binary/continuous variables, accept linear
//! constraints and a linear objective, run a search that reports every
//! integer-feasible candidate to a callback, and accept lazy constraints
//! discovered inside that callback. Any engine offering this contract can be
//! plugged in: the Gurobi backend in `exact::gurobi` implements it, and the
//! test suite injects fake engines without ever invoking a real solve.

use std::fmt;

/// Handle for a variable declared in an engine model.
///
/// The index is assigned by the engine in declaration order and is only
/// meaningful for the model it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A linear expression over engine variables: sum of coefficient * variable.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinExpr {
    pub fn new() -> Self {
        LinExpr { terms: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        LinExpr { terms: Vec::with_capacity(cap) }
    }

    /// Append a term. Duplicate variables are allowed; the expression is
    /// interpreted as the sum of all listed terms.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate the expression under a variable assignment.
    pub fn value(&self, lookup: impl Fn(VarId) -> f64) -> f64 {
        self.terms.iter().map(|&(v, c)| c * lookup(v)).sum()
    }
}

/// Relation of a linear constraint to its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstrSense {
    Le,
    Ge,
    Eq,
}

/// A linear constraint `expr <sense> rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: LinExpr,
    pub sense: ConstrSense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(name: impl Into<String>, expr: LinExpr, sense: ConstrSense, rhs: f64) -> Self {
        Constraint { name: name.into(), expr, sense, rhs }
    }

    /// Check the constraint under an assignment, within `tol`.
    pub fn satisfied(&self, lookup: impl Fn(VarId) -> f64, tol: f64) -> bool {
        let lhs = self.expr.value(lookup);
        match self.sense {
            ConstrSense::Le => lhs <= self.rhs + tol,
            ConstrSense::Ge => lhs >= self.rhs - tol,
            ConstrSense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Maximize,
    Minimize,
}

/// Termination status reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    TimeLimit,
    Unknown,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Feasible => "Feasible",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::TimeLimit => "TimeLimit",
            SolveStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// View of one integer-feasible candidate solution, valid only for the
/// duration of a callback invocation.
pub trait CandidateContext {
    /// Value assigned to `var` in the current candidate.
    fn value(&self, var: VarId) -> f64;

    /// Submit a lazy constraint the engine must respect for the remainder of
    /// the search. The pool of submitted cuts is append-only.
    fn add_lazy(&mut self, cut: Constraint);
}

/// Callback invoked by the engine on every integer-feasible candidate.
pub trait LazyCutCallback {
    fn on_candidate(&mut self, ctx: &mut dyn CandidateContext) -> Result<(), SolverError>;
}

/// The engine model contract. Variable declaration, constraints, objective
/// and the search itself all go through one handle; the candidate callback
/// is passed at solve time since its lifetime is exactly one search.
pub trait MipModel {
    fn add_binary(&mut self, name: &str) -> Result<VarId, SolverError>;
    fn add_continuous(&mut self, name: &str, lb: f64, ub: f64) -> Result<VarId, SolverError>;
    fn add_constr(&mut self, constraint: Constraint) -> Result<(), SolverError>;
    fn set_objective(&mut self, expr: LinExpr, direction: Objective) -> Result<(), SolverError>;

    /// Run the search. The callback is invoked once per integer-feasible
    /// candidate; lazy constraints it submits become part of the model.
    fn solve(&mut self, callback: &mut dyn LazyCutCallback) -> Result<SolveStatus, SolverError>;

    /// Value of `var` in the final incumbent. Only valid after a solve that
    /// ended with an incumbent.
    fn value(&self, var: VarId) -> Result<f64, SolverError>;

    /// Objective value of the final incumbent.
    fn objective_value(&self) -> Result<f64, SolverError>;
}

/// Errors surfaced by the solver core.
#[derive(Debug, Clone)]
pub enum SolverError {
    /// Input rejected before model construction (bad coordinates, negative
    /// prize, empty instance, negative budget).
    MalformedInput(String),
    /// The engine proved the model infeasible. Reported unchanged, no retry.
    Infeasible,
    /// The final edge matrix violates the degree invariant; the tour walk
    /// could not close the cycle.
    MalformedSolution(String),
    /// Error propagated from the external engine.
    Engine(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
            SolverError::Infeasible => write!(f, "model is infeasible"),
            SolverError::MalformedSolution(msg) => write!(f, "malformed solution state: {}", msg),
            SolverError::Engine(msg) => write!(f, "engine error: {}", msg),
        }
    }
}

impl std::error::Error for SolverError {}
