//! Lazy subtour elimination for the PC-TSP.
//!
//! Whenever the engine reports an integer-feasible candidate, the separator
//! walks the cycle containing the depot. If that cycle does not cover every
//! visited location, the candidate is a set of disjoint cycles; a single
//! boundary-crossing cut is synthesized and submitted as a lazy constraint,
//! which rejects the candidate and every other solution with the same
//! disconnected partition. Candidates forming one cycle are accepted silently.

use log::debug;

use crate::engine::{CandidateContext, Constraint, ConstrSense, LazyCutCallback, LinExpr, SolverError};
use crate::model::ModelVars;

/// An edge value at least this close to 1 counts as selected. Absorbs solver
/// integrality noise; never surfaced to callers.
pub const SELECT_EPS: f64 = 1e-6;

#[inline]
pub(crate) fn is_selected(value: f64) -> bool {
    value >= 1.0 - SELECT_EPS
}

/// Connected component (cycle) containing the depot in one candidate
/// edge matrix. Transient, rebuilt on every callback invocation.
#[derive(Debug, Clone)]
pub struct SubtourReport {
    /// in_component[i] is true iff location i lies on the depot's cycle
    pub in_component: Vec<bool>,
    /// Number of locations on the depot's cycle (depot included)
    pub size: usize,
}

/// Trace the cycle containing the depot in a candidate edge matrix.
///
/// Greedy walk from the depot: at each step move to the lowest-index
/// unvisited neighbor whose edge value is selected. Under the degree-2
/// invariant this is deterministic, and the lowest-index tie-break keeps the
/// cut sequence reproducible across identical searches.
pub fn depot_component(values: &[Vec<f64>]) -> SubtourReport {
    let n = values.len();
    let mut in_component = vec![false; n];
    in_component[0] = true;
    let mut size = 1;
    let mut current = 0;

    loop {
        let next = (0..n).find(|&j| !in_component[j] && is_selected(values[current][j]));
        match next {
            Some(j) => {
                in_component[j] = true;
                size += 1;
                current = j;
            }
            None => break,
        }
    }

    SubtourReport { in_component, size }
}

/// Synthesize the subtour elimination cut for a detected component S:
/// sum of x[i][j] over ordered pairs (i in S, j not in S) >= 2.
///
/// Any single tour that visits locations on both sides of S must cross its
/// boundary at least twice, so the cut removes exactly the disconnected
/// partitions and no valid tour.
pub fn boundary_cut(report: &SubtourReport, vars: &ModelVars) -> Constraint {
    let n = vars.n;
    let mut expr = LinExpr::with_capacity(report.size * (n - report.size));
    for i in 0..n {
        if !report.in_component[i] {
            continue;
        }
        for j in 0..n {
            if !report.in_component[j] {
                expr.add_term(vars.x[i][j], 1.0);
            }
        }
    }
    Constraint::new("subtour_elim", expr, ConstrSense::Ge, 2.0)
}

/// Callback orchestrator: separates subtour elimination cuts on each
/// integer-feasible candidate the engine reports.
pub struct SubtourSeparator<'a> {
    vars: &'a ModelVars,
    /// Cuts submitted so far in this solve (the pool only grows)
    pub cuts_added: usize,
    /// Candidates inspected so far
    pub candidates_seen: usize,
}

impl<'a> SubtourSeparator<'a> {
    pub fn new(vars: &'a ModelVars) -> Self {
        SubtourSeparator { vars, cuts_added: 0, candidates_seen: 0 }
    }

    /// Snapshot the candidate edge matrix from the callback context.
    fn edge_values(&self, ctx: &dyn CandidateContext) -> Vec<Vec<f64>> {
        let n = self.vars.n;
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                values[i][j] = ctx.value(self.vars.x[i][j]);
            }
        }
        values
    }

    /// Number of visited locations in the candidate (rounded v values).
    fn visited_count(&self, ctx: &dyn CandidateContext) -> usize {
        self.vars.v.iter().filter(|&&v| is_selected(ctx.value(v))).count()
    }
}

impl LazyCutCallback for SubtourSeparator<'_> {
    fn on_candidate(&mut self, ctx: &mut dyn CandidateContext) -> Result<(), SolverError> {
        self.candidates_seen += 1;

        let values = self.edge_values(&*ctx);
        let visited = self.visited_count(&*ctx);
        let report = depot_component(&values);

        if report.size >= visited {
            // single cycle through every visited location (or the degenerate
            // depot-only candidate): accept silently
            debug!(
                "candidate {}: accepted, component covers {} visited locations",
                self.candidates_seen, visited
            );
            return Ok(());
        }

        let cut = boundary_cut(&report, self.vars);
        debug!(
            "candidate {}: depot component has {} of {} visited locations, adding cut with {} terms",
            self.candidates_seen,
            report.size,
            visited,
            cut.expr.len()
        );
        ctx.add_lazy(cut);
        self.cuts_added += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::VarId;

    fn vars(n: usize) -> ModelVars {
        let mut next = 0;
        let x = (0..n)
            .map(|_| {
                (0..n)
                    .map(|_| {
                        let id = VarId(next);
                        next += 1;
                        id
                    })
                    .collect()
            })
            .collect();
        let v = (0..n)
            .map(|_| {
                let id = VarId(next);
                next += 1;
                id
            })
            .collect();
        ModelVars { x, v, n }
    }

    /// Candidate backed by explicit x/v matrices, recording submitted cuts.
    struct FakeCandidate {
        n: usize,
        x: Vec<Vec<f64>>,
        v: Vec<f64>,
        cuts: Vec<Constraint>,
    }

    impl FakeCandidate {
        fn new(x: Vec<Vec<f64>>, v: Vec<f64>) -> Self {
            FakeCandidate { n: v.len(), x, v, cuts: Vec::new() }
        }
    }

    impl CandidateContext for FakeCandidate {
        fn value(&self, var: VarId) -> f64 {
            let idx = var.index();
            if idx < self.n * self.n {
                self.x[idx / self.n][idx % self.n]
            } else {
                self.v[idx - self.n * self.n]
            }
        }

        fn add_lazy(&mut self, cut: Constraint) {
            self.cuts.push(cut);
        }
    }

    fn edges(n: usize, pairs: &[(usize, usize)]) -> Vec<Vec<f64>> {
        let mut x = vec![vec![0.0; n]; n];
        for &(i, j) in pairs {
            x[i][j] = 1.0;
            x[j][i] = 1.0;
        }
        x
    }

    #[test]
    fn test_component_full_tour() {
        let x = edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let report = depot_component(&x);
        assert_eq!(report.size, 4);
        assert!(report.in_component.iter().all(|&b| b));
    }

    #[test]
    fn test_component_disconnected() {
        // depot triangle {0,1,2} and separate triangle {3,4,5}
        let x = edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        let report = depot_component(&x);
        assert_eq!(report.size, 3);
        assert_eq!(report.in_component, vec![true, true, true, false, false, false]);
    }

    #[test]
    fn test_component_isolated_depot() {
        let x = edges(3, &[(1, 2), (2, 1)]);
        let report = depot_component(&x);
        assert_eq!(report.size, 1);
        assert!(report.in_component[0]);
    }

    #[test]
    fn test_lowest_index_tie_break() {
        // depot connected to 1, 2 and 3; the walk must take 1 first
        let mut x = vec![vec![0.0; 4]; 4];
        for j in 1..4 {
            x[0][j] = 1.0;
            x[j][0] = 1.0;
        }
        let report = depot_component(&x);
        // walk: 0 -> 1 -> 0? 0 already visited, 1 has no other neighbor; stops
        assert_eq!(report.size, 2);
        assert!(report.in_component[1]);
        assert!(!report.in_component[2]);
    }

    #[test]
    fn test_tolerance_absorbs_noise() {
        let mut x = edges(3, &[(0, 1), (1, 2), (2, 0)]);
        x[0][1] = 1.0 - 1e-7;
        x[1][0] = 1.0 - 1e-7;
        let report = depot_component(&x);
        assert_eq!(report.size, 3);
        // clearly fractional values are not selected
        assert!(!is_selected(0.5));
    }

    #[test]
    fn test_boundary_cut_terms() {
        let mv = vars(6);
        let x = edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        let report = depot_component(&x);
        let cut = boundary_cut(&report, &mv);
        // ordered pairs (i in S, j out of S): 3 * 3
        assert_eq!(cut.expr.len(), 9);
        assert_eq!(cut.sense, ConstrSense::Ge);
        assert_eq!(cut.rhs, 2.0);
    }

    #[test]
    fn test_cut_violated_by_generator_not_by_tour() {
        let mv = vars(6);
        let disconnected = edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        let report = depot_component(&disconnected);
        let cut = boundary_cut(&report, &mv);

        let value_in = |x: &Vec<Vec<f64>>, var: VarId| {
            let idx = var.index();
            x[idx / 6][idx % 6]
        };

        // the candidate that produced the cut violates it
        assert!(!cut.satisfied(|var| value_in(&disconnected, var), 1e-9));

        // a single cycle over the same visited set satisfies it
        let tour = edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        assert!(cut.satisfied(|var| value_in(&tour, var), 1e-9));
    }

    #[test]
    fn test_separator_accepts_single_tour() {
        let mv = vars(4);
        let x = edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let mut ctx = FakeCandidate::new(x, vec![1.0; 4]);
        let mut sep = SubtourSeparator::new(&mv);
        sep.on_candidate(&mut ctx).unwrap();
        assert_eq!(sep.cuts_added, 0);
        assert!(ctx.cuts.is_empty());
    }

    #[test]
    fn test_separator_cuts_two_cycles_once() {
        // two 2-cycles {0-1} and {2-3} with all locations marked visited:
        // exactly one cut forbidding the 2-node boundary pattern
        let mv = vars(4);
        let x = edges(4, &[(0, 1), (2, 3)]);
        let mut ctx = FakeCandidate::new(x.clone(), vec![1.0; 4]);
        let mut sep = SubtourSeparator::new(&mv);
        sep.on_candidate(&mut ctx).unwrap();
        assert_eq!(sep.cuts_added, 1);
        assert_eq!(ctx.cuts.len(), 1);

        let cut = &ctx.cuts[0];
        // boundary pairs between {0,1} and {2,3}
        assert_eq!(cut.expr.len(), 4);
        let value_in = |var: VarId| {
            let idx = var.index();
            x[idx / 4][idx % 4]
        };
        assert!(!cut.satisfied(value_in, 1e-9));
    }

    #[test]
    fn test_separator_accepts_degenerate_depot_only() {
        let mv = vars(3);
        let x = vec![vec![0.0; 3]; 3];
        let mut ctx = FakeCandidate::new(x, vec![1.0, 0.0, 0.0]);
        let mut sep = SubtourSeparator::new(&mv);
        sep.on_candidate(&mut ctx).unwrap();
        assert_eq!(sep.cuts_added, 0);
    }

    #[test]
    fn test_separator_partial_visit_subtour() {
        // locations 4 and 5 unvisited; depot triangle plus a stray cycle on
        // {2,3} is still disconnected relative to the 4 visited locations
        let mv = vars(6);
        let x = edges(6, &[(0, 1), (1, 0), (2, 3), (3, 2)]);
        let v = vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
        let mut ctx = FakeCandidate::new(x, v);
        let mut sep = SubtourSeparator::new(&mv);
        sep.on_candidate(&mut ctx).unwrap();
        assert_eq!(sep.cuts_added, 1);
        // boundary spans everything outside {0,1}, visited or not
        assert_eq!(ctx.cuts[0].expr.len(), 2 * 4);
    }
}
