//! Concrete solving-engine backends.

// When built with the `gurobi` feature, expose the real implementation
#[cfg(feature = "gurobi")]
mod gurobi;
#[cfg(feature = "gurobi")]
pub use gurobi::*;

// Otherwise provide a lightweight stub so the rest of the codebase can compile
#[cfg(not(feature = "gurobi"))]
mod gurobi_stub {
    use crate::engine::SolverError;
    use crate::instance::PcTspInstance;
    use crate::solver::SolveReport;

    #[derive(Debug, Clone)]
    pub struct GurobiConfig {
        pub time_limit: f64,
        pub mip_gap: f64,
        pub threads: i32,
        pub verbose: bool,
    }

    impl Default for GurobiConfig {
        fn default() -> Self {
            GurobiConfig { time_limit: 3600.0, mip_gap: 1e-6, threads: 0, verbose: false }
        }
    }

    pub struct GurobiSolver {
        pub config: GurobiConfig,
    }

    impl GurobiSolver {
        pub fn new(config: GurobiConfig) -> Self {
            GurobiSolver { config }
        }

        pub fn solve(&self, _instance: &PcTspInstance) -> Result<SolveReport, SolverError> {
            Err(SolverError::Engine(
                "Gurobi feature not enabled in this build".to_string(),
            ))
        }
    }
}

#[cfg(not(feature = "gurobi"))]
pub use gurobi_stub::*;
