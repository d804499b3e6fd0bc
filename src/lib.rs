//! PC-TSP Solver Library
//!
//! A branch-and-cut solver for the Prize-Collecting Traveling Salesman
//! Problem (PC-TSP): pick the subset of locations whose closed tour through
//! the depot collects the most prize without exceeding a distance budget.
//!
//! # Features
//!
//! - Integer-program formulation with binary edge and visit variables
//! - Lazy subtour elimination via candidate-solution callbacks
//! - Engine-agnostic solver contract (`engine::MipModel`); any MIP engine
//!   with lazy-constraint support can be plugged in
//! - Gurobi backend behind the `gurobi` cargo feature
//! - CSV instance ingestion (latitude, longitude, prize) and great-circle
//!   distances
//!
//! # Example
//!
//! ```no_run
//! use pc_tsp_solver::instance::PcTspInstance;
//! use pc_tsp_solver::exact::{GurobiSolver, GurobiConfig};
//!
//! // Load instance: one CSV row per location, depot first, 500 km budget
//! let instance = PcTspInstance::from_csv("locations.csv", 500.0).unwrap();
//!
//! let solver = GurobiSolver::new(GurobiConfig::default());
//! let report = solver.solve(&instance).unwrap();
//!
//! println!("Collected prize: {:.2}", report.solution.total_prize);
//! println!("Tour: {:?}", report.solution.tour);
//! ```

pub mod engine;
pub mod instance;
pub mod model;
pub mod subtour;
pub mod solution;
pub mod solver;
pub mod exact;

pub use engine::SolverError;
pub use instance::PcTspInstance;
pub use solution::Solution;
