//! Solution representation and tour extraction for the PC-TSP.
//!
//! After the search terminates, the final edge matrix is converted into an
//! ordered visiting sequence starting and ending at the depot.

use serde::{Deserialize, Serialize};

use crate::engine::SolverError;
use crate::instance::PcTspInstance;
use crate::subtour::SELECT_EPS;

/// A solution to the PC-TSP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a sequence of location indices, starting and ending at depot 0
    pub tour: Vec<usize>,
    /// Total collected prize
    pub total_prize: f64,
    /// Total tour distance
    pub total_distance: f64,
    /// Whether the tour respects the distance budget
    pub within_budget: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
}

impl Solution {
    /// Create a solution from a closed tour `[0, ..., 0]`.
    pub fn from_tour(instance: &PcTspInstance, tour: Vec<usize>, algorithm: &str) -> Self {
        let total_distance = instance.tour_length(&tour);
        let total_prize = instance.tour_prize(&tour);
        // small slack for accumulated floating error
        let within_budget = total_distance <= instance.budget + 1e-6;

        Solution {
            tour,
            total_prize,
            total_distance,
            within_budget,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
        }
    }

    /// Number of visited locations, depot included, counting each once.
    pub fn num_visited(&self) -> usize {
        if self.tour.len() < 2 {
            return self.tour.len();
        }
        self.tour.len() - 1
    }

    /// Coordinates of each stop along the tour, in visiting order.
    pub fn stops<'a>(&'a self, instance: &'a PcTspInstance) -> impl Iterator<Item = (usize, f64, f64)> + 'a {
        self.tour.iter().map(|&i| {
            let loc = &instance.locations[i];
            (i, loc.lat, loc.lon)
        })
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Prize: {:.2}", self.total_prize)?;
        writeln!(f, "  Distance: {:.2}", self.total_distance)?;
        writeln!(f, "  Within budget: {}", self.within_budget)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

/// Reconstruct the ordered tour from a final accepted edge matrix.
///
/// Walks from the depot following selected edges, consuming each used edge in
/// both directions so no edge is traversed twice, until the walk returns to
/// the depot. The walk is bounded by n steps; if the cycle does not close
/// within the bound the degree invariant was violated upstream and a
/// `MalformedSolution` error is raised instead of looping.
///
/// A depot with no selected edge yields the trivial tour `[0, 0]`.
pub fn extract_tour(values: &mut [Vec<f64>]) -> Result<Vec<usize>, SolverError> {
    let n = values.len();
    if n == 0 {
        return Err(SolverError::MalformedSolution("empty edge matrix".to_string()));
    }

    let mut tour = vec![0usize];
    let mut current = 0usize;

    for _ in 0..n {
        // lowest-index selected neighbor, same tie-break as the detector
        let next = (0..n).find(|&j| values[current][j] >= 1.0 - SELECT_EPS);
        match next {
            Some(j) => {
                values[current][j] = 0.0;
                values[j][current] = 0.0;
                tour.push(j);
                if j == 0 {
                    return Ok(tour);
                }
                current = j;
            }
            None => {
                if tour.len() == 1 {
                    // depot has degree 0: no location visited
                    tour.push(0);
                    return Ok(tour);
                }
                return Err(SolverError::MalformedSolution(format!(
                    "walk stranded at location {} after {} steps",
                    current,
                    tour.len() - 1
                )));
            }
        }
    }

    Err(SolverError::MalformedSolution(format!(
        "cycle through the depot did not close within {} steps",
        n
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Location;

    fn edges(n: usize, pairs: &[(usize, usize)]) -> Vec<Vec<f64>> {
        let mut x = vec![vec![0.0; n]; n];
        for &(i, j) in pairs {
            x[i][j] = 1.0;
            x[j][i] = 1.0;
        }
        x
    }

    #[test]
    fn test_extract_square_tour() {
        let mut x = edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let tour = extract_tour(&mut x).unwrap();
        assert_eq!(tour, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_extract_partial_tour() {
        // only locations 1 and 3 visited besides the depot
        let mut x = edges(5, &[(0, 1), (1, 3), (3, 0)]);
        let tour = extract_tour(&mut x).unwrap();
        assert_eq!(tour, vec![0, 1, 3, 0]);
    }

    #[test]
    fn test_extract_trivial_tour() {
        let mut x = vec![vec![0.0; 3]; 3];
        let tour = extract_tour(&mut x).unwrap();
        assert_eq!(tour, vec![0, 0]);
    }

    #[test]
    fn test_extract_consumes_edges() {
        let mut x = edges(3, &[(0, 1), (1, 2), (2, 0)]);
        extract_tour(&mut x).unwrap();
        assert!(x.iter().all(|row| row.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_malformed_open_path_errors() {
        // path 0-1-2 with no closing edge: walk strands at 2
        let mut x = edges(3, &[(0, 1), (1, 2)]);
        let err = extract_tour(&mut x).unwrap_err();
        assert!(matches!(err, SolverError::MalformedSolution(_)));
    }

    #[test]
    fn test_walk_is_bounded() {
        // degree-violating star around the depot must terminate with an error,
        // not loop forever
        let mut x = vec![vec![1.0; 4]; 4];
        for i in 0..4 {
            x[i][i] = 0.0;
        }
        let res = extract_tour(&mut x);
        // walk 0->1->0 closes immediately in this matrix, which is fine; the
        // point is that whatever path is taken, the call returns
        assert!(res.is_ok() || matches!(res, Err(SolverError::MalformedSolution(_))));
    }

    #[test]
    fn test_solution_from_tour() {
        let locs = vec![
            Location::new(0, 0.0, 0.0, 0.0),
            Location::new(1, 0.1, 0.0, 5.0),
            Location::new(2, 0.1, 0.1, 5.0),
            Location::new(3, 0.0, 0.1, 5.0),
        ];
        let mut instance = PcTspInstance::new("sq", locs, 4.0).unwrap();
        instance.distance_matrix = vec![
            vec![0.0, 1.0, 2.0_f64.sqrt(), 1.0],
            vec![1.0, 0.0, 1.0, 2.0_f64.sqrt()],
            vec![2.0_f64.sqrt(), 1.0, 0.0, 1.0],
            vec![1.0, 2.0_f64.sqrt(), 1.0, 0.0],
        ];
        let sol = Solution::from_tour(&instance, vec![0, 1, 2, 3, 0], "test");
        assert!((sol.total_prize - 15.0).abs() < 1e-9);
        assert!((sol.total_distance - 4.0).abs() < 1e-9);
        assert!(sol.within_budget);
        assert_eq!(sol.num_visited(), 4);
    }
}
