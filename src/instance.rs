//! Module for parsing and representing PC-TSP instances.
//!
//! Instances are tables of geographic locations, one row per location with
//! latitude, longitude and prize, the first row being the depot. The pairwise
//! great-circle distance matrix is computed once at load time.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::SolverError;

/// Mean Earth radius in kilometers, used by the great-circle formula.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A location in the PC-TSP instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Location identifier (1-indexed in files, 0-indexed internally)
    pub id: usize,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Prize collected when the tour visits this location (non-negative)
    pub prize: f64,
}

impl Location {
    pub fn new(id: usize, lat: f64, lon: f64, prize: f64) -> Self {
        Location { id, lat, lon, prize }
    }

    /// Check if this location is the depot
    pub fn is_depot(&self) -> bool {
        self.id == 0
    }
}

/// One row of the CSV input: `latitude,longitude,prize`.
#[derive(Debug, Deserialize)]
struct LocationRecord {
    latitude: f64,
    longitude: f64,
    prize: f64,
}

/// A complete PC-TSP instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcTspInstance {
    /// Name of the instance
    pub name: String,
    /// Number of locations (including depot)
    pub dimension: usize,
    /// Upper bound on total tour distance (same unit as the matrix, km)
    pub budget: f64,
    /// List of all locations, depot first
    pub locations: Vec<Location>,
    /// Precomputed symmetric distance matrix
    #[serde(skip)]
    pub distance_matrix: Vec<Vec<f64>>,
}

impl PcTspInstance {
    /// Build an instance from locations and a budget. The distance matrix is
    /// computed here; coordinate errors surface as `MalformedInput`.
    pub fn new(name: &str, locations: Vec<Location>, budget: f64) -> Result<Self, SolverError> {
        let dimension = locations.len();
        let distance_matrix = compute_distance_matrix(&locations)?;
        let instance = PcTspInstance {
            name: name.to_string(),
            dimension,
            budget,
            locations,
            distance_matrix,
        };
        instance.validate()?;
        Ok(instance)
    }

    /// Parse a PC-TSP instance from a CSV file with `latitude,longitude,prize`
    /// rows. The first row is the depot.
    pub fn from_csv<P: AsRef<Path>>(path: P, budget: f64) -> Result<Self, SolverError> {
        let mut file = File::open(&path)
            .map_err(|e| SolverError::MalformedInput(format!("cannot open file: {}", e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| SolverError::MalformedInput(format!("read error: {}", e)))?;

        let name = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        Self::from_csv_str(&name, &contents, budget)
    }

    /// Parse an instance from CSV text.
    pub fn from_csv_str(name: &str, contents: &str, budget: f64) -> Result<Self, SolverError> {
        let mut reader = csv::Reader::from_reader(contents.as_bytes());
        let mut locations = Vec::new();

        for (i, record) in reader.deserialize::<LocationRecord>().enumerate() {
            let record = record
                .map_err(|e| SolverError::MalformedInput(format!("row {}: {}", i + 1, e)))?;
            locations.push(Location::new(i, record.latitude, record.longitude, record.prize));
        }

        Self::new(name, locations, budget)
    }

    /// Reject instances the model builder must never see: no locations,
    /// negative budget, negative prizes, out-of-range coordinates.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.locations.is_empty() {
            return Err(SolverError::MalformedInput(
                "instance has no locations (depot required)".to_string(),
            ));
        }
        if self.dimension != self.locations.len() {
            return Err(SolverError::MalformedInput(format!(
                "dimension {} does not match {} locations",
                self.dimension,
                self.locations.len()
            )));
        }
        if self.budget < 0.0 || !self.budget.is_finite() {
            return Err(SolverError::MalformedInput(format!(
                "budget must be a non-negative finite number, got {}",
                self.budget
            )));
        }
        for loc in &self.locations {
            if loc.prize < 0.0 || !loc.prize.is_finite() {
                return Err(SolverError::MalformedInput(format!(
                    "location {} has invalid prize {}",
                    loc.id, loc.prize
                )));
            }
            check_coordinates(loc.lat, loc.lon).map_err(|msg| {
                SolverError::MalformedInput(format!("location {}: {}", loc.id, msg))
            })?;
        }
        self.check_matrix()?;
        Ok(())
    }

    /// Reject a distance matrix that is not square over all locations or not
    /// symmetric. Instances arriving through deserialization carry an empty
    /// matrix, which must fail here rather than panic in the model builder.
    fn check_matrix(&self) -> Result<(), SolverError> {
        let n = self.locations.len();
        if self.distance_matrix.len() != n {
            return Err(SolverError::MalformedInput(format!(
                "distance matrix has {} rows for {} locations",
                self.distance_matrix.len(),
                n
            )));
        }
        for (i, row) in self.distance_matrix.iter().enumerate() {
            if row.len() != n {
                return Err(SolverError::MalformedInput(format!(
                    "distance matrix row {} has {} columns for {} locations",
                    i,
                    row.len(),
                    n
                )));
            }
        }
        for i in 0..n {
            for j in i + 1..n {
                let d = self.distance_matrix[i][j];
                if (d - self.distance_matrix[j][i]).abs() > 1e-9 || !d.is_finite() {
                    return Err(SolverError::MalformedInput(format!(
                        "distance matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get the distance between two locations
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Get the number of locations excluding the depot
    pub fn num_customers(&self) -> usize {
        self.dimension - 1
    }

    /// Total prize available across all non-depot locations
    pub fn total_prize(&self) -> f64 {
        self.locations.iter().filter(|l| !l.is_depot()).map(|l| l.prize).sum()
    }

    /// Calculate the length of a closed tour given as `[0, ..., 0]`
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        tour.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// Sum of prizes collected along a tour (depot carries no prize)
    pub fn tour_prize(&self, tour: &[usize]) -> f64 {
        let mut seen = vec![false; self.dimension];
        let mut prize = 0.0;
        for &i in tour {
            if i != 0 && !seen[i] {
                seen[i] = true;
                prize += self.locations[i].prize;
            }
        }
        prize
    }

    /// Assign random prizes to non-depot locations if none are present.
    /// Prizes are integers in [10, max_prize] (clamped to 1000). Deterministic via seed.
    pub fn assign_random_prizes(&mut self, seed: u64, max_prize: u32) {
        let any_prize = self.locations.iter().any(|l| l.prize != 0.0);
        if any_prize {
            return;
        }

        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let upper = max_prize.clamp(10, 1000);
        for (i, loc) in self.locations.iter_mut().enumerate() {
            if i == 0 {
                loc.prize = 0.0; // depot has no prize
            } else {
                loc.prize = rng.gen_range(10..=upper) as f64;
            }
        }
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.dimension {
            for j in i + 1..self.dimension {
                distances.push(self.distance(i, j));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            budget: self.budget,
            total_prize: self.total_prize(),
            avg_distance,
            max_distance,
        }
    }
}

/// Great-circle distance between two coordinates in kilometers (haversine).
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let s1 = (dphi / 2.0).sin();
    let s2 = (dlambda / 2.0).sin();
    let h = s1 * s1 + phi1.cos() * phi2.cos() * s2 * s2;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

fn check_coordinates(lat: f64, lon: f64) -> Result<(), String> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {} out of range [-90, 90]", lat));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {} out of range [-180, 180]", lon));
    }
    Ok(())
}

/// Compute the symmetric great-circle distance matrix. Only the upper
/// triangle is evaluated; the lower triangle is mirrored.
fn compute_distance_matrix(locations: &[Location]) -> Result<Vec<Vec<f64>>, SolverError> {
    let n = locations.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in i + 1..n {
            let a = &locations[i];
            let b = &locations[j];
            check_coordinates(a.lat, a.lon).map_err(|msg| {
                SolverError::MalformedInput(format!("location {}: {}", a.id, msg))
            })?;
            check_coordinates(b.lat, b.lon).map_err(|msg| {
                SolverError::MalformedInput(format!("location {}: {}", b.id, msg))
            })?;
            let d = great_circle_km(a.lat, a.lon, b.lat, b.lon);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }

    Ok(matrix)
}

/// Statistics about a PC-TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub budget: f64,
    pub total_prize: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(
            f,
            "  Locations: {} (1 depot + {} customers)",
            self.dimension,
            self.dimension.saturating_sub(1)
        )?;
        writeln!(f, "  Budget: {:.2} km", self.budget)?;
        writeln!(f, "  Total prize: {:.2}", self.total_prize)?;
        writeln!(f, "  Avg distance: {:.2} km", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2} km", self.max_distance)
    }
}
