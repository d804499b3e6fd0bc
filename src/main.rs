//! PC-TSP Solver - Command Line Interface
//!
//! Branch-and-cut solver for the Prize-Collecting Traveling Salesman Problem.

use clap::{Parser, Subcommand};
use pc_tsp_solver::exact::{GurobiConfig, GurobiSolver};
use pc_tsp_solver::instance::{Location, PcTspInstance};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pc-tsp-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "A branch-and-cut solver for the Prize-Collecting TSP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance to optimality (requires the `gurobi` feature)
    Solve {
        /// Path to the instance CSV (latitude,longitude,prize rows, depot first)
        #[arg(short, long)]
        instance: PathBuf,

        /// Distance budget in kilometers
        #[arg(short, long)]
        budget: f64,

        /// Time limit in seconds
        #[arg(short, long, default_value = "3600")]
        time_limit: f64,

        /// MIP gap tolerance
        #[arg(long, default_value = "1e-6")]
        mip_gap: f64,

        /// Number of solver threads (0 = automatic)
        #[arg(long, default_value = "0")]
        threads: i32,

        /// Random seed for prize assignment
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Maximum random prize to assign when the instance carries none
        /// (0 keeps the instance untouched)
        #[arg(long, default_value = "0")]
        max_prize: u32,

        /// Output solution to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose solver output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance CSV
        #[arg(short, long)]
        instance: PathBuf,

        /// Distance budget in kilometers
        #[arg(short, long)]
        budget: f64,
    },

    /// Generate a random instance
    Generate {
        /// Number of locations including the depot
        #[arg(short, long)]
        count: usize,

        /// Center latitude of the bounding box
        #[arg(long, default_value = "48.8566")]
        lat: f64,

        /// Center longitude of the bounding box
        #[arg(long, default_value = "2.3522")]
        lon: f64,

        /// Half-width of the bounding box in degrees
        #[arg(long, default_value = "0.5")]
        spread: f64,

        /// Maximum prize per location
        #[arg(long, default_value = "100")]
        max_prize: u32,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            budget,
            time_limit,
            mip_gap,
            threads,
            seed,
            max_prize,
            output,
            verbose,
        } => {
            solve_instance(
                &instance, budget, time_limit, mip_gap, threads, seed, max_prize, output, verbose,
            );
        }

        Commands::Analyze { instance, budget } => {
            analyze_instance(&instance, budget);
        }

        Commands::Generate { count, lat, lon, spread, max_prize, seed, output } => {
            generate_instance(count, lat, lon, spread, max_prize, seed, &output);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &PathBuf,
    budget: f64,
    time_limit: f64,
    mip_gap: f64,
    threads: i32,
    seed: u64,
    max_prize: u32,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);

    let mut instance = match PcTspInstance::from_csv(path, budget) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    if max_prize > 0 {
        instance.assign_random_prizes(seed, max_prize);
    }

    if verbose {
        println!("{}", instance.statistics());
    }

    let config = GurobiConfig { time_limit, mip_gap, threads, verbose };
    let solver = GurobiSolver::new(config);

    println!("Solving with branch-and-cut...");
    let report = match solver.solve(&instance) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Solver error: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n========== Results ==========");
    println!("Status: {}", report.status);
    println!("Collected prize: {:.2}", report.solution.total_prize);
    println!("Tour distance: {:.2} km (budget {:.2} km)", report.solution.total_distance, budget);
    println!("Within budget: {}", report.solution.within_budget);
    println!("Candidates inspected: {}", report.candidates_seen);
    println!("Subtour cuts added: {}", report.cuts_added);
    println!("Time: {:.4}s", report.solution.computation_time);

    println!("\nTour:");
    for (id, lat, lon) in report.solution.stops(&instance) {
        println!("  {:>4}  ({:.5}, {:.5})", id, lat, lon);
    }

    if let Some(out_path) = output {
        match serde_json::to_string_pretty(&report.solution) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&out_path, json) {
                    eprintln!("Failed to write output: {}", e);
                    std::process::exit(1);
                }
                println!("\nSolution saved to {:?}", out_path);
            }
            Err(e) => {
                eprintln!("Failed to serialize solution: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn analyze_instance(path: &PathBuf, budget: f64) {
    let instance = match PcTspInstance::from_csv(path, budget) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    println!("========== Instance Analysis ==========\n");
    let stats = instance.statistics();
    println!("{}", stats);

    // rough feasibility signal: how many average-length hops fit in the budget
    if stats.avg_distance > 0.0 {
        println!("  Budget covers ~{:.1} average hops", budget / stats.avg_distance);
    }
}

fn generate_instance(
    count: usize,
    lat: f64,
    lon: f64,
    spread: f64,
    max_prize: u32,
    seed: u64,
    output: &PathBuf,
) {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    if count == 0 {
        eprintln!("Instance needs at least the depot");
        std::process::exit(1);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let upper = max_prize.clamp(10, 1000);

    let mut locations = Vec::with_capacity(count);
    locations.push(Location::new(0, lat, lon, 0.0));
    for i in 1..count {
        let dlat = rng.gen_range(-spread..=spread);
        let dlon = rng.gen_range(-spread..=spread);
        let prize = rng.gen_range(10..=upper) as f64;
        locations.push(Location::new(i, lat + dlat, lon + dlon, prize));
    }

    let mut csv = String::from("latitude,longitude,prize\n");
    for loc in &locations {
        csv.push_str(&format!("{:.6},{:.6},{}\n", loc.lat, loc.lon, loc.prize));
    }

    if let Err(e) = std::fs::write(output, csv) {
        eprintln!("Failed to write instance: {}", e);
        std::process::exit(1);
    }
    println!("Wrote {} locations to {:?}", count, output);
}
