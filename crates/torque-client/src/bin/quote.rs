//! # Quote Tool
//!
//! Prices a job file with the configured shop settings.
//!
//! ## Usage
//! ```bash
//! # Price a job with settings from client.toml / TORQUE_* variables
//! cargo run -p torque-client --bin torque-quote -- job.json
//!
//! # Use a specific config file
//! cargo run -p torque-client --bin torque-quote -- job.json --config ./client.toml
//!
//! # Read the job from stdin
//! cat job.json | cargo run -p torque-client --bin torque-quote -- -
//! ```
//!
//! ## Job File
//! ```json
//! {
//!   "parts": [{ "name": "Brake pads", "cost": "45.00", "quantity": 2 }],
//!   "labor": [{ "description": "Front brakes", "hours": 1.5 }]
//! }
//! ```

use std::env;
use std::io::Read;
use std::path::PathBuf;
use torque_client::telemetry::init_tracing;
use torque_client::ClientConfig;
use torque_core::{compute_totals, BillableItems};
use tracing::{debug, info};

fn print_help() {
    println!("Torque Quote Tool");
    println!();
    println!("Usage: torque-quote <JOB> [OPTIONS]");
    println!();
    println!("Arguments:");
    println!("  <JOB>                Job JSON file with parts and labor ('-' for stdin)");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Client config file (default: platform config dir)");
    println!("  -h, --help           Show this help message");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut job_path: Option<String> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                if job_path.is_none() {
                    job_path = Some(other.to_string());
                }
            }
        }
        i += 1;
    }

    let Some(job_path) = job_path else {
        print_help();
        return Err("missing job file".into());
    };

    let config = ClientConfig::load(config_path)?;
    debug!(settings = ?config.pricing, "Using shop settings");

    let contents = if job_path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&job_path)?
    };
    let job: BillableItems = serde_json::from_str(&contents)?;

    let totals = compute_totals(&job, &config.pricing);
    info!(
        parts = job.parts.len(),
        labor = job.labor.len(),
        total = %totals.total,
        "Job priced"
    );

    println!("{}", serde_json::to_string_pretty(&totals.rounded_for_display())?);
    Ok(())
}
