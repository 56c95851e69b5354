//! Barrage scenario runner.
//!
//! Reads a JSON scenario (from a file or stdin), resolves its AA fire and
//! writes a JSON report to stdout. Logs go to stderr; set `RUST_LOG` to
//! change the level.
//!
//! Usage:
//!   barrage [OPTIONS]
//!
//! Options:
//!   --scenario FILE  Scenario file (default: stdin)
//!   --config FILE    Engine configuration file
//!   --seed N         Dice seed, 0 for entropy (overrides the scenario)
//!   --help           Show this message

use std::env;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use barrage::config::{load_config, EngineConfig};
use barrage::scenario::{load_scenario, load_scenario_from_str, run_scenario};

fn print_usage() {
    eprintln!("Usage: barrage [--scenario FILE] [--config FILE] [--seed N]");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barrage=info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut scenario_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                scenario_path = args.get(i).cloned();
            }
            "--config" => {
                i += 1;
                config_path = args.get(i).cloned();
            }
            "--seed" => {
                i += 1;
                match args.get(i).map(|s| s.parse()) {
                    Some(Ok(n)) => seed = Some(n),
                    _ => fail("invalid --seed value"),
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => load_config(Path::new(&path)).unwrap_or_else(|e| fail(e)),
        None => EngineConfig::default(),
    };

    let scenario = match scenario_path {
        Some(path) => load_scenario(Path::new(&path)),
        None => {
            let mut input = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut input) {
                fail(e);
            }
            load_scenario_from_str(&input)
        }
    }
    .unwrap_or_else(|e| fail(e));

    let report = run_scenario(&scenario, &config, seed).unwrap_or_else(|e| fail(e));
    let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| fail(e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    if let Err(e) = writeln!(out, "{}", json).and_then(|_| out.flush()) {
        fail(e);
    }
}
