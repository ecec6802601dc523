mod classifier;
mod geodesy;
mod replay;
mod route;
mod session;
mod storage;
mod tracker;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::classifier::MotionClassifier;
use crate::replay::{Recording, Replayer};
use crate::storage::{ActivityStore, FileStore};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "stride-o-mat")]
#[command(about = "Activity tracker: classifies movement and records routes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long, default_value = "config.yaml")]
        config: String,
    },
    /// Play a recorded sample file through a session
    Replay {
        recording: String,
        /// Take the threshold table from this config file
        #[arg(long)]
        config: Option<String>,
        /// Save the session and its route into this folder
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// List saved routes
    Routes {
        #[arg(long)]
        store: PathBuf,
    },
    /// Show totals across all sessions
    Totals {
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Replay {
            recording,
            config,
            store,
        } => replay(&recording, config.as_deref(), store),
        Commands::Routes { store } => routes(store),
        Commands::Totals { store } => totals(store),
    }
}

fn serve(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn replay(path: &str, config: Option<&str>, store: Option<PathBuf>) -> ExitCode {
    let classifier = match config.map(Config::from_file) {
        None => MotionClassifier::default(),
        Some(Ok(c)) => match c.classifier() {
            Ok(classifier) => classifier,
            Err(e) => {
                eprintln!("Invalid classifier: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Some(Err(e)) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let yaml = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let recording = match Recording::from_str(&yaml) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match Replayer::new(classifier).run(&recording) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Replay failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stats = &outcome.session.stats;
    println!("Replayed {} steps", recording.steps.len());
    for entry in &outcome.session.log {
        println!(
            "  #{:<4} {:<8} {:.1}  speed {}",
            entry.id,
            entry.activity,
            entry.confidence,
            entry
                .speed
                .map(|s| format!("{:.2} m/s", s))
                .unwrap_or_else(|| "unknown".into())
        );
    }
    println!("Distance:      {:.1} m", stats.total_distance);
    println!("Duration:      {:.0} s", stats.duration);
    println!("Average speed: {:.2} m/s", stats.average_speed);
    println!("Steps:         {}", stats.steps);
    println!("Calories:      {:.2}", stats.calories);
    match &outcome.route {
        Some(route) => println!("Route:         {} ({} points)", route.name, route.points.len()),
        None => println!("Route:         nothing to save"),
    }

    if let Some(folder) = store {
        let store = ActivityStore::new(FileStore::new(folder));
        match store.save_session(&outcome.session, outcome.route.as_ref()) {
            Ok(totals) => println!("Saved; {} sessions in total", totals.total_sessions),
            Err(e) => {
                eprintln!("Error saving session: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn routes(folder: PathBuf) -> ExitCode {
    let store = ActivityStore::new(FileStore::new(folder));
    match store.get_routes() {
        Ok(routes) => {
            println!("{} saved routes", routes.len());
            for route in routes {
                println!(
                    "  {}  {}  {:.1} m  {} points",
                    route.id,
                    route.name,
                    route.stats.distance,
                    route.points.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error reading routes: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn totals(folder: PathBuf) -> ExitCode {
    let store = ActivityStore::new(FileStore::new(folder));
    match store.get_total_stats() {
        Ok(totals) => {
            println!("Sessions: {}", totals.total_sessions);
            println!("Distance: {:.1} m", totals.total_distance);
            println!("Duration: {:.0} s", totals.total_duration);
            println!("Steps:    {}", totals.total_steps);
            println!("Calories: {:.2}", totals.total_calories);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error reading totals: {}", e);
            ExitCode::FAILURE
        }
    }
}
