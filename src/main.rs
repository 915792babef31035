use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use machinewatch::config::AppConfig;
use machinewatch::monitor::alert::build_alert;
use machinewatch::monitor::scorer;
use machinewatch::registry::MachineRegistry;

#[derive(Parser)]
#[command(
    name = "machinewatch",
    about = "Industrial machine monitoring with synthetic sensor data and anomaly scoring",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Seed for reproducible readings (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List configured machines
    Machines {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Generate and score readings for one machine without starting the server
    Simulate {
        /// Machine id
        #[arg(long)]
        machine: String,

        /// Number of readings
        #[arg(long, default_value = "10")]
        count: u32,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Drift tick to resume from
        #[arg(long, default_value = "0")]
        start_tick: u64,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = AppConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, seed } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if seed.is_some() {
                config.simulation.seed = seed;
            }
            tracing::info!(bind = %config.server.bind, "Starting machinewatch");
            machinewatch::serve(config).await?;
        }
        Commands::Machines { json } => {
            let registry = MachineRegistry::load_or_empty(&config.machines.path);
            if json {
                println!("{}", serde_json::to_string_pretty(registry.all())?);
            } else if registry.is_empty() {
                println!("No machines configured ({}).", config.machines.path.display());
            } else {
                println!("{:<12} | {:<24} | Type", "ID", "Name");
                println!("{:-<12}-|-{:-<24}-|-{:-<18}", "", "", "");
                for m in registry.all() {
                    println!("{:<12} | {:<24} | {}", m.id, m.name, m.machine_type);
                }
            }
        }
        Commands::Simulate {
            machine,
            count,
            seed,
            start_tick,
            json,
        } => {
            let registry = MachineRegistry::load_or_empty(&config.machines.path);
            let machine = registry
                .get(&machine)
                .with_context(|| format!("unknown machine '{}'", machine))?;
            let mut generator =
                machinewatch::build_generator(seed.or(config.simulation.seed)).starting_at(start_tick);

            let mut rows = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let mut data = generator.generate(machine);
                let score = scorer::anomaly_score(machine, &data);
                data.anomaly_score = Some(score);
                let alert = build_alert(machine, &data, score, None);
                rows.push((generator.tick(), data, alert));
            }

            if json {
                let out: Vec<_> = rows
                    .iter()
                    .map(|(tick, data, alert)| {
                        serde_json::json!({ "tick": tick, "reading": data, "alert": alert })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("\nSimulated readings for {} ({})", machine.name, machine.id);
                println!("{:<6} | {:<9} | {:<6} | Alert", "Tick", "Status", "Score");
                println!("{:-<6}-|-{:-<9}-|-{:-<6}-|-{:-<40}", "", "", "", "");
                for (tick, data, alert) in &rows {
                    let alert_str = match alert {
                        Some(a) => format!("[{:?}] {}", a.severity, a.message),
                        None => "-".to_string(),
                    };
                    println!(
                        "{:<6} | {:<9} | {:<6.3} | {}",
                        tick,
                        data.status.to_string(),
                        data.anomaly_score.unwrap_or_default(),
                        alert_str
                    );
                }
                println!();
            }
        }
    }

    Ok(())
}
