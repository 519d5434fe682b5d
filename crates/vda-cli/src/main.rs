use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vda")]
#[command(about = "VDA 5050 vehicle connector tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> vehicle...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run the graph validator over an order JSON file
    ValidateOrder {
        /// Path to an order message
        path: String,
    },

    /// Feed recorded events through a controller and print the final state
    Replay {
        /// Layered config paths in merge order (repeat --config)
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// JSON array of tagged events ({"order":..}, {"instantActions":..}, {"progress":..})
        events: String,
    },
}

fn main() -> Result<()> {
    // dev-time convenience; absent file is fine
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = vda_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::ValidateOrder { path } => commands::order::validate_order(&path)?,

        Commands::Replay {
            config_paths,
            events,
        } => commands::replay::replay(&config_paths, &events)?,
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
