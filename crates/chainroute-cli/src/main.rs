//! Chainroute CLI — command-line interface for a running Chainroute node.
//!
//! Subcommands: init, status, route, simulate, recommend, analytics, prefs, reset.

mod client;
mod commands;

use clap::{Parser, Subcommand};

/// Chainroute — route payments to the network with the best live fees.
#[derive(Parser, Debug)]
#[command(name = "chainroute", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter node configuration.
    Init(commands::init::InitArgs),
    /// Show live network conditions.
    Status(commands::status::StatusArgs),
    /// Route a payment and print the decision.
    Route(commands::route::RouteArgs),
    /// Score what-if payments without recording them.
    Simulate(commands::simulate::SimulateArgs),
    /// Show the unbiased best network for a payment.
    Recommend(commands::recommend::RecommendArgs),
    /// Summarize a merchant's routed payments.
    Analytics(commands::analytics::AnalyticsArgs),
    /// Read or update a merchant's routing preferences.
    Prefs(commands::prefs::PrefsArgs),
    /// Restore a network's reliability after an outage.
    Reset(commands::reset::ResetArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Route(args) => commands::route::run(args).await,
        Commands::Simulate(args) => commands::simulate::run(args).await,
        Commands::Recommend(args) => commands::recommend::run(args).await,
        Commands::Analytics(args) => commands::analytics::run(args).await,
        Commands::Prefs(args) => commands::prefs::run(args).await,
        Commands::Reset(args) => commands::reset::run(args).await,
    }
}
