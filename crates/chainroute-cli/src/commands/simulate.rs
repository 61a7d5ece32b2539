//! `chainroute simulate` — Score what-if payments without recording them.

use chainroute_core::Urgency;
use chainroute_routing::{SimulationResult, SimulationScenario};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario as `AMOUNT[:URGENCY]`, e.g. `50` or `2500:high`. Repeatable.
    #[arg(short, long = "scenario", required = true)]
    pub scenarios: Vec<String>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct SimulateRequest {
    scenarios: Vec<SimulationScenario>,
}

#[derive(Deserialize)]
struct SimulateResponse {
    results: Vec<SimulationResult>,
}

fn parse_scenario(raw: &str) -> anyhow::Result<SimulationScenario> {
    let (amount, urgency) = match raw.split_once(':') {
        Some((amount, urgency)) => (amount, urgency.parse::<Urgency>()?),
        None => (raw, Urgency::default()),
    };
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid scenario amount '{amount}'"))?;
    Ok(SimulationScenario { amount, urgency })
}

pub async fn run(args: &SimulateArgs) -> anyhow::Result<()> {
    let scenarios = args
        .scenarios
        .iter()
        .map(|s| parse_scenario(s))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let client = NodeClient::new(&args.endpoint);
    let response: SimulateResponse = client
        .post("/routing/simulate", &SimulateRequest { scenarios })
        .await?;

    println!(
        "  {:>12} {:<8} {:<10} {:>12} {:>8}  {}",
        "AMOUNT", "URGENCY", "NETWORK", "FEE (USD)", "SCORE", "CONFIRMATION"
    );
    for r in &response.results {
        let network = if r.fallback {
            format!("{}*", r.optimal_network)
        } else {
            r.optimal_network.clone()
        };
        println!(
            "  {:>12.2} {:<8} {:<10} {:>12.6} {:>8}  {}",
            r.amount,
            r.urgency.as_str(),
            network,
            r.estimated_cost_usd,
            r.score.map(|s| format!("{s:.1}")).unwrap_or_else(|| "-".into()),
            r.estimated_confirmation_time,
        );
    }
    if response.results.iter().any(|r| r.fallback) {
        println!();
        println!("* fallback network, no fresh data");
    }
    Ok(())
}
