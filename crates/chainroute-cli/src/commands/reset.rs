//! `chainroute reset` — Restore a network's reliability after an outage.

use clap::Args;
use serde::Deserialize;

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Network key, e.g. `polygon`.
    pub network: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct ResetResponse {
    network: String,
    reliability: f64,
}

pub async fn run(args: &ResetArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let resp: ResetResponse = client
        .post(&format!("/networks/{}/reset", args.network), &serde_json::json!({}))
        .await?;
    println!("{} reliability reset to {:.2}", resp.network, resp.reliability);
    println!("It becomes routable again after its next successful poll.");
    Ok(())
}
