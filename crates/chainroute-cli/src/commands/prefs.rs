//! `chainroute prefs` — Read or update a merchant's routing preferences.

use chainroute_routing::{PreferencesUpdate, Priority, RoutingPreferences};
use clap::Args;

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct PrefsArgs {
    /// Merchant id.
    pub merchant: String,

    /// Set the priority (cost, speed, balanced).
    #[arg(long)]
    pub priority: Option<String>,

    /// Set the preferred networks, comma separated, most preferred first.
    #[arg(long, value_delimiter = ',')]
    pub preferred: Option<Vec<String>>,

    /// Set the gas price ceiling in gwei.
    #[arg(long)]
    pub max_gas_gwei: Option<f64>,

    /// Remove the gas price ceiling.
    #[arg(long, conflicts_with = "max_gas_gwei")]
    pub clear_max_gas: bool,

    /// Set the minimum reliability in [0, 1].
    #[arg(long)]
    pub min_reliability: Option<f64>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

impl PrefsArgs {
    /// The requested update, or `None` for a read.
    fn update(&self) -> anyhow::Result<Option<PreferencesUpdate>> {
        let priority = self
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?;
        let update = PreferencesUpdate {
            priority,
            preferred_networks: self.preferred.clone(),
            max_gas_price_gwei: self.max_gas_gwei,
            clear_max_gas_price: self.clear_max_gas,
            min_reliability: self.min_reliability,
        };
        if update == PreferencesUpdate::default() {
            return Ok(None);
        }
        update.validate()?;
        Ok(Some(update))
    }
}

pub async fn run(args: &PrefsArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let path = format!("/merchants/{}/preferences", args.merchant);
    let prefs: RoutingPreferences = match args.update()? {
        Some(update) => client.put(&path, &update).await?,
        None => client.get(&path).await?,
    };

    println!("Merchant:          {}", args.merchant);
    println!("Priority:          {}", prefs.priority);
    if prefs.preferred_networks.is_empty() {
        println!("Preferred:         (none)");
    } else {
        println!("Preferred:         {}", prefs.preferred_networks.join(", "));
    }
    match prefs.max_gas_price_gwei {
        Some(ceiling) => println!("Max gas (gwei):    {ceiling}"),
        None => println!("Max gas (gwei):    (none)"),
    }
    println!("Min reliability:   {:.2}", prefs.min_reliability);
    Ok(())
}
