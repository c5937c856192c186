//! Recherche d'une entité dans le registre REGON
//!
//! Sans clé configurée (`bir.api_key` ou `BIR_CONFIG__BIR__API_KEY`), la
//! recherche passe par l'environnement de test du service.
//!
//! Usage:
//! ```bash
//! cargo run --example lookup -- nip 5261040828
//! cargo run --example lookup -- regon 000331501
//! cargo run --example lookup -- krs 0000028860 --report
//! ```

use anyhow::{Context, bail};
use birclient::{BirClient, BirError, SearchQuery, params};
use birconfig::get_config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config()?;

    // Niveau de log : RUST_LOG, sinon logger.min_level
    let level = config.get_log_min_level()?.to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (kind, id) = match args.as_slice() {
        [kind, id, ..] => (kind.as_str(), id.clone()),
        _ => bail!("usage: lookup <nip|regon|krs> <identifier> [--report]"),
    };
    let with_report = args.iter().any(|a| a == "--report");

    let query = match kind {
        "nip" => SearchQuery::nip(id),
        "regon" => SearchQuery::regon(id),
        "krs" => SearchQuery::krs(id),
        other => bail!("unknown identifier kind: {other}"),
    };

    let client = BirClient::from_config_obj(&config)?;
    println!("=== BIR lookup ({}) ===\n", client.endpoint());

    println!("Service status: {}", client.value(params::SERVICE_STATUS).await?);
    println!("Data state:     {}\n", client.value(params::DATA_STATE).await?);

    client.login().await.context("login failed")?;

    let found = match client.search(&query).await {
        Ok(found) => found,
        Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => {
            println!("No entity found for {query}");
            client.logout().await?;
            return Ok(());
        }
        Err(BirError::Service(e)) => {
            println!("{}", serde_json::to_string_pretty(&e)?);
            client.logout().await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!("{}", serde_json::to_string_pretty(&found)?);

    if with_report {
        let regon = found
            .get("regon")
            .and_then(|v| v.as_str())
            .context("search result has no single regon")?;
        let report = client.report(regon).await?;
        println!("\n--- Report ---\n{}", serde_json::to_string_pretty(&report)?);
    }

    client.logout().await?;
    Ok(())
}
