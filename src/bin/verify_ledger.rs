use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgGroup, Command};
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info};

use brewery_ledger::audit::{verify_decoded, Block, ValidationResult};
use brewery_ledger::database::queries::Queries;
use brewery_ledger::database::Database;

fn cli() -> Command {
    Command::new("verify-ledger")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify the integrity of a brewery audit ledger")
        .arg(
            Arg::new("database-url")
                .short('d')
                .long("database-url")
                .value_name("URL")
                .help("SQLite database holding the ledger"),
        )
        .arg(
            Arg::new("brewery")
                .short('b')
                .long("brewery")
                .value_name("ID")
                .conflicts_with("file")
                .help("Brewery whose chain to verify (all breweries if omitted)"),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("PATH")
                .help("JSON file containing an array of blocks"),
        )
        .group(
            ArgGroup::new("source")
                .args(["database-url", "file"])
                .required(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let chains = if let Some(path) = matches.get_one::<String>("file") {
        vec![(path.clone(), load_chain_from_file(Path::new(path))?)]
    } else {
        let url = matches
            .get_one::<String>("database-url")
            .ok_or_else(|| anyhow!("--database-url or --file is required"))?;
        load_chains_from_database(url, matches.get_one::<String>("brewery")).await?
    };

    if chains.is_empty() {
        return Err(anyhow!("No ledger found to verify"));
    }

    let mut broken = 0;
    for (name, records) in &chains {
        let result = verify_decoded(records.iter().cloned());
        let chain: Vec<Block> = records.iter().filter_map(|r| r.as_ref().ok().cloned()).collect();
        report(name, records.len(), &chain, &result, verbose);
        if !result.valid {
            error!("Ledger {} failed verification: {}", name, result.summary());
            broken += 1;
        }
    }

    if broken > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// One decode attempt per stored record; a bad record is a break, not a load failure
type Records = Vec<Result<Block, String>>;

fn load_chain_from_file(path: &Path) -> Result<Records> {
    info!("Loading ledger from {}", path.display());
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&contents)
        .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;
    Ok(values
        .into_iter()
        .map(|value| serde_json::from_value::<Block>(value).map_err(|e| e.to_string()))
        .collect())
}

async fn load_chains_from_database(
    url: &str,
    brewery: Option<&String>,
) -> Result<Vec<(String, Records)>> {
    info!("Loading ledgers from {}", url);
    let database = Database::new(url).await?;
    let pool = database.pool();

    let breweries = match brewery {
        Some(id) => vec![id.clone()],
        None => Queries::list_breweries(pool).await?,
    };

    let mut chains = Vec::with_capacity(breweries.len());
    for id in breweries {
        let records = Queries::load_rows(pool, &id)
            .await?
            .into_iter()
            .map(|row| Block::try_from(row).map_err(|e| e.to_string()))
            .collect();
        chains.push((id, records));
    }
    Ok(chains)
}

fn report(name: &str, stored: usize, chain: &[Block], result: &ValidationResult, verbose: bool) {
    let mark = if result.valid { "✓" } else { "✗" };
    println!("{} {}: {} ({} blocks)", mark, name, result.summary(), stored);

    if !verbose {
        return;
    }

    if let (Some(first), Some(head)) = (chain.first(), chain.last()) {
        println!("  First block: {}", first.timestamp);
        println!("  Last block:  {}", head.timestamp);
        println!("  Head hash:   {}", head.hash);
    }

    let mut actions: HashMap<String, usize> = HashMap::new();
    for block in chain {
        *actions.entry(block.data.action.to_string()).or_insert(0) += 1;
    }
    let mut actions: Vec<_> = actions.into_iter().collect();
    actions.sort();
    println!("  Action distribution:");
    for (action, count) in actions {
        println!("    {}: {}", action, count);
    }
}
