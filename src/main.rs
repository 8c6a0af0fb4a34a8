//! Husky Meal Finder - dining hall menus from the command line
//!
//! Prints cached or freshly fetched menus and manages the menu subscription
//! list.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use huskymeal::cli::{subscription_record, Cli, Command, SubscriptionCommand};
use huskymeal::{MenuFetcher, SubscriptionStore};

/// Initialize the tracing subscriber for logging
fn init_tracing(default_level: &str) {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Menu { location, date } => {
            let fetcher = MenuFetcher::new(cli.fetcher_config()?)?;
            info!(cache_dir = %fetcher.cache().cache_dir().display(), "Using menu cache");
            let menu = fetcher.load_menu(location, *date).await?;
            println!("{}", serde_json::to_string_pretty(&menu)?);
        }
        Command::Locations => {
            let fetcher = MenuFetcher::new(cli.fetcher_config()?)?;
            for (key, location) in fetcher.registry().iter() {
                println!(
                    "{}\tlocation_id={}\tsite_id={}",
                    key, location.location_id, location.site_id
                );
            }
        }
        Command::Subscriptions(command) => run_subscriptions(&cli, command)?,
    }
    Ok(())
}

fn run_subscriptions(
    cli: &Cli,
    command: &SubscriptionCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SubscriptionCommand::List => {
            let store = SubscriptionStore::open(&cli.subscriptions)?;
            store.snapshot().to_writer(io::stdout())?;
        }
        SubscriptionCommand::Add { fields } => {
            let record = subscription_record(fields)?;
            let store = SubscriptionStore::open(&cli.subscriptions)?;
            store.add(record)?;
            store.write()?;
            info!(total = store.len(), "Added subscription");
        }
        SubscriptionCommand::Remove { column, value } => {
            let store = SubscriptionStore::open(&cli.subscriptions)?;
            let removed = store.remove_where(column, value);
            store.write()?;
            println!("Removed {} subscription(s)", removed);
        }
        SubscriptionCommand::Init { columns } => {
            SubscriptionStore::create(&cli.subscriptions, columns.iter().cloned())?;
            println!("Created {}", cli.subscriptions.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level());
    info!("Husky Meal Finder starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
