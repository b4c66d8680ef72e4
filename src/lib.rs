pub mod card;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod log;
pub mod providers;
pub mod resolver;
pub mod salary;
pub mod store;

use crate::dispatcher::{QuoteSettings, RateDispatcher};
use crate::providers::open_er::OpenErApiClient;
use crate::resolver::AliasResolver;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Long-lived application state: alias tables, the storage handles and
/// the dispatcher. Built once per process.
pub struct App {
    pub resolver: AliasResolver,
    pub dispatcher: RateDispatcher,
}

pub fn build(config_path: Option<&str>) -> Result<App> {
    info!("cakerate starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let resolver = AliasResolver::from_embedded()?;
    let stores = store::open(&config)?;

    let base_url = config
        .providers
        .open_er
        .as_ref()
        .map_or("https://open.er-api.com/v6", |p| &p.base_url);
    let provider = Arc::new(OpenErApiClient::new(
        base_url,
        &config.base_currency,
        config.cake_price_kzt,
    ));

    let dispatcher = RateDispatcher::new(
        stores.rates,
        stores.wages,
        provider,
        QuoteSettings::from(&config),
    );

    Ok(App {
        resolver,
        dispatcher,
    })
}

/// Resolves one line of free text and serves it. Unrecognized input
/// never reaches the dispatcher; it becomes a re-prompt message here.
pub async fn answer(app: &App, raw: &str) -> String {
    let resolution = app.resolver.resolve(raw);
    if resolution.is_unrecognized() {
        return card::unrecognized(raw);
    }
    app.dispatcher
        .serve(resolution.currency.as_deref(), resolution.country.as_deref())
        .await
}

pub async fn run_quote(text: &str, config_path: Option<&str>) -> Result<()> {
    let app = build(config_path)?;
    let reply = answer(&app, text).await;
    println!("{reply}");
    Ok(())
}

pub async fn run_chat(config_path: Option<&str>) -> Result<()> {
    use std::io::{BufRead, Write};

    let app = build(config_path)?;
    println!(
        "Price a Kazakh cake. Enter a currency or country ({}), or 'exit' to leave.",
        resolver::POPULAR_CURRENCIES.join(", ")
    );

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", console::style(">").dim());
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if app.resolver.is_cancel(input) {
            println!("Bye.");
            break;
        }
        println!("{}", answer(&app, input).await);
    }
    Ok(())
}
