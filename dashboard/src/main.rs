use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use dashboard::explorer::{self, ExplorerConfig, ExplorerEvent, ExplorerView};
use dashboard::fetch::ApiClient;
use dashboard::{metrics, supply};

/// Stablecoin telemetry and sanctions explorer console.
#[derive(Debug, Parser)]
#[command(name = "dashboard")]
struct Args {
    /// Base URL of the upstream observability API.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    api_url: String,
    /// Days of global supply history for the headline figures.
    #[arg(long, default_value_t = 90)]
    supply_days: u32,
    /// Number of top assets to list at startup.
    #[arg(long, default_value_t = 10)]
    top_assets: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    metrics::inc_restart();

    let args = Args::parse();
    let api = ApiClient::new(&args.api_url);

    headline(&api, args.supply_days, args.top_assets).await;

    let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
    let (view_tx, mut view_rx) = tokio::sync::watch::channel(ExplorerView::default());

    tokio::spawn(explorer::run(
        Arc::new(api.clone()),
        ExplorerConfig::from_env(),
        event_rx,
        view_tx,
    ));

    // Snapshot printer.
    tokio::spawn(async move {
        while view_rx.changed().await.is_ok() {
            let view = view_rx.borrow().clone();
            render(&view);
        }
    });

    // Line-oriented input adapter: `:authority X`, `:next`, `:prev`,
    // `:quit`; anything else is search text fed through the debouncer.
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            let event = match line {
                ":next" | ":n" => ExplorerEvent::NextPage,
                ":prev" | ":p" => ExplorerEvent::PrevPage,
                ":quit" | ":q" => break,
                cmd if cmd.starts_with(":authority") => ExplorerEvent::AuthoritySelected(
                    cmd.trim_start_matches(":authority").trim().to_string(),
                ),
                text => ExplorerEvent::SearchInput(text.to_string()),
            };
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
        std::process::exit(0);
    });

    metrics::serve_prometheus();
    futures_util::future::pending::<()>().await;
    Ok(())
}

/// Landing-view figures. Every feed degrades to a log line on failure; the
/// explorer below never depends on any of them.
async fn headline(api: &ApiClient, supply_days: u32, top_assets: usize) {
    match supply::global_supply(api, supply_days).await {
        Ok(points) => {
            if let Some(latest) = points.first() {
                tracing::info!(
                    target: "supply",
                    "global supply {} as of {}",
                    compact_usd(latest.total_supply),
                    latest.timestamp.date()
                );
            }
        }
        Err(e) => tracing::warn!(target: "supply", "global supply unavailable: {e}"),
    }

    match supply::top_assets(api, top_assets).await {
        Ok(assets) => {
            for asset in &assets {
                tracing::info!(
                    target: "supply",
                    "{:<8} {:<24} {}",
                    asset.symbol,
                    asset.name,
                    compact_usd(asset.supply)
                );
            }
        }
        Err(e) => tracing::warn!(target: "supply", "asset supply unavailable: {e}"),
    }

    match supply::risk_stats(api).await {
        Ok(stats) => tracing::info!(
            target: "supply",
            "{} sanctioned entities, {} addresses on record",
            stats.total_entities,
            stats.total_addresses
        ),
        Err(e) => tracing::warn!(target: "supply", "sanctions stats unavailable: {e}"),
    }
}

fn render(view: &ExplorerView) {
    if view.loading {
        println!("... fetching");
        return;
    }
    if let Some(err) = &view.last_error {
        println!("! fetch failed ({err}); showing previous results");
    }
    if view.total == 0 {
        println!("no results");
        return;
    }
    println!(
        "page {} of {} - {} results",
        view.page_index + 1,
        view.display_total_pages(),
        view.total
    );
    for entity in &view.items {
        let address = entity
            .addresses
            .first()
            .map(|a| format!("{} ({})", a.address, a.chain))
            .unwrap_or_default();
        println!(
            "  {:<40} {:<12} {:<24} {}",
            entity.name, entity.authority, entity.program, address
        );
    }
}

fn compact_usd(v: f64) -> String {
    if v >= 1e9 {
        format!("${:.1}B", v / 1e9)
    } else if v >= 1e6 {
        format!("${:.1}M", v / 1e6)
    } else {
        format!("${v:.0}")
    }
}
