//! BlackDog - local Maven repository for catalog-hosted plugins.
//!
//! `serve` runs the repository; `scan`, `search` and `info` work against
//! the catalog and the metadata cache directly.

use anyhow::{Context, Result};
use blackdog_core::config::{AppConfig, CatalogConfig, PathsConfig, ServerConfig};
use blackdog_core::{HttpClient, Plugin, PluginRegistry, PluginStage, SearchQuery};
use blackdog_server::start_server;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "blackdog")]
#[command(about = "Local Maven repository for catalog-hosted plugins")]
struct Args {
    /// Metadata cache directory (defaults to ~/.blackdog)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Plugin catalog base URL
    #[arg(long, global = true, default_value = CatalogConfig::DEFAULT_BASE_URL)]
    catalog_url: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the repository server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = ServerConfig::DEFAULT_HOST)]
        host: String,

        /// Port to listen on (0 = auto-assign)
        #[arg(short, long, default_value_t = ServerConfig::DEFAULT_PORT)]
        port: u16,
    },
    /// Refresh the cache for every plugin listed at the given stages
    Scan {
        /// Development stage to scan (repeatable; defaults to release and mature)
        #[arg(long = "stage")]
        stages: Vec<PluginStage>,
    },
    /// Search the catalog
    Search {
        query: String,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        stage: Option<PluginStage>,
    },
    /// Show what is known about a plugin
    Info {
        name: String,

        /// Refresh only this version ("latest" for the newest)
        #[arg(long)]
        version: Option<String>,

        /// Read the cache without querying the catalog
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting {}", AppConfig::APP_NAME);

    let cache_dir = match args.cache_dir {
        Some(path) => path,
        None => dirs::home_dir()
            .context("Could not determine the home directory")?
            .join(PathsConfig::DATA_DIR_NAME),
    };
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;
    info!("Metadata cache: {}", cache_dir.display());

    let registry = PluginRegistry::open(&cache_dir, &args.catalog_url)?;

    match args.command {
        Command::Serve { host, port } => {
            let addr = start_server(Arc::new(registry), HttpClient::new()?, &host, port).await?;
            info!("Serving plugins from {} on http://{}", args.catalog_url, addr);

            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received, exiting");
        }
        Command::Scan { stages } => {
            let report = registry.scan(&stages).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            info!(
                "Scanned {} pages: {} plugins refreshed, {} failed",
                report.pages, report.plugins, report.failures
            );
        }
        Command::Search {
            query,
            page,
            category,
            stage,
        } => {
            let mut search = SearchQuery::new(query).with_page(page);
            if let Some(category) = category {
                search = search.with_category(category);
            }
            if let Some(stage) = stage {
                search = search.with_stage(stage);
            }
            let plugins = registry.search(&search).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&plugins)?);
            } else {
                plugins.iter().for_each(print_summary);
            }
        }
        Command::Info {
            name,
            version,
            offline,
        } => {
            let plugin = registry
                .get_plugin(&name, version.as_deref(), offline)
                .await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&plugin)?);
            } else {
                print_details(&plugin);
            }
        }
    }

    Ok(())
}

fn print_summary(plugin: &Plugin) {
    let stage = plugin.stage.map(|s| s.name()).unwrap_or("-");
    println!("{:<24} {:<10} {}", plugin.name(), stage, plugin.display());
    if let Some(summary) = &plugin.summary {
        println!("    {}", summary);
    }
}

fn print_details(plugin: &Plugin) {
    print_summary(plugin);
    match plugin.exists {
        Some(false) => println!("    not listed in the catalog"),
        None => println!("    not yet checked against the catalog"),
        Some(true) => {}
    }

    let mut versions: Vec<_> = plugin.versions.values().collect();
    versions.sort_by(|a, b| a.version().cmp(b.version()));
    for version in versions {
        println!(
            "    {:<12} {:<10} {:<12} {}",
            version.version(),
            version.stage.map(|s| s.name()).unwrap_or("-"),
            version.date.as_deref().unwrap_or("-"),
            version.url.as_deref().unwrap_or("-"),
        );
        if let Some(sha1) = &version.sha1 {
            println!("        sha1 {}", sha1);
        }
    }
}
