// Entrypoint for the CLI application.
// - Builds configuration from the environment and flags, then the client.
// - Startup mirrors opening the page: load the catalog, probe the API,
//   restore a persisted session. Exiting persists the session again.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_client::api::ApiClient;
use catalog_client::config::Config;
use catalog_client::html::HtmlView;
use catalog_client::session::{FileSessionStore, MemorySessionStore, SessionStore};
use catalog_client::terminal::TerminalView;
use catalog_client::ui::main_menu;
use catalog_client::view::View;
use catalog_client::CatalogClient;

#[derive(Parser)]
#[command(name = "catalog-client")]
#[command(author, version, about = "Terminal client for the library catalog service", long_about = None)]
struct Cli {
    /// Base URL of the catalog API (overrides CATALOG_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Where the session is persisted (overrides CATALOG_SESSION_FILE)
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Keep the session in memory only
    #[arg(long)]
    no_persist: bool,

    /// Print rendered fragments as HTML
    #[arg(long)]
    html: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they stay out of the menu.
    let filter = if cli.verbose {
        EnvFilter::new("catalog_client=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catalog_client=warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(path) = cli.session_file {
        config.session_file = Some(path);
    }
    if cli.no_persist {
        config.session_file = None;
    }

    let api = ApiClient::new(&config)?;
    tracing::info!(api = %api.base_url(), "starting catalog client");

    match (config.session_file.clone(), cli.html) {
        (Some(path), false) => run(&config, api, TerminalView::new(), FileSessionStore::new(path)),
        (Some(path), true) => run(&config, api, HtmlView::echoing(), FileSessionStore::new(path)),
        (None, false) => run(&config, api, TerminalView::new(), MemorySessionStore::new()),
        (None, true) => run(&config, api, HtmlView::echoing(), MemorySessionStore::new()),
    }
}

fn run<V: View, S: SessionStore>(config: &Config, api: ApiClient, view: V, store: S) -> Result<()> {
    let mut client = CatalogClient::new(api, view, store, config.timing);

    if let Err(e) = client.load_books() {
        tracing::debug!(error = %e, "initial catalog load failed");
    }
    client.check_connection();
    if let Err(e) = client.restore_session() {
        tracing::debug!(error = %e, "persisted session not restored");
    }

    // Start the interactive menu. This call blocks until the user exits.
    let outcome = main_menu(&mut client);

    if let Err(e) = client.persist_session() {
        tracing::warn!(error = %e, "failed to persist session");
    }
    outcome
}
