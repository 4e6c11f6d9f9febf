mod config;
mod protocol;
mod server;

use anyhow::Result;
use config::DaemonConfig;
use server::CompletionServer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use typeahead_core::{build_index, shared};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = DaemonConfig::load()?;
    let index = build_index(config.completion.seed_pairs());
    info!(
        socket = %config.server.socket_path.display(),
        max_sessions = config.server.max_sessions,
        terminator = ?config.completion.terminator,
        max_results = config.completion.max_results,
        seed_entries = index.len(),
        trie_nodes = index.node_count(),
        "loaded typeahead config"
    );
    if index.is_empty() {
        warn!("no seed entries configured, starting with an empty index");
    }

    let server = CompletionServer::new(config.server, config.completion, shared(index));
    server.run().await
}
