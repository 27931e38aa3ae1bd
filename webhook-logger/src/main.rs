mod args;
mod dashboard;
mod error;
mod invariants;
mod models;
mod report;
mod server;
mod store;

use std::{net::SocketAddr, sync::Arc};

use args::Args;
use clap::Parser;
use error::ServerError;
use server::AppState;
use store::LogStore;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let addr = SocketAddr::new(args.bind, args.port());
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    // Port 0 asks the OS for one; show the port actually bound.
    let port = listener.local_addr().map_or(addr.port(), |local| local.port());

    let store = Arc::new(LogStore::new(args.log_file));
    println!("{}", report::banner(port, store.path()));

    server::serve(listener, AppState::new(store, port, args.dashboard_limit)).await?;
    println!("\nServer stopped");
    Ok(())
}
