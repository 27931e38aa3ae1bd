mod args;
mod generator;
mod stream;

use std::process::ExitCode;

use args::CliArgs;
use clap::Parser;
use stream::{Summary, run_delivery_stream};
use tokio::signal;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    println!(
        "Sending {} deliveries to {} at {} per second",
        args.count()
            .map_or_else(|| "unlimited".to_string(), |c| c.to_string()),
        args.target_url(),
        args.rate()
    );

    tokio::select! {
        result = run_delivery_stream(&args) => match result {
            Ok(Summary { delivered, failed }) => {
                println!("Done: {delivered} delivered, {failed} failed");
                if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
            }
            Err(e) => {
                error!(error = %e, "could not start sending");
                ExitCode::FAILURE
            }
        },
        _ = signal::ctrl_c() => {
            println!("\nStopping delivery stream...");
            ExitCode::SUCCESS
        }
    }
}
