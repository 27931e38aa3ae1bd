use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};

use clap::Parser;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Parser, Debug)]
#[command(version, about = "Log and inspect incoming webhook deliveries", long_about = None)]
pub struct Args {
    /// Port to listen on; anything that is not a port number falls back to 8080
    port: Option<String>,

    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    #[arg(long, default_value = "webhook_events.json")]
    pub log_file: PathBuf,

    /// Deliveries shown on the dashboard
    #[arg(long, default_value_t = 10)]
    pub dashboard_limit: usize,
}

impl Args {
    pub fn port(&self) -> u16 {
        resolve_port(self.port.as_deref())
    }
}

pub fn resolve_port(raw: Option<&str>) -> u16 {
    let Some(raw) = raw else {
        return DEFAULT_PORT;
    };
    match raw.trim().parse() {
        Ok(port) => port,
        Err(e) => {
            warn!(value = raw, error = %e, "port must be a number, using default {DEFAULT_PORT}");
            DEFAULT_PORT
        }
    }
}
