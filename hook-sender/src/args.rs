use clap::{Parser, ValueEnum};
use derive_getters::Getters;

#[derive(Parser, Debug, Getters)]
#[command(name = "hook-sender")]
#[command(about = "Send fake issue-tracker webhook deliveries for testing", long_about = None)]
pub struct CliArgs {
    #[arg(long, default_value = "http://localhost:8080/webhooks")]
    target_url: String,

    /// Deliveries per second
    #[arg(long, default_value_t = 2)]
    rate: u64,

    /// Stop after this many deliveries
    #[arg(long)]
    count: Option<u64>,

    #[arg(long, value_enum, default_value_t = PayloadMode::Minimal)]
    payload_mode: PayloadMode,

    #[arg(long, value_enum, default_value_t = BodyFormat::Json)]
    format: BodyFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PayloadMode {
    Minimal,
    Full,
}

impl PayloadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BodyFormat {
    Json,
    Plain,
}
