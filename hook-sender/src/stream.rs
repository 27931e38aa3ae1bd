use crate::args::CliArgs;
use crate::generator::{Delivery, generate_delivery};
use rand::{SeedableRng, rngs::StdRng};
use reqwest::Client;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

const MAX_RATE_BEFORE_DISABLING_THROTTLING: u64 = 10_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub delivered: u64,
    pub failed: u64,
}

/// Sends deliveries until `--count` is reached (or forever). A failed
/// delivery is reported and skipped, never retried.
pub async fn run_delivery_stream(args: &CliArgs) -> Result<Summary, reqwest::Error> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let mut rng = StdRng::from_os_rng();
    let delay = throttle_delay(*args.rate());

    let mut summary = Summary::default();
    let mut sequence = 0u64;
    while args.count().is_none_or(|count| sequence < count) {
        sequence += 1;
        let delivery = generate_delivery(&mut rng, *args.payload_mode(), *args.format(), sequence);
        match send(&client, args.target_url(), &delivery).await {
            Ok(status) if status.is_success() => {
                summary.delivered += 1;
                info!(sequence, event = %delivery.event, %status, "delivered");
            }
            Ok(status) => {
                summary.failed += 1;
                warn!(sequence, event = %delivery.event, %status, "delivery rejected");
            }
            Err(e) => {
                summary.failed += 1;
                warn!(sequence, event = %delivery.event, error = %e, "delivery failed");
            }
        }

        if let Some(d) = delay {
            sleep(d).await;
        }
    }
    Ok(summary)
}

async fn send(
    client: &Client,
    url: &str,
    delivery: &Delivery,
) -> Result<reqwest::StatusCode, reqwest::Error> {
    let mut request = client.post(url).body(delivery.body.clone());
    for (name, value) in &delivery.headers {
        request = request.header(*name, value);
    }
    Ok(request.send().await?.status())
}

fn throttle_delay(rate: u64) -> Option<Duration> {
    if rate == 0 || rate >= MAX_RATE_BEFORE_DISABLING_THROTTLING {
        None
    } else {
        Some(Duration::from_secs_f64(1f64 / rate as f64))
    }
}
