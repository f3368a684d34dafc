//! Portal reachability probe run before a browser is launched

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Poll `url` until it answers with a non-5xx status or `timeout` elapses.
pub async fn wait_until_reachable(url: &str, timeout: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if !resp.status().is_server_error() => {
                info!(url, status = resp.status().as_u16(), "portal reachable");
                return Ok(());
            }
            Ok(resp) => {
                warn!("Portal returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for portal at {}...", url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Reachability check error: {}", e);
                }
            }
        }

        sleep(Duration::from_millis(500)).await;
    }

    Err(E2eError::PortalUnreachable {
        url: url.to_string(),
        attempts,
    })
}
