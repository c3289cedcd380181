use std::time::Duration;

use crate::download::broadcaster::Broadcaster;
use crate::download::error::DownloadError;
use crate::download::events::ProgressEvent;
use crate::download::invoker::{MediaTool, ProbeResult};
use crate::download::strategy::{Strategy, StrategyCatalog};

/// Delay applied before attempt `index` (0-based). The first attempt is immediate.
pub fn backoff_delay(index: usize, step: Duration) -> Duration {
    step.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Walks the catalog until one strategy probes successfully.
///
/// A failed attempt that has a successor publishes a status line naming
/// both. From the second attempt on, a `strategy` event announces the
/// strategy about to be tried and a linearly growing backoff is applied.
/// Errors that no other strategy can fix end the walk early. Returns the
/// probe result with the strategy that produced it.
pub async fn probe<'a>(
    tool: &dyn MediaTool,
    catalog: &'a StrategyCatalog,
    url: &str,
    broadcaster: &Broadcaster,
    backoff_step: Duration,
) -> Result<(ProbeResult, &'a Strategy), DownloadError> {
    let total = catalog.len();
    let mut last_error = None;

    for (index, strategy) in catalog.iter().enumerate() {
        if index > 0 {
            broadcaster.publish(&ProgressEvent::strategy(&strategy.name, index + 1));
            let delay = backoff_delay(index, backoff_step);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        log::info!("🔎 Probing with strategy '{}' (attempt {}/{})", strategy.name, index + 1, total);

        match tool.probe(strategy, url).await {
            Ok(result) => {
                log::info!(
                    "✅ Strategy '{}' succeeded: title={:?}, duration={}",
                    strategy.name,
                    result.title,
                    result.duration
                );
                return Ok((result, strategy));
            }
            Err(e) if !e.is_recoverable() => {
                log::error!("Strategy '{}' failed [{}], giving up: {}", strategy.name, e.subcategory(), e);
                return Err(e);
            }
            Err(e) => {
                log::warn!("Strategy '{}' failed [{}]: {}", strategy.name, e.subcategory(), e);
                if let Some(next) = catalog.get(index + 1) {
                    broadcaster.publish(&ProgressEvent::progress(5, failed_attempt_status(index, strategy, next)));
                }
                last_error = Some(e);
            }
        }
    }

    log::error!("❌ All {} strategies failed for {}", total, url);
    Err(DownloadError::AllStrategiesExhausted {
        attempts: total,
        last: Box::new(
            last_error.unwrap_or_else(|| DownloadError::probe_failed("none", "strategy catalog is empty")),
        ),
    })
}

fn failed_attempt_status(index: usize, failed: &Strategy, next: &Strategy) -> String {
    format!("attempt {} failed ({}), trying: {}", index + 1, failed.name, next.name)
}
