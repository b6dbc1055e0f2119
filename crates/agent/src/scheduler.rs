//! Fixed-period polling loop.
//!
//! Cycles run inside the loop body, so they never overlap. When a cycle
//! overruns the period the next tick fires as soon as it returns and the
//! schedule shifts instead of bursting to catch up.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::monitor::MonitorService;

/// Poll `service` every `period` until `cancel` is triggered.
///
/// An in-flight cycle always completes before cancellation is observed.
pub async fn run(
    service: &mut MonitorService,
    period: Duration,
    cancel: CancellationToken,
) -> Result<(), AgentError> {
    if period.is_zero() {
        return Err(AgentError::ZeroPeriod);
    }

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        period_ms = period.as_millis() as u64,
        mode = %service.monitor().mode(),
        "ECC polling started",
    );

    let mut cycles: u64 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(cycles, "ECC polling stopping");
                break;
            }
            _ = ticker.tick() => {
                cycles += 1;
                match service.poll().await {
                    Ok(outcome) if !outcome.events.is_empty() => {
                        tracing::debug!(events = outcome.events.len(), "ECC cycle raised events");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "ECC poll cycle failed, retrying next tick");
                    }
                }
            }
        }
    }

    Ok(())
}
