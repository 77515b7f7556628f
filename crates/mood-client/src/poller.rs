//! Fixed-period ticker feeding the session loop.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::core::SessionEvent;

/// Send `SessionEvent::Tick` every `period` until `cancel` fires or the loop
/// goes away. Ticks are dropped, never queued, when the loop is busy.
pub fn spawn_ticker(
    period: Duration,
    event_tx: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Ticker cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match event_tx.try_send(SessionEvent::Tick) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => trace!("Session loop busy, dropping tick"),
                        Err(TrySendError::Closed(_)) => break,
                    }
                }
            }
        }
    })
}
