//! Connection poller
//!
//! Repeatedly tries to open a channel until a device answers in the wanted
//! application context. Several device classes can be raced: each one runs
//! its own retry loop and the first to open a channel wins.

use std::sync::Arc;
use std::time::Duration;

use lb_core::ports::{TransportError, TransportPort};
use lb_core::{ApplicationContext, DeviceClass, FailureKind};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, info_span, trace, warn, Instrument};

use super::{CancelSignal, Connection};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("no device answered within {waited:?}")]
    Timeout { waited: Duration },

    #[error("connection attempt cancelled")]
    Cancelled,

    #[error("failed to open transport: {0}")]
    OpenFailed(#[source] TransportError),
}

impl ConnectionError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ConnectionError::Timeout { .. } => FailureKind::Timeout,
            ConnectionError::Cancelled => FailureKind::Cancelled,
            ConnectionError::OpenFailed(_) => FailureKind::TransportOpenFailed,
        }
    }
}

pub struct ConnectionPoller {
    transport: Arc<dyn TransportPort>,
    retry_interval: Duration,
}

impl ConnectionPoller {
    pub fn new(transport: Arc<dyn TransportPort>, retry_interval: Duration) -> Self {
        Self {
            transport,
            retry_interval: retry_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Wait until one of `candidates` opens a channel for `context`.
    ///
    /// Fails with `Timeout` once `timeout` has elapsed, `Cancelled` when
    /// `cancel` fires, or `OpenFailed` when every candidate hit a
    /// non-retryable transport error. On return no attempt is left running
    /// and every channel other than the returned one is closed.
    pub async fn await_connection(
        &self,
        candidates: &[DeviceClass],
        context: ApplicationContext,
        timeout: Duration,
        cancel: &CancelSignal,
    ) -> Result<Connection, ConnectionError> {
        let span = info_span!(
            "pairing.poll",
            candidates = ?candidates,
            context = %context,
            timeout_ms = timeout.as_millis() as u64,
        );

        async {
            let started = Instant::now();
            let mut attempts = JoinSet::new();
            for &class in candidates {
                attempts.spawn(poll_class(
                    self.transport.clone(),
                    class,
                    context,
                    self.retry_interval,
                ));
            }

            let deadline = sleep(timeout);
            tokio::pin!(deadline);

            let mut last_error = None;
            let outcome = loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => break Err(ConnectionError::Cancelled),
                    _ = &mut deadline => {
                        break Err(ConnectionError::Timeout { waited: started.elapsed() })
                    }
                    joined = attempts.join_next() => match joined {
                        Some(Ok(Ok(connection))) => break Ok(connection),
                        Some(Ok(Err(err))) => last_error = Some(err),
                        Some(Err(join_err)) => {
                            warn!(error = %join_err, "connection attempt task failed");
                            last_error = Some(TransportError::Io(join_err.to_string()));
                        }
                        None => {
                            break Err(ConnectionError::OpenFailed(
                                last_error.take().unwrap_or(TransportError::NotConnected),
                            ))
                        }
                    },
                }
            };

            // Losers and abandoned attempts: stop them and release anything
            // they opened before the abort landed.
            attempts.abort_all();
            while let Some(joined) = attempts.join_next().await {
                if let Ok(Ok(late)) = joined {
                    debug!(device_class = %late.device_class(), "closing channel from losing attempt");
                    late.close().await;
                }
            }

            match &outcome {
                Ok(connection) => info!(
                    device_class = %connection.device_class(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "lockbox connected"
                ),
                Err(err) => info!(error = %err, "lockbox connection not established"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

async fn poll_class(
    transport: Arc<dyn TransportPort>,
    class: DeviceClass,
    context: ApplicationContext,
    retry_interval: Duration,
) -> Result<Connection, TransportError> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match transport.open(class, context).await {
            Ok(channel) => {
                debug!(device_class = %class, attempt, "transport opened");
                return Ok(Connection::new(class, context, channel));
            }
            Err(err) if err.is_retryable() => {
                trace!(device_class = %class, attempt, error = %err, "device not ready, retrying");
                sleep(retry_interval).await;
            }
            Err(err) => {
                warn!(device_class = %class, attempt, error = %err, "transport open failed");
                return Err(err);
            }
        }
    }
}
