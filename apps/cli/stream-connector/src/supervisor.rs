//! Connection supervisor: one driver per attempt, optional reconnects.
//!
//! Every attempt gets a fresh [`ConnectionDriver`] and therefore a fresh
//! session and registry. With reconnects disabled the first session that
//! ends also ends the supervisor.

use crate::error::ConnectorAppError;

use connector_core::config::{ConnectorConfig, ReconnectConfig};
use connector_core::connection::{ConnectionDriver, DriverExit};
use connector_core::error::CoreError;
use connector_core::session::SessionEvent;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use log::{error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep as TokioSleep;

/// Run the connector until `shutdown` flips to `true`, or until a session
/// ends and reconnecting is disabled or exhausted.
///
/// # Errors
///
/// - [`ConnectorAppError::Core`] if a connection fails and reconnects are disabled
/// - [`ConnectorAppError::App`] if reconnects give up after `max_elapsed_secs`
pub async fn run_until(
    config: &ConnectorConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ConnectorAppError> {
    let mut backoff = reconnect_backoff(&config.reconnect);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        info!("Connection attempt {attempt}");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let drain = tokio::spawn(log_events(events_rx));

        let mut driver = ConnectionDriver::new(&config.intiface)
            .map_err(core_error)?
            .with_events(events_tx);
        let outcome = driver.run(shutdown_requested(shutdown.clone())).await;
        drop(driver);

        // The drain ends once the driver's sender is gone.
        let reached_active = drain.await.unwrap_or_else(|e| {
            warn!("Event logger task failed: {e}");
            false
        });

        match outcome {
            Ok(DriverExit::Cancelled) => {
                info!("Connector stopped");
                return Ok(());
            }
            Ok(DriverExit::PeerClosed) => info!("Intiface closed the connection"),
            Err(e) if config.reconnect.enabled => warn!("Connection attempt failed: {e}"),
            Err(e) => {
                error!("{e}");
                return Err(core_error(e));
            }
        }

        if !config.reconnect.enabled {
            return Ok(());
        }

        if reached_active {
            backoff.reset();
        }

        let Some(delay) = backoff.next_backoff() else {
            return Err(ConnectorAppError::App {
                message: format!(
                    "Gave up reconnecting to {} after {attempt} attempts",
                    config.intiface.host
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        info!("Reconnecting in {delay:?}");
        tokio::select! {
            _ = TokioSleep(delay) => {}
            _ = shutdown_requested(shutdown.clone()) => {
                info!("Shutdown requested while waiting to reconnect");
                return Ok(());
            }
        }
    }
}

/// Backoff schedule from the reconnect settings.
pub fn reconnect_backoff(config: &ReconnectConfig) -> ExponentialBackoff {
    let initial_interval = Duration::from_millis(config.initial_interval_ms);
    ExponentialBackoff {
        current_interval: initial_interval,
        initial_interval,
        max_interval: Duration::from_millis(config.max_interval_ms),
        max_elapsed_time: config.max_elapsed_secs.map(Duration::from_secs),
        ..Default::default()
    }
}

/// Resolves once `true` is published. A dropped sender never resolves.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    let sender_dropped = shutdown.wait_for(|stop| *stop).await.is_err();
    if sender_dropped {
        std::future::pending::<()>().await;
    }
}

/// Log session events until the channel closes.
///
/// Returns whether the session reached `Active`.
async fn log_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) -> bool {
    let mut reached_active = false;

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Ready(server_info) => {
                reached_active = true;
                info!(
                    "Connected to {}",
                    server_info.server_name.as_deref().unwrap_or("Intiface")
                );
            }
            SessionEvent::DeviceRegistered(device) => {
                info!("Device available: [{}] {}", device.index(), device.name());
            }
            SessionEvent::DeviceRemoved(device) => {
                info!("Device gone: [{}] {}", device.index(), device.name());
            }
            SessionEvent::ServerError(server_error) => {
                warn!("Intiface reported: {server_error}");
            }
            SessionEvent::Closed => info!("Session closed"),
        }
    }

    reached_active
}

#[track_caller]
fn core_error(error: CoreError) -> ConnectorAppError {
    ConnectorAppError::Core {
        message: error.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
