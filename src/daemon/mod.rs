//! Daemon module for the Adhan scheduler.
//!
//! This module contains the core daemon functionality:
//! - `engine`: per-schedule session that triggers the Adhan on time
//! - `scheduler`: lifecycle controller owning the session and its timer
//! - `clock`: wall-clock source, replaceable in tests
//! - `surface`: playing-status notification surfaces
//! - `state`: active location and schedule behind the IPC server
//! - `ipc`: Unix socket server and request dispatch

pub mod clock;
pub mod engine;
pub mod ipc;
pub mod scheduler;
pub mod state;
pub mod surface;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::AdhanConfig;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineContext, EngineSession};
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use scheduler::{AdhanScheduler, SchedulerError};
pub use state::{load_location, ActiveSchedule, DaemonState};
pub use surface::{
    fixed_surface, no_surface, NotificationSurface, RecordingSurface, StatusBoard,
    SurfaceProvider,
};

/// Runs the daemon until Ctrl-C.
///
/// Restores the saved home location on startup, then serves IPC
/// requests, one task per connection.
pub async fn run(config: &AdhanConfig) -> Result<()> {
    let state = DaemonState::from_config(config)?;
    state
        .store()
        .ensure_directories()
        .context("Failed to create data directories")?;
    let state = Arc::new(Mutex::new(state));

    restore_home(&state).await;

    let server = IpcServer::new(&config.socket_path)?;
    info!("Listening on {}", server.socket_path().display());
    let handler = RequestHandler::new(Arc::clone(&state));

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let handler = handler.clone();
                    tokio::spawn(async move { handler.serve(stream).await });
                }
                Err(e) => error!("{:#}", e),
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutting down");
                break;
            }
        }
    }

    state.lock().await.stop();
    Ok(())
}

async fn restore_home(state: &Mutex<DaemonState>) {
    let home = state.lock().await.home();
    match home {
        Ok(Some(location)) => {
            info!("Restoring home location {}", location);
            if let Err(e) = load_location(state, location).await {
                warn!("Could not load home location: {:#}", e);
            }
        }
        Ok(None) => info!("No home location set, waiting for a load request"),
        Err(e) => warn!("Could not read home location: {}", e),
    }
}
