//! IPC server for the Adhan daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for schedule commands
//! - Dispatch to the shared `DaemonState`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::types::{IpcRequest, IpcResponse, Location, Prayer, ResponseData};

use super::state::{load_location, DaemonState};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Socket binding error
    #[error("Failed to bind socket: {0}")]
    BindError(String),

    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// Client hung up before sending a request
    #[error("Connection closed by client")]
    ConnectionClosed,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// A stale socket file at the path is removed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .map_err(|e| IpcError::BindError(format!("{}: {}", socket_path.display(), e)))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE + 1];

        let n = match timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await
        {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the daemon state.
#[derive(Clone)]
pub struct RequestHandler {
    state: Arc<Mutex<DaemonState>>,
}

impl RequestHandler {
    pub fn new(state: Arc<Mutex<DaemonState>>) -> Self {
        Self { state }
    }

    /// Serves one connection: read a request, answer it, hang up.
    pub async fn serve(&self, mut stream: UnixStream) {
        let response = match IpcServer::receive_request(&mut stream).await {
            Ok(request) => {
                debug!("Received request: {:?}", request);
                self.handle(request).await
            }
            Err(e) => {
                warn!("Bad request: {:#}", e);
                IpcResponse::error(format!("Invalid request: {e}"))
            }
        };
        if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
            warn!("Failed to answer client: {:#}", e);
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Load { location } => self.handle_load(location).await,
            IpcRequest::Show { date } => self.handle_show(date).await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Stop => self.handle_stop().await,
            IpcRequest::SetTime { date, prayer, time } => {
                self.handle_set_time(date, prayer, time).await
            }
            IpcRequest::SetAdhan { prayer, path } => self.handle_set_adhan(prayer, path).await,
            IpcRequest::List => self.handle_list().await,
            IpcRequest::Delete { filename } => self.handle_delete(filename).await,
            IpcRequest::SetHome { location } => self.handle_set_home(location).await,
            IpcRequest::GetHome => self.handle_get_home().await,
        }
    }

    async fn handle_load(&self, location: Location) -> IpcResponse {
        let label = location.to_string();
        match load_location(&self.state, location).await {
            Ok(data) => {
                let message = if data.fetched == Some(true) {
                    format!("Fetched and saved prayer times for {label}")
                } else {
                    format!("Loaded prayer times for {label}")
                };
                IpcResponse::success(message, Some(data))
            }
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }

    async fn handle_show(&self, date: Option<String>) -> IpcResponse {
        let state = self.state.lock().await;
        match state.show(date.as_deref()) {
            Ok((date, day)) => IpcResponse::success(
                "",
                Some(ResponseData {
                    location: state.active().map(|a| a.location.clone()),
                    date: Some(date),
                    day: Some(day),
                    ..Default::default()
                }),
            ),
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }

    async fn handle_status(&self) -> IpcResponse {
        let state = self.state.lock().await;
        IpcResponse::success("", Some(state.status()))
    }

    async fn handle_stop(&self) -> IpcResponse {
        let mut state = self.state.lock().await;
        let message = if state.stop() {
            "Adhan scheduler stopped"
        } else {
            "Adhan scheduler was not running"
        };
        IpcResponse::success(message, Some(state.status()))
    }

    async fn handle_set_time(&self, date: String, prayer: Prayer, time: String) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.set_prayer_time(&date, prayer, &time) {
            Ok(()) => IpcResponse::success(format!("{prayer} time on {date} updated to {time}"), None),
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }

    async fn handle_set_adhan(&self, prayer: Prayer, path: PathBuf) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.set_prayer_adhan(prayer, &path) {
            Ok(()) => IpcResponse::success(
                format!("{prayer} Adhan set to {}", path.display()),
                None,
            ),
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }

    async fn handle_list(&self) -> IpcResponse {
        let state = self.state.lock().await;
        match state.list() {
            Ok(saved) => IpcResponse::success(
                "",
                Some(ResponseData {
                    saved: Some(saved),
                    ..Default::default()
                }),
            ),
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }

    async fn handle_delete(&self, filename: String) -> IpcResponse {
        let mut state = self.state.lock().await;
        match state.delete(&filename) {
            Ok(true) => IpcResponse::success(
                format!("Deleted {filename} (it was active, scheduler stopped)"),
                None,
            ),
            Ok(false) => IpcResponse::success(format!("Deleted {filename}"), None),
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }

    async fn handle_set_home(&self, location: Location) -> IpcResponse {
        let state = self.state.lock().await;
        match state.set_home(&location) {
            Ok(()) => IpcResponse::success(
                format!("Home location set to {location}"),
                Some(ResponseData {
                    home: Some(location),
                    ..Default::default()
                }),
            ),
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }

    async fn handle_get_home(&self) -> IpcResponse {
        let state = self.state.lock().await;
        match state.home() {
            Ok(home) => {
                let message = if home.is_some() {
                    ""
                } else {
                    "No home location set"
                };
                IpcResponse::success(
                    message,
                    Some(ResponseData {
                        home,
                        ..Default::default()
                    }),
                )
            }
            Err(e) => IpcResponse::error(format!("{e:#}")),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
