//! IPC client for communicating with the Adhan daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::config::AdhanConfig;
use crate::types::{IpcRequest, IpcResponse, Location, Prayer};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Response timeout for `load`, which may download a whole year
const LOAD_TIMEOUT_SECS: u64 = 120;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a client for the daemon listening on `socket_path`.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Creates a client for the daemon configured by `config`.
    pub fn from_config(config: &AdhanConfig) -> Self {
        Self::with_socket_path(config.socket_path.clone())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Loads (or fetches) a location's schedule and starts the scheduler.
    ///
    /// Sent once: a retried load could start a second download.
    pub async fn load(&self, city: &str, country: &str) -> Result<IpcResponse> {
        let request = IpcRequest::Load {
            location: Location::new(city, country),
        };
        self.send_request(&request, Duration::from_secs(LOAD_TIMEOUT_SECS))
            .await
    }

    pub async fn show(&self, date: Option<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Show { date })
            .await
    }

    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    pub async fn stop(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Stop).await
    }

    pub async fn set_time(&self, date: String, prayer: Prayer, time: String) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::SetTime { date, prayer, time })
            .await
    }

    pub async fn set_adhan(&self, prayer: Prayer, path: PathBuf) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::SetAdhan { prayer, path })
            .await
    }

    pub async fn list(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::List).await
    }

    pub async fn delete(&self, filename: String) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Delete { filename })
            .await
    }

    pub async fn set_home(&self, city: &str, country: &str) -> Result<IpcResponse> {
        let request = IpcRequest::SetHome {
            location: Location::new(city, country),
        };
        self.send_request_with_retry(&request).await
    }

    pub async fn get_home(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::GetHome).await
    }

    /// Sends a request to the daemon with retry logic.
    ///
    /// Error responses from the daemon are returned immediately.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);
        let mut attempt = 1;
        loop {
            match self.exchange(request, io_timeout).await {
                Ok(response) => return into_result(response),
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::warn!("Request failed (attempt {}/{}): {:#}", attempt, MAX_RETRIES, e);
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest, read_timeout: Duration) -> Result<IpcResponse> {
        into_result(self.exchange(request, read_timeout).await?)
    }

    async fn exchange(&self, request: &IpcRequest, read_timeout: Duration) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .context("Cannot connect to the daemon. Start it with 'adhan daemon'")?;

        let request_json = serde_json::to_vec(request).context("Failed to serialize request")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(&request_json),
        )
        .await
        .context("Write timed out")?
        .context("Failed to send request")?;

        // Half-close so the daemon sees the end of the request
        stream.shutdown().await.context("Failed to shut down write side")?;

        let mut buffer = Vec::new();
        timeout(
            read_timeout,
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Timed out waiting for the daemon")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("No response from the daemon");
        }

        serde_json::from_slice(&buffer).context("Failed to parse response")
    }
}

fn into_result(response: IpcResponse) -> Result<IpcResponse> {
    if !response.is_success() {
        anyhow::bail!("{}", response.message);
    }
    Ok(response)
}

// ============================================================================
// Tests
// ============================================================================
