//! TCP client for the daemons' control ports.
//!
//! Every query opens a fresh connection, writes one request, and reads the
//! response until the daemon closes the socket.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rigprobe_protocol::Family;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::device::Device;
use crate::error::QueryError;
use crate::{DEFAULT_HOST, DEFAULT_QUERY_TIMEOUT, MAX_RESPONSE_SIZE, ccminer, cgminer};

/// Future returned by [`DeviceQuery::devices`].
pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Device>, QueryError>> + Send + 'a>>;

/// Retrieves the device list of the daemon listening on a local port.
///
/// Implemented by [`MinerClient`]; discovery takes it as a trait object so
/// it can be exercised without real daemons.
pub trait DeviceQuery: Send + Sync {
    fn devices(&self, family: Family, port: u16) -> QueryFuture<'_>;
}

/// Network client for the cgminer and ccminer APIs.
#[derive(Debug, Clone)]
pub struct MinerClient {
    host: String,
    timeout: Duration,
}

impl Default for MinerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MinerClient {
    /// Creates a client for the default host and timeout.
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Queries the device list from `host:port` using the family's protocol.
    pub async fn query_devices(&self, family: Family, port: u16) -> Result<Vec<Device>, QueryError> {
        let devices = match family {
            Family::Cgminer => {
                let response = self.exchange(port, cgminer::DEVS_REQUEST).await?;
                cgminer::parse_devs(&response)?
            }
            Family::Ccminer => {
                let response = self.exchange(port, ccminer::THREADS_REQUEST).await?;
                ccminer::parse_threads(&response)?
            }
        };

        debug!(%family, port, count = devices.len(), "device list received");
        Ok(devices)
    }

    /// Queries a single device by the id the daemon reports for it, the same
    /// id discovery publishes as `DEVID`.
    pub async fn device(&self, family: Family, port: u16, id: u32) -> Result<Device, QueryError> {
        let devices = self.query_devices(family, port).await?;
        let count = devices.len();
        devices
            .into_iter()
            .find(|d| d.id == id)
            .ok_or(QueryError::NoSuchDevice { id, count })
    }

    async fn exchange(&self, port: u16, request: &[u8]) -> Result<Vec<u8>, QueryError> {
        let addr = format!("{}:{port}", self.host);

        let mut stream = match tokio::time::timeout(self.timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(s)) => s,
            Ok(Err(source)) => return Err(QueryError::Connect { addr, source }),
            Err(_) => return Err(QueryError::Timeout { addr }),
        };

        let io = async {
            stream.write_all(request).await?;
            stream.flush().await?;

            let mut response = Vec::new();
            (&mut stream)
                .take(MAX_RESPONSE_SIZE)
                .read_to_end(&mut response)
                .await?;
            Ok::<_, std::io::Error>(response)
        };

        match tokio::time::timeout(self.timeout, io).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(QueryError::Timeout { addr }),
        }
    }
}

impl DeviceQuery for MinerClient {
    fn devices(&self, family: Family, port: u16) -> QueryFuture<'_> {
        Box::pin(self.query_devices(family, port))
    }
}
