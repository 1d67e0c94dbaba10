use async_trait::async_trait;
use reqwest::header::RANGE;
use reqwest::redirect::Policy;
use std::error::Error as _;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::core::constants::{defaults, http_status};
use crate::core::error::{LinkrotError, Result};

/// Why a remote probe produced no HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The request did not complete within the request timeout
    Timeout,
    /// The connection was reset or aborted mid-request
    ConnectionReset(String),
    /// DNS, connect, TLS or any other network failure
    Network(String),
}

impl ProbeError {
    /// Transient failures are worth one more attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Timeout | ProbeError::ConnectionReset(_))
    }
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Timeout => write!(f, "timeout"),
            ProbeError::ConnectionReset(reason) | ProbeError::Network(reason) => {
                write!(f, "{reason}")
            }
        }
    }
}

/// The I/O boundary of the validator: every network request and every
/// filesystem existence check goes through here.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    /// Final HTTP status of a remote target.
    async fn probe_remote(&self, url: &str) -> std::result::Result<u16, ProbeError>;

    /// Whether a local target exists.
    async fn probe_local(&self, path: &Path) -> bool;
}

/// Probe backed by a shared `reqwest` client and the local filesystem.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn from_config(config: &Config) -> Result<Self> {
        let user_agent = config.user_agent.as_deref().unwrap_or(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        let concurrency = config.concurrency_limit();

        let mut client_builder = reqwest::Client::builder()
            .timeout(config.timeout_duration())
            .redirect(Policy::limited(defaults::MAX_REDIRECTS))
            .user_agent(user_agent)
            .pool_max_idle_per_host(concurrency.min(20))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60));

        if config.skip_ssl_verification.unwrap_or(false) {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                LinkrotError::Config(format!("Invalid proxy URL '{proxy_url}': {e}"))
            })?;
            client_builder = client_builder.proxy(proxy);
        }

        Ok(Self {
            client: client_builder.build()?,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> std::result::Result<u16, ProbeError> {
        request
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(|e| classify_request_error(&e))
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn probe_remote(&self, url: &str) -> std::result::Result<u16, ProbeError> {
        let status = self.send(self.client.head(url)).await?;
        if status == http_status::METHOD_NOT_ALLOWED || status == http_status::NOT_IMPLEMENTED {
            log::debug!("{url} rejected HEAD with {status}, retrying as ranged GET");
            return self
                .send(self.client.get(url).header(RANGE, "bytes=0-0"))
                .await;
        }
        Ok(status)
    }

    async fn probe_local(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

/// Map a request failure onto the probe error taxonomy.
fn classify_request_error(err: &reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        return ProbeError::Timeout;
    }

    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::TimedOut => return ProbeError::Timeout,
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe => {
                    return ProbeError::ConnectionReset(io_err.to_string());
                }
                _ => {}
            }
        }
        source = inner.source();
    }

    let description = err
        .source()
        .map(|e| e.to_string())
        .unwrap_or_else(|| err.to_string());
    ProbeError::Network(description)
}
