//! HTTPS client used to reach the Flow access node and the fee payer.

use std::{net::IpAddr, time::Duration};

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};

use crate::error::BridgeError;

/// Thin wrapper around `reqwest` with a per-attempt timeout, a bridge `User-Agent` and
/// exponential retry of transient failures (timeouts, connect errors, 429 and 5xx).
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
    retries: usize,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            retries: 3,
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.builder(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.builder(Method::POST, url)
    }

    fn builder(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .timeout(self.timeout)
            .header(
                "User-Agent",
                concat!("fcl-bridge-core/", env!("CARGO_PKG_VERSION")),
            )
    }

    /// Sends `request`, retrying transient failures. Any response that is not transient is
    /// returned as is, including 4xx.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, BridgeError> {
        // streaming bodies cannot be replayed
        let Some(template) = request.try_clone() else {
            return attempt(request).await.map_err(Failure::into_error);
        };

        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(150))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(self.retries);

        (|| async {
            let request = template.try_clone().ok_or_else(|| {
                Failure::Fatal(BridgeError::Generic {
                    error: "request body cannot be replayed".to_string(),
                })
            })?;
            attempt(request).await
        })
        .retry(backoff)
        .when(Failure::is_transient)
        .notify(|failure: &Failure, delay: Duration| {
            log::debug!("retrying in {delay:?} after: {}", failure.error());
        })
        .await
        .map_err(Failure::into_error)
    }
}

/// Checks that `url` may be used as an endpoint. Plain http is accepted only on loopback,
/// where the Flow emulator and local test servers run.
///
/// # Errors
/// `BridgeError::InvalidInput` naming `attribute` if the url does not parse or is not secure.
pub fn ensure_secure_url(url: &str, attribute: &str) -> Result<(), BridgeError> {
    let invalid = |reason: String| BridgeError::InvalidInput {
        attribute: attribute.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "https" => Ok(()),
        "http" if is_loopback(&parsed) => Ok(()),
        scheme => Err(invalid(format!(
            "{scheme} is only allowed on loopback, got {url}"
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

#[derive(Debug)]
enum Failure {
    Transient(BridgeError),
    Fatal(BridgeError),
}

impl Failure {
    const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    const fn error(&self) -> &BridgeError {
        match self {
            Self::Transient(error) | Self::Fatal(error) => error,
        }
    }

    fn into_error(self) -> BridgeError {
        match self {
            Self::Transient(error) | Self::Fatal(error) => error,
        }
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn attempt(request: RequestBuilder) -> Result<Response, Failure> {
    let (client, request) = request.build_split();
    let request = request.map_err(|e| Failure::Fatal(e.into()))?;
    let url = request.url().to_string();

    match client.execute(request).await {
        Ok(response) if is_transient_status(response.status()) => {
            let status = response.status();
            Err(Failure::Transient(BridgeError::NetworkError {
                url,
                status: Some(status.as_u16()),
                error: format!("server answered {status}"),
            }))
        }
        Ok(response) => Ok(response),
        Err(e) if e.is_timeout() || e.is_connect() => Err(Failure::Transient(e.into())),
        Err(e) => Err(Failure::Fatal(e.into())),
    }
}
