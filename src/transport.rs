//! Single proxied GET. The executor only sees the [`Transport`] trait so the
//! HTTP stack can be swapped for a scripted one in tests.

use crate::error::AttemptFailure;
use crate::{ProxyDescriptor, RequestIdentity};
use async_trait::async_trait;
use log::trace;
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::{Client, Proxy};
use std::error::Error as _;
use std::time::Duration;

/// One attempt: where to go, which proxy to go through, who to claim to be.
#[derive(Debug, Clone, Copy)]
pub struct ProxiedRequest<'a> {
    pub url: &'a str,
    pub proxy: &'a ProxyDescriptor,
    /// Validation probes go out without a simulated identity.
    pub identity: Option<&'a RequestIdentity>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the GET. Any received response is `Ok`, whatever its status.
    async fn get(&self, request: &ProxiedRequest<'_>) -> Result<HttpResponse, AttemptFailure>;
}

/// reqwest-backed transport.
///
/// A fresh client is built for every attempt and bound to that attempt's
/// proxy, so no connection pool is ever shared between workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    fn client_for(proxy: &ProxyDescriptor, timeout: Duration) -> Result<Client, AttemptFailure> {
        let proxy = Proxy::all(proxy.url()).map_err(|e| AttemptFailure::Transport(describe(&e)))?;
        Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| AttemptFailure::Transport(describe(&e)))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &ProxiedRequest<'_>) -> Result<HttpResponse, AttemptFailure> {
        let client = Self::client_for(request.proxy, request.timeout)?;

        let mut builder = client.get(request.url);
        if let Some(identity) = request.identity {
            builder = builder
                .header(USER_AGENT, identity.user_agent.as_str())
                .header(COOKIE, identity.cookie_header());
        }

        trace!("GET {} via {}", request.url, request.proxy);
        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(HttpResponse { status, body })
    }
}

/// Split reqwest errors into timeouts and everything else.
pub fn classify(err: reqwest::Error) -> AttemptFailure {
    if err.is_timeout() {
        AttemptFailure::Timeout
    } else {
        AttemptFailure::Transport(describe(&err))
    }
}

/// The error message followed by its source chain, e.g.
/// `error sending request: tcp connect error: Connection refused`.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
