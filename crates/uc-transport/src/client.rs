use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use uc_model::Config;

use crate::error::TransportError;
use crate::token::TokenProvider;

/// Component B: the authenticated HTTP transport. Wraps a `reqwest::Client`
/// configured once from [`Config`] (proxies, TLS, keep-alive) and adds the
/// one behavior reqwest does not give us for free: a single transparent
/// re-authentication + retry on `401`.
pub struct HttpTransport {
    client: reqwest::Client,
    token: Arc<dyn TokenProvider>,
}

impl HttpTransport {
    pub fn new(config: &Config, token: Arc<dyn TokenProvider>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(8));

        if config.disable_keep_alive {
            builder = builder.pool_max_idle_per_host(0);
        }
        if config.skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(proxy_url) = &config.https_proxy {
            let mut proxy = reqwest::Proxy::https(proxy_url).map_err(|e| TransportError::Proxy(e.to_string()))?;
            if let Some(no_proxy) = &config.no_proxy {
                proxy = proxy.no_proxy(reqwest::NoProxy::from_string(no_proxy));
            }
            builder = builder.proxy(proxy);
        }
        if let Some(proxy_url) = &config.http_proxy {
            let mut proxy = reqwest::Proxy::http(proxy_url).map_err(|e| TransportError::Proxy(e.to_string()))?;
            if let Some(no_proxy) = &config.no_proxy {
                proxy = proxy.no_proxy(reqwest::NoProxy::from_string(no_proxy));
            }
            builder = builder.proxy(proxy);
        }
        if let Some(ca_path) = &config.server_certificate {
            let pem = std::fs::read(ca_path).map_err(|e| TransportError::Tls(e.to_string()))?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| TransportError::Tls(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        if let (Some(cert_path), Some(key_path)) = (&config.client_certificate, &config.client_certificate_key) {
            let mut pem = std::fs::read(cert_path).map_err(|e| TransportError::Tls(e.to_string()))?;
            let mut key = std::fs::read(key_path).map_err(|e| TransportError::Tls(e.to_string()))?;
            pem.append(&mut key);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| TransportError::Tls(e.to_string()))?;
            builder = builder.identity(identity);
        }

        let client = builder.build().map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(Self { client, token })
    }

    /// For tests and standalone mode, where no proxy/TLS customization or
    /// authentication is needed.
    pub fn bare(token: Arc<dyn TokenProvider>) -> Self {
        Self { client: reqwest::Client::new(), token }
    }

    fn authorized(&self, method: Method, url: &str, token: Option<&str>) -> RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        req
    }

    /// Issues one logical request, transparently retrying exactly once on a
    /// `401` after asking the token provider to re-authenticate. `build` is
    /// called again on retry so per-request headers (e.g. `Range`) survive.
    pub async fn send<F>(&self, method: Method, url: &str, build: F) -> Result<reqwest::Response, TransportError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let token = self.token.current_token().await;
        let req = build(self.authorized(method.clone(), url, token.as_deref()));
        let resp = req.send().await?;

        if resp.status().as_u16() != 401 {
            return Ok(resp);
        }

        let new_token = self.token.reauthenticate().await?;
        let retried = build(self.authorized(method, url, Some(&new_token)));
        let resp = retried.send().await?;
        if resp.status().as_u16() == 401 {
            return Err(TransportError::Unauthorized);
        }
        Ok(resp)
    }

    pub fn default_timeout() -> Duration {
        Duration::from_secs(60)
    }

    /// Forwards to the token provider's own expiry; called by the
    /// deployment machine's `BeforeCommit` phase.
    pub async fn invalidate_token(&self) {
        self.token.invalidate().await;
    }
}
