use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Method,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::{
    error::{ReclaimError, Result},
    qrs::{
        filter::Filter,
        transport::{HttpRequest, HttpResponse, Transport},
        types::{proxy_host, IdentityClaim},
        xrf::XrfKey,
    },
};

pub const XRF_HEADER: &str = "X-Qlik-XrfKey";
pub const USER_HEADER: &str = "X-Qlik-User";

/// Browser user agent QRS expects when Windows authentication is used
pub const DOMAIN_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.3; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/55.0.2883.87 Safari/537.36";

/// Immutable per-client header set. Built once; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RequestContext {
    xrf_key: XrfKey,
    headers: HeaderMap,
}

impl RequestContext {
    pub fn new(xrf_key: XrfKey, identity: &IdentityClaim, user_agent: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-qlik-xrfkey"), header_value(xrf_key.as_str())?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static("x-qlik-user"), header_value(&identity.header_value())?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(agent) = user_agent {
            headers.insert(USER_AGENT, header_value(agent)?);
        }

        Ok(Self { xrf_key, headers })
    }

    pub fn xrf_key(&self) -> &XrfKey {
        &self.xrf_key
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ReclaimError::Config(format!("Invalid header value '{}': {}", value, e)))
}

/// Compose `https://<host>/<endpoint>[?|&]filter=..[&]xrfkey=..`
///
/// `endpoint` may already carry a query string. The xrfkey always comes last.
pub fn compose_url(host: &str, endpoint: &str, filter: Option<&Filter>, xrf_key: &XrfKey) -> String {
    let mut url = format!("https://{}/{}", host, endpoint.trim_start_matches('/'));

    if let Some(filter) = filter {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&filter.to_query_param());
    }

    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str("xrfkey=");
    url.push_str(xrf_key.as_str());
    url
}

/// Builds and sends authenticated QRS requests for one server.
pub struct RequestBuilder {
    server: String,
    context: RequestContext,
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
}

impl RequestBuilder {
    pub fn new(server: &str, context: RequestContext, transport: Arc<dyn Transport>) -> Self {
        Self {
            server: server.to_string(),
            context,
            transport,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn build_url(&self, endpoint: &str, filter: Option<&Filter>) -> Result<Url> {
        Ok(Url::parse(&compose_url(&self.server, endpoint, filter, self.context.xrf_key()))?)
    }

    /// GET and return the raw body. Non-2xx responses become `RemoteRejected`.
    pub async fn get(&self, endpoint: &str, filter: Option<&Filter>) -> Result<Vec<u8>> {
        let url = self.build_url(endpoint, filter)?;
        let response = self.send(Method::GET, url, None).await?;

        if !response.is_success() {
            return Err(ReclaimError::RemoteRejected {
                status: response.status,
                body: response.body_text(),
            });
        }

        Ok(response.body)
    }

    pub async fn delete(&self, endpoint: &str) -> Result<u16> {
        let url = self.build_url(endpoint, None)?;
        Ok(self.send(Method::DELETE, url, None).await?.status)
    }

    pub async fn put(&self, endpoint: &str, body: Option<String>) -> Result<u16> {
        let url = self.build_url(endpoint, None)?;
        Ok(self.send(Method::PUT, url, body).await?.status)
    }

    pub async fn post(&self, endpoint: &str, body: Option<String>) -> Result<u16> {
        let url = self.build_url(endpoint, None)?;
        Ok(self.send(Method::POST, url, body).await?.status)
    }

    /// GET against the proxy service on the same host, port stripped
    pub async fn get_proxy_status(&self, endpoint: &str) -> Result<u16> {
        let host = proxy_host(&self.server);
        let url = Url::parse(&compose_url(host, endpoint, None, self.context.xrf_key()))?;
        Ok(self.send(Method::GET, url, None).await?.status)
    }

    async fn send(&self, method: Method, url: Url, body: Option<String>) -> Result<HttpResponse> {
        if self.cancel.is_cancelled() {
            return Err(ReclaimError::Cancelled);
        }

        debug!("{} {}", method, url);

        let request = HttpRequest {
            method,
            url,
            headers: self.context.headers().clone(),
            body,
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ReclaimError::Cancelled),
            response = self.transport.execute(request) => response,
        }
    }
}
