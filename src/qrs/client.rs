use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::Result,
    qrs::{
        filter::Filter,
        request::{RequestBuilder, RequestContext, DOMAIN_USER_AGENT},
        transport::{ReqwestTransport, Transport},
        types::{ConnectionProfile, CountResponse, UserAccessEntry},
        xrf::XrfKey,
    },
};

const USER_ACCESS_TYPE: &str = "qrs/license/useraccesstype";
const LOGIN_ACCESS_TYPE: &str = "qrs/license/loginaccesstype";

/// Typed access to the QRS license endpoints.
///
/// Every method is exactly one round trip. QRS does not page these
/// listings, so no continuation handling exists.
pub struct RepositoryClient {
    profile: ConnectionProfile,
    requests: RequestBuilder,
}

impl RepositoryClient {
    /// Build a client with its own TLS session and a fresh xrfkey
    pub fn connect(profile: ConnectionProfile, timeout: Duration, cancel: CancellationToken) -> Result<Self> {
        let transport = ReqwestTransport::new(&profile, timeout)?;
        Self::with_transport(profile, Arc::new(transport), cancel)
    }

    pub fn with_transport(
        profile: ConnectionProfile,
        transport: Arc<dyn Transport>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let user_agent = profile.credential.as_ref().map(|_| DOMAIN_USER_AGENT);
        let context = RequestContext::new(XrfKey::generate(), &profile.identity, user_agent)?;
        let requests = RequestBuilder::new(&profile.server, context, transport).with_cancellation(cancel);

        debug!(
            "QRS client for {} as {}",
            profile.server,
            profile.identity.header_value()
        );

        Ok(Self { profile, requests })
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    pub fn xrf_key(&self) -> &XrfKey {
        self.requests.context().xrf_key()
    }

    pub async fn get(&self, endpoint: &str, filter: Option<&Filter>) -> Result<Vec<u8>> {
        self.requests.get(endpoint, filter).await
    }

    pub async fn put(&self, endpoint: &str, body: Option<String>) -> Result<u16> {
        self.requests.put(endpoint, body).await
    }

    pub async fn post(&self, endpoint: &str, body: Option<String>) -> Result<u16> {
        self.requests.post(endpoint, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<u16> {
        self.requests.delete(endpoint).await
    }

    pub async fn get_proxy_status(&self, endpoint: &str) -> Result<u16> {
        self.requests.get_proxy_status(endpoint).await
    }

    /// User access allocations. `full` inlines the user record instead of a reference.
    pub async fn get_user_access_type(&self, full: bool, filter: Option<&Filter>) -> Result<Vec<UserAccessEntry>> {
        let body = self.get(&license_path(USER_ACCESS_TYPE, full), filter).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get_login_access_type(&self, full: bool, filter: Option<&Filter>) -> Result<Value> {
        let body = self.get(&license_path(LOGIN_ACCESS_TYPE, full), filter).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Server-side count of user access allocations
    pub async fn count_user_access_type(&self, filter: Option<&Filter>) -> Result<u64> {
        let body = self.get(&format!("{}/count", USER_ACCESS_TYPE), filter).await?;
        let count: CountResponse = serde_json::from_slice(&body)?;
        Ok(count.value)
    }

    /// Returns the HTTP status; 404 for an id that is already gone.
    pub async fn delete_user_access_type(&self, id: &str) -> Result<u16> {
        let path = format!("{}/{}", USER_ACCESS_TYPE, urlencoding::encode(id));
        self.delete(&path).await
    }
}

fn license_path(base: &str, full: bool) -> String {
    if full {
        format!("{}/full", base)
    } else {
        base.to_string()
    }
}
