use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `X-Qlik-User` identity asserted on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub user_directory: String,
    pub user_id: String,
}

impl IdentityClaim {
    pub fn new(user_directory: &str, user_id: &str) -> Self {
        Self {
            user_directory: user_directory.to_string(),
            user_id: user_id.to_string(),
        }
    }

    pub fn header_value(&self) -> String {
        format!("UserDirectory={};UserID={}", self.user_directory, self.user_id)
    }
}

impl Default for IdentityClaim {
    fn default() -> Self {
        Self::new("Internal", "sa_repository")
    }
}

/// Windows domain account (`DOMAIN\user`) for an NTLM virtual proxy.
///
/// `ReqwestTransport` refuses it; only a custom `Transport` can carry it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCredential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for DomainCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything needed to reach one QRS node
#[derive(Debug, Clone)]
pub struct ConnectionProfile {
    /// `host:port`, e.g. `qlik.example.com:4242`
    pub server: String,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub root_cert: Option<PathBuf>,
    pub identity: IdentityClaim,
    pub credential: Option<DomainCredential>,
}

impl ConnectionProfile {
    pub fn new(server: &str, client_cert: impl Into<PathBuf>, client_key: impl Into<PathBuf>) -> Self {
        Self {
            server: server.to_string(),
            client_cert: client_cert.into(),
            client_key: client_key.into(),
            root_cert: None,
            identity: IdentityClaim::default(),
            credential: None,
        }
    }

    pub fn with_root_cert(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_cert = Some(root.into());
        self
    }

    pub fn with_identity(mut self, identity: IdentityClaim) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_credential(mut self, credential: DomainCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Proxy service host: the server string up to its first `:`
    pub fn proxy_host(&self) -> &str {
        proxy_host(&self.server)
    }
}

pub fn proxy_host(server: &str) -> &str {
    match server.find(':') {
        Some(idx) => &server[..idx],
        None => server,
    }
}

/// Named-user license allocation as returned by `qrs/license/useraccesstype/full`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccessEntry {
    pub id: String,
    #[serde(rename = "lastUsed", default)]
    pub last_used: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

impl UserAccessEntry {
    pub fn user_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("<unknown>")
    }
}

/// Condensed or full user reference embedded in an access entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "userDirectory", default)]
    pub user_directory: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// Body of the `/count` endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    pub value: u64,
}
