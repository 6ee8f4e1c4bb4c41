use async_trait::async_trait;
use reqwest::{header::HeaderMap, Certificate, Identity, Method};
use std::{path::Path, time::Duration};
use tracing::debug;
use url::Url;

use crate::{
    error::{ReclaimError, Result},
    qrs::types::ConnectionProfile,
};

/// A fully composed request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport. One instance owns one TLS session pool,
/// released when the transport is dropped.
///
/// Only certificate authentication is spoken. A profile carrying a domain
/// credential (NTLM virtual proxy) is refused rather than sent another way.
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(profile: &ConnectionProfile, timeout: Duration) -> Result<Self> {
        if let Some(credential) = &profile.credential {
            return Err(ReclaimError::Config(format!(
                "NTLM authentication for {} is not supported; connect with client certificates instead",
                credential.username
            )));
        }

        let identity = load_identity(&profile.client_cert, &profile.client_key)?;

        // QRS nodes ship self-signed server certs
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(true)
            .identity(identity)
            .timeout(timeout);

        if let Some(root) = &profile.root_cert {
            builder = builder.add_root_certificate(load_certificate(root)?);
        }

        Ok(Self::from_client(builder.build()?, timeout))
    }

    /// `timeout` must match the one `client` was built with
    pub(crate) fn from_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn classify(&self, err: reqwest::Error) -> ReclaimError {
        if err.is_timeout() {
            ReclaimError::Timeout(self.timeout)
        } else {
            ReclaimError::Transport(err)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.classify(e))?.to_vec();

        debug!("QRS responded with status {} ({} bytes)", status, body.len());

        Ok(HttpResponse { status, body })
    }
}

/// Client cert and key live in separate PEM files; rustls wants them in one buffer
fn load_identity(cert: &Path, key: &Path) -> Result<Identity> {
    let mut pem = read_pem(cert)?;
    pem.push(b'\n');
    pem.extend(read_pem(key)?);

    Identity::from_pem(&pem).map_err(|e| {
        ReclaimError::Certificate(format!(
            "Invalid client identity ({} / {}): {}",
            cert.display(),
            key.display(),
            e
        ))
    })
}

fn load_certificate(path: &Path) -> Result<Certificate> {
    let pem = read_pem(path)?;
    Certificate::from_pem(&pem).map_err(|e| {
        ReclaimError::Certificate(format!("Invalid root certificate {}: {}", path.display(), e))
    })
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        ReclaimError::Certificate(format!("Cannot read {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrs::types::DomainCredential;

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse { status: 204, body: vec![] };
        let missing = HttpResponse { status: 404, body: b"not found".to_vec() };

        assert!(ok.is_success());
        assert!(!missing.is_success());
        assert_eq!(missing.body_text(), "not found");
    }

    #[test]
    fn test_missing_certificate_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ConnectionProfile::new(
            "localhost:4242",
            dir.path().join("client.pem"),
            dir.path().join("client_key.pem"),
        );

        match ReqwestTransport::new(&profile, Duration::from_secs(5)) {
            Err(ReclaimError::Certificate(msg)) => assert!(msg.contains("client.pem")),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("transport built without certificates"),
        }
    }

    #[test]
    fn test_domain_credential_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ConnectionProfile::new(
            "localhost:4242",
            dir.path().join("client.pem"),
            dir.path().join("client_key.pem"),
        )
        .with_credential(DomainCredential {
            username: "CORP\\svc_qlik".to_string(),
            password: "secret".to_string(),
        });

        // Refused before any certificate is read
        match ReqwestTransport::new(&profile, Duration::from_secs(5)) {
            Err(ReclaimError::Config(msg)) => {
                assert!(msg.contains("NTLM"));
                assert!(!msg.contains("secret"));
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("transport accepted a domain credential"),
        }
    }

    #[tokio::test]
    async fn test_slow_server_is_a_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept and never answer
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(100);
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
        let transport = ReqwestTransport::from_client(client, timeout);

        let request = HttpRequest {
            method: Method::GET,
            url: Url::parse(&format!("http://{}/qrs/about", addr)).unwrap(),
            headers: HeaderMap::new(),
            body: None,
        };

        match transport.execute(request).await {
            Err(ReclaimError::Timeout(d)) => assert_eq!(d, timeout),
            Err(e) => panic!("expected timeout, got {}", e),
            Ok(r) => panic!("expected timeout, got status {}", r.status),
        }

        server.abort();
    }

    #[test]
    fn test_garbage_pem_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("client.pem");
        let key = dir.path().join("client_key.pem");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        let profile = ConnectionProfile::new("localhost:4242", cert, key);
        assert!(matches!(
            ReqwestTransport::new(&profile, Duration::from_secs(5)),
            Err(ReclaimError::Certificate(_))
        ));
    }
}
