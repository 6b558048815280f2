//! Credential matching and request decoration
//!
//! Credentials are matched by exact, case-sensitive host comparison; with
//! overlapping entries the first match in declaration order wins.
//! Decoration is a pure step applied to each outgoing request, identical
//! for both fetcher kinds. No client-wide mutable state.

use std::time::Duration;
use url::Url;

use chartsweep_core::{AuthType, RegistryCredential};

use crate::error::{RepoError, Result};

/// Find the first credential whose registry matches the given host
pub fn find_credential<'a>(
    host: &str,
    credentials: &'a [RegistryCredential],
) -> Option<&'a RegistryCredential> {
    credentials.iter().find(|c| c.registry == host)
}

/// Build the `Authorization` header value for a credential
pub fn auth_header(credential: &RegistryCredential) -> String {
    match credential.auth_type {
        AuthType::Basic => {
            let username = credential.username.as_deref().unwrap_or_default();
            let encoded = base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                format!("{}:{}", username, credential.password),
            );
            format!("Basic {}", encoded)
        }
        AuthType::Bearer => format!("Bearer {}", credential.password),
    }
}

/// Decorate an outgoing request with authentication, if a credential
/// matches the target host. No match leaves the request untouched.
pub fn authorize(
    request: reqwest::RequestBuilder,
    url: &Url,
    credentials: &[RegistryCredential],
) -> reqwest::RequestBuilder {
    match url.host_str().and_then(|h| find_credential(h, credentials)) {
        Some(credential) => request.header(reqwest::header::AUTHORIZATION, auth_header(credential)),
        None => request,
    }
}

/// HTTP client shared by both fetcher kinds.
///
/// Holds the immutable credential list and applies it per request; the
/// transport timeout lives here, not in the fetch contract.
pub struct RepoClient {
    client: reqwest::Client,
    credentials: Vec<RegistryCredential>,
}

impl RepoClient {
    /// Create a client with the given credential list
    pub fn new(credentials: Vec<RegistryCredential>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Create a client without credentials (public repositories)
    pub fn public() -> Result<Self> {
        Self::new(Vec::new())
    }

    /// Perform one GET and return the response body.
    ///
    /// Non-2xx statuses surface as `HttpError`; an auth rejection is an
    /// `HttpError` with a 401/403 status, not a distinct error kind.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| RepoError::InvalidRepositoryUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let request = authorize(self.client.get(parsed.clone()), &parsed, &self.credentials);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                message: format!("Request to {} failed", url),
            });
        }

        let bytes = response.bytes().await.map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
