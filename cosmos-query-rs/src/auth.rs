//! Authentication for Cosmos DB requests
//!
//! Two styles are supported, mirroring the account's own options: the
//! shared master key (requests are signed per the documented
//! `type=master&ver=1.0&sig=...` scheme) and Azure AD (a bearer token
//! acquired once via the OAuth2 client-credentials flow and sent as
//! `type=aad&ver=1.0&sig=...`). Acquisition is attempt-once; there is no
//! token refresh.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;
use url::Url;

use crate::config::ServicePrincipal;
use crate::error::{CosmosError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Credential accepted by [`crate::CosmosQueryClient::connect`]
#[derive(Debug, Clone)]
pub enum CosmosCredential {
    /// Shared account master key (base64, as shown in the portal)
    MasterKey(String),

    /// Azure AD service principal for data-plane RBAC
    AzureAd(ServicePrincipal),
}

impl CosmosCredential {
    /// Pick a credential the way the runbook keywords do: a non-blank key
    /// wins, otherwise fall back to the service principal from the
    /// environment.
    pub fn from_key_or_env(key: Option<&str>) -> Result<Self> {
        match key {
            Some(key) if !key.trim().is_empty() => Ok(Self::MasterKey(key.to_string())),
            _ => Ok(Self::AzureAd(ServicePrincipal::from_env()?)),
        }
    }
}

/// Resolved auth material held by an open connection
#[derive(Debug, Clone)]
pub(crate) enum AuthMaterial {
    /// Decoded master key bytes
    MasterKey(Vec<u8>),

    /// AAD bearer token
    Bearer(String),
}

impl AuthMaterial {
    /// Decode and store a master key.
    pub(crate) fn from_master_key(key: &str) -> Result<Self> {
        let decoded = BASE64
            .decode(key.trim())
            .map_err(|e| CosmosError::other(format!("invalid account key: {}", e)))?;
        Ok(Self::MasterKey(decoded))
    }

    /// Build the `authorization` header value for one request.
    pub(crate) fn authorization_header(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> String {
        match self {
            Self::MasterKey(key) => {
                let payload = format!(
                    "{}\n{}\n{}\n{}\n\n",
                    verb.to_lowercase(),
                    resource_type,
                    resource_link,
                    date.to_lowercase()
                );
                let mut mac =
                    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
                mac.update(payload.as_bytes());
                let signature = BASE64.encode(mac.finalize().into_bytes());
                percent_encode(&format!("type=master&ver=1.0&sig={}", signature))
            }
            Self::Bearer(token) => percent_encode(&format!("type=aad&ver=1.0&sig={}", token)),
        }
    }
}

/// RFC 1123 timestamp for the `x-ms-date` header.
pub(crate) fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Derive the data-plane token scope from the account endpoint.
pub(crate) fn data_plane_scope(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint)
        .map_err(|e| CosmosError::other(format!("invalid endpoint URL: {}", e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| CosmosError::other("endpoint URL has no host"))?;
    Ok(format!("{}://{}/.default", url.scheme(), host))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Acquire an AAD access token via the client-credentials grant.
pub(crate) async fn fetch_token(
    http: &reqwest::Client,
    principal: &ServicePrincipal,
    scope: &str,
) -> Result<String> {
    principal.validate()?;

    let token_url = format!(
        "{}/{}/oauth2/v2.0/token",
        principal.authority_host.trim_end_matches('/'),
        principal.tenant_id
    );
    debug!("requesting AAD token from {} for scope {}", token_url, scope);

    let params = [
        ("client_id", principal.client_id.as_str()),
        ("client_secret", principal.client_secret.as_str()),
        ("scope", scope),
        ("grant_type", "client_credentials"),
    ];

    let response = http.post(&token_url).form(&params).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CosmosError::other(format!(
            "token request failed with status {}: {}",
            status.as_u16(),
            body
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| CosmosError::other(format!("malformed token response: {}", e)))?;
    Ok(token.access_token)
}

fn percent_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
