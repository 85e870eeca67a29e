//! Configuration for the Cosmos DB query client
//!
//! Connection parameters are passed explicitly by the caller; what lives
//! here is the service-principal material (loadable from the environment
//! variables the runbook platform injects) and per-client transport
//! options.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CosmosError, Result};

/// Default AAD token authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default Azure Resource Manager endpoint
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Service principal credentials for Azure AD authentication
///
/// Loaded from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and
/// `AZURE_CLIENT_SECRET` (the `azure_credentials` secret contract), with
/// an optional `AZURE_AUTHORITY_HOST` override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePrincipal {
    /// Azure AD tenant ID
    pub tenant_id: String,

    /// Application (client) ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Token authority host (can be changed for sovereign clouds or tests)
    pub authority_host: String,
}

impl ServicePrincipal {
    /// Create a service principal with the default authority host.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        }
    }

    /// Load the principal from the environment.
    pub fn from_env() -> Result<Self> {
        let principal = Self {
            tenant_id: require_env("AZURE_TENANT_ID")?,
            client_id: require_env("AZURE_CLIENT_ID")?,
            client_secret: require_env("AZURE_CLIENT_SECRET")?,
            authority_host: env::var("AZURE_AUTHORITY_HOST")
                .unwrap_or_else(|_| DEFAULT_AUTHORITY_HOST.to_string()),
        };

        principal.validate()?;
        Ok(principal)
    }

    /// Override the token authority host.
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into();
        self
    }

    /// Validate this principal.
    pub fn validate(&self) -> Result<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(CosmosError::other("Azure tenant ID is required"));
        }
        if self.client_id.trim().is_empty() {
            return Err(CosmosError::other("Azure client ID is required"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(CosmosError::other("Azure client secret is required"));
        }
        if self.authority_host.trim().is_empty() {
            return Err(CosmosError::other("Token authority host is required"));
        }

        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| CosmosError::other(format!("Environment variable not set: {}", key)))
}

/// Per-client transport options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout; `None` leaves the transport default in place
    pub timeout: Option<Duration>,

    /// User agent sent with every request
    pub user_agent: String,

    /// Azure Resource Manager endpoint (can be changed for tests)
    pub management_endpoint: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!("cosmos-query-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            management_endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
        }
    }
}
