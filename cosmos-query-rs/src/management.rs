//! Control-plane key retrieval
//!
//! Some service principals have no data-plane RBAC but can list account
//! keys through Azure Resource Manager. This module performs that one
//! `listKeys` action; the caller then connects with the returned primary
//! master key.

use serde::Deserialize;
use tracing::debug;

use crate::auth;
use crate::config::{ClientOptions, ServicePrincipal};
use crate::error::{CosmosError, Result};

const MANAGEMENT_API_VERSION: &str = "2021-04-15";

#[derive(Deserialize)]
struct DatabaseAccountKeys {
    #[serde(rename = "primaryMasterKey")]
    primary_master_key: String,
}

/// Retrieve the account's primary master key via ARM `listKeys`.
pub(crate) async fn list_primary_key(
    http: &reqwest::Client,
    options: &ClientOptions,
    principal: &ServicePrincipal,
    subscription_id: &str,
    resource_group: &str,
    account_name: &str,
) -> Result<String> {
    let management_endpoint = options.management_endpoint.trim_end_matches('/');
    let scope = format!("{}/.default", management_endpoint);
    let token = auth::fetch_token(http, principal, &scope).await?;

    let url = format!(
        "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.DocumentDB/databaseAccounts/{}/listKeys?api-version={}",
        management_endpoint, subscription_id, resource_group, account_name, MANAGEMENT_API_VERSION
    );
    debug!("listing account keys for {}", account_name);

    let response = http.post(&url).bearer_auth(&token).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CosmosError::other(format!(
            "listKeys request failed with status {}: {}",
            status.as_u16(),
            body
        )));
    }

    let keys: DatabaseAccountKeys = response
        .json()
        .await
        .map_err(|e| CosmosError::other(format!("malformed listKeys response: {}", e)))?;
    Ok(keys.primary_master_key)
}
