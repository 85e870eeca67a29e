//! Cosmos DB query client
//!
//! The client owns one HTTP client and at most one open connection.
//! `connect` replaces any previous connection wholesale (last writer
//! wins); query operations fail with [`CosmosError::NotConnected`] until a
//! connection exists. Queries always request cross-partition fan-out and
//! drain every continuation page before returning.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{self, AuthMaterial, CosmosCredential};
use crate::config::{ClientOptions, ServicePrincipal};
use crate::error::{mapping, CosmosError, Result};
use crate::management;

const COSMOS_API_VERSION: &str = "2018-12-31";

/// Matches COUNT aggregate calls without tripping on fields named "count"
static COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCOUNT\s*\(").expect("COUNT pattern is valid"));

/// One query request against a database/container pair
///
/// The query text is opaque to this crate: it is never parsed or validated
/// beyond the COUNT-aggregate classification in
/// [`CosmosQueryClient::count_query_results`]. Parameters, when present,
/// are a flat JSON object mapping bind names (conventionally
/// `@`-prefixed) to scalar values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Database name
    pub database: String,

    /// Container name
    pub container: String,

    /// Query text in the Cosmos SQL dialect
    pub query: String,

    /// Optional bind parameters as a flat JSON object,
    /// e.g. `{"@status": "error"}`
    pub parameters: Option<String>,
}

impl QuerySpec {
    /// Create a spec without bind parameters.
    pub fn new(
        database: impl Into<String>,
        container: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
            query: query.into(),
            parameters: None,
        }
    }

    /// Attach bind parameters as a JSON object string.
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    /// Parse the parameter object into positional bind pairs.
    fn bind_parameters(&self) -> Result<Vec<QueryParameter>> {
        let Some(raw) = &self.parameters else {
            return Ok(Vec::new());
        };

        let object: serde_json::Map<String, Value> = serde_json::from_str(raw)?;
        Ok(object
            .into_iter()
            .map(|(name, value)| QueryParameter { name, value })
            .collect())
    }
}

#[derive(Debug, Clone, Serialize)]
struct QueryParameter {
    name: String,
    value: Value,
}

#[derive(Serialize)]
struct QueryRequest {
    query: String,
    parameters: Vec<QueryParameter>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

/// An open connection: endpoint plus resolved auth material
#[derive(Debug, Clone)]
struct Connection {
    endpoint: String,
    auth: AuthMaterial,
}

/// Client for executing SQL queries against Cosmos DB containers
pub struct CosmosQueryClient {
    http: reqwest::Client,
    options: ClientOptions,
    connection: Option<Connection>,
}

impl CosmosQueryClient {
    /// Create a client with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(ClientOptions::default())
    }

    /// Create a client with custom transport options.
    pub fn with_options(options: ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(&options.user_agent);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| CosmosError::other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            options,
            connection: None,
        })
    }

    /// Whether a connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Connect to an account endpoint.
    ///
    /// Single attempt, no retry. A previously open connection is replaced
    /// wholesale. For [`CosmosCredential::AzureAd`] the token is acquired
    /// here, so credential failures surface as connection errors.
    pub async fn connect(&mut self, endpoint: &str, credential: CosmosCredential) -> Result<()> {
        let auth = match credential {
            CosmosCredential::MasterKey(key) => {
                let auth = AuthMaterial::from_master_key(&key)
                    .map_err(|e| CosmosError::connection(e.to_string()))?;
                info!(
                    "Successfully connected to Cosmos DB account at {} using key authentication",
                    endpoint
                );
                auth
            }
            CosmosCredential::AzureAd(principal) => {
                let auth = self
                    .acquire_data_plane_token(endpoint, &principal)
                    .await
                    .map_err(|e| CosmosError::connection(e.to_string()))?;
                info!(
                    "Successfully connected to Cosmos DB account at {} using Azure AD authentication",
                    endpoint
                );
                auth
            }
        };

        self.connection = Some(Connection {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth,
        });
        Ok(())
    }

    /// Connect by retrieving the account key through the management plane.
    ///
    /// Useful when the principal lacks data-plane RBAC but holds the
    /// `listKeys` action on the account. After retrieval the connection
    /// behaves exactly like a master-key connection.
    pub async fn connect_with_retrieved_key(
        &mut self,
        endpoint: &str,
        subscription_id: &str,
        resource_group: &str,
        account_name: &str,
        principal: &ServicePrincipal,
    ) -> Result<()> {
        let key = management::list_primary_key(
            &self.http,
            &self.options,
            principal,
            subscription_id,
            resource_group,
            account_name,
        )
        .await
        .map_err(|e| CosmosError::key_retrieval(e.to_string()))?;

        let auth = AuthMaterial::from_master_key(&key)
            .map_err(|e| CosmosError::key_retrieval(e.to_string()))?;
        self.connection = Some(Connection {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth,
        });
        info!(
            "Successfully connected to Cosmos DB account at {} using key retrieved via Azure AD (control plane)",
            endpoint
        );
        Ok(())
    }

    async fn acquire_data_plane_token(
        &self,
        endpoint: &str,
        principal: &ServicePrincipal,
    ) -> Result<AuthMaterial> {
        let scope = auth::data_plane_scope(endpoint)?;
        let token = auth::fetch_token(&self.http, principal, &scope).await?;
        Ok(AuthMaterial::Bearer(token))
    }

    /// Execute a query and return the drained documents.
    pub async fn query_items(&self, spec: &QuerySpec) -> Result<Vec<Value>> {
        let connection = self.connection.as_ref().ok_or(CosmosError::NotConnected)?;

        self.run_query(connection, spec).await.map_err(|err| match err {
            CosmosError::Other(message) => {
                CosmosError::other(format!("Failed to query container: {}", message))
            }
            other => other,
        })
    }

    /// Execute a query and return the results as a pretty-printed JSON
    /// array string, the form the runbook keywords consume.
    pub async fn query_container(&self, spec: &QuerySpec) -> Result<String> {
        let items = self.query_items(spec).await?;
        serde_json::to_string_pretty(&items)
            .map_err(|e| CosmosError::other(format!("Failed to serialize query results: {}", e)))
    }

    /// Execute a query and reduce the results to a single count.
    ///
    /// Serves both aggregate queries (`SELECT COUNT(1) FROM c ...`, in any
    /// of the result shapes the engine produces) and plain row-selecting
    /// queries, whose cardinality is the answer. Best effort: the query
    /// grammar is never parsed beyond the COUNT classification.
    pub async fn count_query_results(&self, spec: &QuerySpec) -> Result<i64> {
        if self.connection.is_none() {
            return Err(CosmosError::NotConnected);
        }

        let items = match self.query_items(spec).await {
            Ok(items) => items,
            Err(CosmosError::NotConnected) => return Err(CosmosError::NotConnected),
            Err(err) => {
                return Err(CosmosError::other(format!(
                    "Failed to count query results: {}",
                    err
                )))
            }
        };

        reduce_count(&spec.query, &items).map_err(|cause| {
            CosmosError::other(format!("Failed to count query results: {}", cause))
        })
    }

    async fn run_query(&self, connection: &Connection, spec: &QuerySpec) -> Result<Vec<Value>> {
        let parameters = spec.bind_parameters()?;
        let request = QueryRequest {
            query: spec.query.clone(),
            parameters,
        };
        let payload = serde_json::to_vec(&request)?;

        let url = format!(
            "{}/dbs/{}/colls/{}/docs",
            connection.endpoint, spec.database, spec.container
        );
        let resource_link = format!("dbs/{}/colls/{}", spec.database, spec.container);
        debug!("querying {} ({})", url, spec.query);

        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let date = auth::rfc1123_now();
            let authorization =
                connection
                    .auth
                    .authorization_header("post", "docs", &resource_link, &date);

            let mut builder = self
                .http
                .post(&url)
                .header("authorization", authorization)
                .header("x-ms-date", date)
                .header("x-ms-version", COSMOS_API_VERSION)
                .header("x-ms-documentdb-isquery", "true")
                .header("x-ms-documentdb-query-enablecrosspartition", "true")
                .header(CONTENT_TYPE, "application/query+json")
                .body(payload.clone());
            if let Some(token) = &continuation {
                builder = builder.header("x-ms-continuation", token);
            }

            let response = builder.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(mapping::map_query_error(status, &body));
            }

            continuation = response
                .headers()
                .get("x-ms-continuation")
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let page: QueryResponse = response.json().await?;
            documents.extend(page.documents);

            if continuation.is_none() {
                break;
            }
            debug!("draining continuation page ({} documents so far)", documents.len());
        }

        Ok(documents)
    }
}

/// Reduce a drained result set to a single count.
///
/// Aggregate queries take the first row in whichever shape the engine
/// produced (`SELECT VALUE COUNT(1)` yields a bare number, `SELECT
/// COUNT(1)` an object keyed `$1`); everything else is counted by rows.
fn reduce_count(query: &str, items: &[Value]) -> std::result::Result<i64, String> {
    if !COUNT_RE.is_match(query) {
        return Ok(items.len() as i64);
    }

    let Some(first) = items.first() else {
        return Ok(0);
    };

    match first {
        Value::Number(n) => Ok(truncate_number(n)),
        Value::Object(object) => {
            for key in ["$1", "count", "Count"] {
                if let Some(value) = object.get(key) {
                    return coerce_int(value)
                        .ok_or_else(|| format!("count field \"{}\" is not numeric: {}", key, value));
                }
            }
            // No named count field: use the first value in insertion order
            // when it is numeric, otherwise count rows.
            match object.values().next() {
                Some(Value::Number(n)) => Ok(truncate_number(n)),
                _ => Ok(items.len() as i64),
            }
        }
        other => Ok(coerce_int(other).unwrap_or(items.len() as i64)),
    }
}

fn truncate_number(n: &serde_json::Number) -> i64 {
    n.as_i64()
        .or_else(|| n.as_f64().map(|f| f as i64))
        .unwrap_or(0)
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => Some(truncate_number(n)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
