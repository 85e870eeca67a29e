//! Query a Cosmos DB container from the command line.
//!
//! ```text
//! COSMOS_ENDPOINT=https://myaccount.documents.azure.com:443/ \
//! COSMOS_KEY=... \
//! cargo run --example query_container -- mydb mycontainer "SELECT * FROM c"
//! ```
//!
//! Leave `COSMOS_KEY` unset to authenticate with the `AZURE_*` service
//! principal variables instead.

use cosmos_query_rs::{CosmosCredential, CosmosQueryClient, QuerySpec};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let endpoint = std::env::var("COSMOS_ENDPOINT")?;
    let key = std::env::var("COSMOS_KEY").ok();

    let mut args = std::env::args().skip(1);
    let database = args.next().unwrap_or_else(|| "mydb".to_string());
    let container = args.next().unwrap_or_else(|| "mycontainer".to_string());
    let query = args.next().unwrap_or_else(|| "SELECT * FROM c".to_string());

    let mut client = CosmosQueryClient::new()?;
    let credential = CosmosCredential::from_key_or_env(key.as_deref())?;
    client.connect(&endpoint, credential).await?;

    let spec = QuerySpec::new(database, container, query);
    println!("{}", client.query_container(&spec).await?);
    println!("count: {}", client.count_query_results(&spec).await?);

    Ok(())
}
