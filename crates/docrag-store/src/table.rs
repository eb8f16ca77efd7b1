use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use docrag_core::{Error, Result};

use crate::schema::index_mapping;

pub(crate) fn backend(e: reqwest::Error) -> Error { Error::Backend(e.to_string()) }

/// Turns a non-2xx response into `Error::Backend` carrying the body.
pub(crate) async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Backend(format!("{status}: {body}")))
}

/// Cluster liveness probe. The error is the reason to report once retries run out.
pub async fn ping(http: &Client, base: &str) -> std::result::Result<(), String> {
    match http.get(format!("{base}/")).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => Err(format!("ping returned {}", resp.status())),
        Err(e) => Err(e.to_string()),
    }
}

pub async fn index_exists(http: &Client, base: &str, index: &str) -> Result<bool> {
    let resp = http.head(format!("{base}/{index}")).send().await.map_err(backend)?;
    match resp.status() {
        StatusCode::NOT_FOUND => Ok(false),
        status if status.is_success() => Ok(true),
        status => Err(Error::Backend(format!("index lookup returned {status}"))),
    }
}

/// Creates `index` with the fixed mapping unless it already exists.
pub async fn ensure_index(http: &Client, base: &str, index: &str, dims: usize) -> Result<()> {
    if index_exists(http, base, index).await? {
        debug!(index, "index already exists");
        return Ok(());
    }
    let resp = http.put(format!("{base}/{index}")).json(&index_mapping(dims)).send().await.map_err(backend)?;
    if resp.status() == StatusCode::BAD_REQUEST {
        // lost a creation race with another process
        let body = resp.text().await.unwrap_or_default();
        if body.contains("resource_already_exists_exception") {
            return Ok(());
        }
        return Err(Error::Backend(format!("index creation rejected: {body}")));
    }
    check(resp).await?;
    info!(index, dims, "created index");
    Ok(())
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

pub async fn count(http: &Client, base: &str, index: &str) -> Result<u64> {
    let resp = http.get(format!("{base}/{index}/_count")).send().await.map_err(backend)?;
    if resp.status() == StatusCode::NOT_FOUND {
        return Ok(0);
    }
    let body: CountResponse = check(resp).await?.json().await.map_err(backend)?;
    Ok(body.count)
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: u64,
}

/// Deletes the documents matching `query` and waits for the refresh.
pub async fn delete_by_query(http: &Client, base: &str, index: &str, query: Value) -> Result<u64> {
    let resp = http
        .post(format!("{base}/{index}/_delete_by_query?refresh=true&conflicts=proceed"))
        .json(&json!({ "query": query }))
        .send()
        .await
        .map_err(backend)?;
    if resp.status() == StatusCode::NOT_FOUND {
        return Ok(0);
    }
    let body: DeleteResponse = check(resp).await?.json().await.map_err(backend)?;
    Ok(body.deleted)
}
