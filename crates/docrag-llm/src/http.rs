use std::time::Duration;

use reqwest::{Client, Response};

use docrag_core::{Error, Result};

pub(crate) fn client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))
}

pub(crate) fn transport(provider: &str, e: reqwest::Error) -> Error {
    Error::Generation(format!("{provider} request failed: {e}"))
}

/// Maps a non-2xx reply to `Error::Generation` with the body attached.
pub(crate) async fn check(provider: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Generation(format!("{provider} returned {status}: {body}")))
}
