pub mod archive;

use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use tracing::warn;

use crate::error::FetchError;
use crate::process::table::{parse_table, RawTable};

/// Shared client for all indicator downloads. The timeout bounds the whole
/// request so a hung upstream cannot stall the refresh loop past one cycle.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Fetch one indicator bundle and decode it into a table.
///
/// Failures never escape this boundary: each is logged with its cause and
/// collapsed into `None`, so a caller only ever sees hit-or-miss. Retrying is
/// left to the refresh cadence.
pub async fn fetch_dataset(client: &Client, url: &str) -> Option<RawTable> {
    match try_fetch(client, url).await {
        Ok(table) => Some(table),
        Err(err) => {
            warn!(%url, error = %err, "fetching dataset failed");
            None
        }
    }
}

async fn try_fetch(client: &Client, url: &str) -> Result<RawTable, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status));
    }

    let bytes = response.bytes().await?;
    let text = archive::extract_entry(&bytes, archive::DATA_ENTRY_PREFIX)?;
    parse_table(&text)
}
