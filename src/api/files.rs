use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::common::app_error::{AppError, StdResponse};

#[derive(Serialize)]
struct PromoteFileReq<'a> {
    key: &'a str,
    destination: &'a str,
}

#[derive(Deserialize)]
struct PromotedFile {
    path: String,
}

/// Permanent storage prefix for files attached to an order item.
pub fn order_file_destination(order_id: i32, order_item_id: i32) -> String {
    format!("orders/{order_id}/items/{order_item_id}")
}

/// Moves a pending upload to `destination` and returns its permanent path.
pub async fn promote_pending_file(
    client: &Client,
    file_service_url: &str,
    key: &str,
    destination: &str,
) -> Result<String> {
    let res: StdResponse<PromotedFile, String> = client
        .post(format!("{file_service_url}/files/promote"))
        .json(&PromoteFileReq { key, destination })
        .send()
        .await
        .map_err(|_| AppError::ServiceUnreachable("FileService".into()))?
        .error_for_status()
        .context("File service rejected the promotion")?
        .json()
        .await
        .context("Failed to parse JSON")?;

    res.data
        .map(|file| file.path)
        .context("File service returned no path")
}
