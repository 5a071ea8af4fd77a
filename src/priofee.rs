use anyhow::{anyhow, bail};
use serde::Deserialize;
use serde_json::json;

// https://marketplace.quicknode.com/add-on/solana-priority-fee

const DEFAULT_N_BLOCKS: u16 = 100;

/// One-shot priority-fee estimate. Each run builds a single transaction, so
/// there is no polling task here; a failed estimate is the caller's signal to
/// fall back to a default fee.
pub async fn priority_fee_estimate(
    url: &str,
    n_blocks: Option<u16>,
    account: Option<String>,
) -> anyhow::Result<PriofeeEstimate> {
    let last_n_blocks = n_blocks.unwrap_or(DEFAULT_N_BLOCKS);
    let mut params = json!({
        "last_n_blocks": last_n_blocks
    });
    if let Some(account) = account {
        params
            .as_object_mut()
            .map(|m| m.insert("account".to_string(), json!(account)));
    }
    let response = reqwest::Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "qn_estimatePriorityFees",
            "params": params
        }))
        .send()
        .await;

    let mut json = match response {
        Ok(response) => response.json::<serde_json::Value>().await?,
        Err(err) => bail!("Priofee req send error: {err}"),
    };

    if let Some(result) = json.get_mut("result").map(|res| res.take()) {
        Ok(serde_json::from_value(result)?)
    } else if let Some(error) = json.get_mut("error").map(|err| err.take()) {
        Err(anyhow!("qn_estimatePriorityFees error: {}", error))
    } else {
        Err(anyhow!("qn_estimatePriorityFees error: Invalid response"))
    }
}

#[derive(Copy, Clone, Deserialize, Debug)]
pub struct PriofeeEstimate {
    /// Estimates in microlamports, per compute unit
    pub per_compute_unit: Priority,
    /// Estimates in lamports, per transaction
    pub per_transaction: Priority,
}

#[derive(Copy, Clone, Deserialize, Debug)]
pub struct Priority {
    /// Fee estimate for 95th percentile
    pub extreme: u64,
    /// Fee estimate for 80th percentile
    pub high: u64,
    /// Fee estimate for 60th percentile
    pub medium: u64,
    /// Fee estimate for 40th percentile
    pub low: u64,
}
