pub mod types;

use reqwest::StatusCode;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use types::{Quote, QuoteParams, SwapInstructionsPayload, SwapInstructionsResponse};

const QUOTE_PATH: &str = "/quote";
const SWAP_INSTRUCTIONS_PATH: &str = "/swap-instructions";

#[derive(Debug, Error)]
pub enum JupiterApiError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("{endpoint} returned status {status}: {body}")]
    ApiStatus {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("aggregator error: {0}")]
    Service(String),
    #[error("unexpected aggregator response: {0}")]
    Schema(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub struct JupiterApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl JupiterApiClient {
    pub fn new(base_url: String) -> Self {
        JupiterApiClient {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn quote(&self, params: &QuoteParams) -> Result<Quote, JupiterApiError> {
        let url = format!(
            "{}{}?inputMint={}&outputMint={}&amount={}&slippageBps={}&maxAccounts={}",
            self.base_url,
            QUOTE_PATH,
            params.input_mint,
            params.output_mint,
            params.amount,
            params.slippage_bps,
            params.max_accounts,
        );
        let json = self.get_json(url).await?;
        Quote::try_from_value(json).map_err(JupiterApiError::Schema)
    }

    pub async fn swap_instructions(
        &self,
        quote: &Quote,
        user_public_key: &Pubkey,
    ) -> Result<SwapInstructionsPayload, JupiterApiError> {
        let url = format!("{}{}", self.base_url, SWAP_INSTRUCTIONS_PATH);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "quoteResponse": quote.payload(),
                "userPublicKey": user_public_key.to_string(),
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(JupiterApiError::ApiStatus {
                endpoint: url,
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.json::<SwapInstructionsResponse>().await?;
        if let Some(message) = body.error {
            return Err(JupiterApiError::Service(message));
        }
        // A 200 body with neither an error nor a swap instruction is treated
        // as a service failure, never as success.
        let swap_instruction = body
            .swap_instruction
            .ok_or_else(|| JupiterApiError::Schema("missing swapInstruction field".to_string()))?;
        Ok(SwapInstructionsPayload {
            swap_instruction,
            address_lookup_table_addresses: body
                .address_lookup_table_addresses
                .into_iter()
                .map(|wrapper| wrapper.0)
                .collect(),
        })
    }

    async fn get_json(&self, url: String) -> Result<serde_json::Value, JupiterApiError> {
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(JupiterApiError::ApiStatus {
                endpoint: url,
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<serde_json::Value>().await?)
    }
}
