use serde::Deserialize;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

/// Query half of the `/quote` call. Amounts are base units.
#[derive(Debug, Clone, Copy)]
pub struct QuoteParams {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount: u64,
    pub slippage_bps: u16,
    pub max_accounts: usize,
}

/// A quote as returned by the aggregator. The full body is kept as an opaque
/// `Value` because the swap-instructions call expects it echoed back verbatim;
/// only the worst-case output amount is parsed out for validation.
#[derive(Debug, Clone)]
pub struct Quote {
    pub other_amount_threshold: u64,
    raw: Value,
}

impl Quote {
    pub fn try_from_value(value: Value) -> Result<Self, String> {
        let other_amount_threshold = value
            .get("otherAmountThreshold")
            .and_then(|v| v.as_str())
            .ok_or("missing otherAmountThreshold field")?
            .parse::<u64>()
            .map_err(|e| format!("invalid otherAmountThreshold: {e}"))?;
        Ok(Quote {
            other_amount_threshold,
            raw: value,
        })
    }

    /// The verbatim quote body, for echoing into the swap-instructions request.
    pub fn payload(&self) -> &Value {
        &self.raw
    }
}

/// Raw `/swap-instructions` response body. The service signals failure through
/// an `error` field rather than a status code, so both arms are optional here
/// and the client converts this into a proper `Result`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructionsResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub swap_instruction: Option<SwapInstruction>,
    #[serde(default)]
    pub address_lookup_table_addresses: Vec<PubkeyString>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstruction {
    #[serde(with = "field_as_string")]
    pub program_id: Pubkey,
    pub accounts: Vec<SwapAccountMeta>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapAccountMeta {
    #[serde(with = "field_as_string")]
    pub pubkey: Pubkey,
    pub is_writable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubkeyString(#[serde(with = "field_as_string")] pub Pubkey);

/// A validated swap-instructions response.
#[derive(Debug, Clone)]
pub struct SwapInstructionsPayload {
    pub swap_instruction: SwapInstruction,
    pub address_lookup_table_addresses: Vec<Pubkey>,
}

pub mod field_as_string {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD
            .decode(raw.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_parses_threshold_and_keeps_body() {
        let body = json!({
            "inputMint": "So11111111111111111111111111111111111111112",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "inAmount": "1000000",
            "outAmount": "995000",
            "otherAmountThreshold": "990000",
            "routePlan": []
        });
        let quote = Quote::try_from_value(body.clone()).unwrap();
        assert_eq!(quote.other_amount_threshold, 990_000);
        assert_eq!(quote.payload(), &body);
    }

    #[test]
    fn quote_rejects_missing_threshold() {
        let err = Quote::try_from_value(json!({ "inAmount": "1" })).unwrap_err();
        assert!(err.contains("otherAmountThreshold"));
    }

    #[test]
    fn swap_instructions_response_deserializes() {
        let body = json!({
            "swapInstruction": {
                "programId": "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",
                "accounts": [
                    { "pubkey": "So11111111111111111111111111111111111111112", "isWritable": false },
                    { "pubkey": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "isWritable": true }
                ],
                "data": "AQIDBA=="
            },
            "addressLookupTableAddresses": ["So11111111111111111111111111111111111111112"]
        });
        let response: SwapInstructionsResponse = serde_json::from_value(body).unwrap();
        assert!(response.error.is_none());
        let ix = response.swap_instruction.unwrap();
        assert_eq!(ix.data, vec![1, 2, 3, 4]);
        assert_eq!(ix.accounts.len(), 2);
        assert!(ix.accounts[1].is_writable);
        assert_eq!(response.address_lookup_table_addresses.len(), 1);
    }

    #[test]
    fn swap_instructions_error_body_deserializes() {
        let response: SwapInstructionsResponse =
            serde_json::from_value(json!({ "error": "route not found" })).unwrap();
        assert_eq!(response.error.as_deref(), Some("route not found"));
        assert!(response.swap_instruction.is_none());
    }
}
