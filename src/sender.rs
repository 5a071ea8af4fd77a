use log::warn;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::packet::PACKET_DATA_SIZE;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use thiserror::Error;

use crate::priofee::priority_fee_estimate;

/// Protocol defined: the default compute units set for a transaction
const DEFAULT_INSTRUCTION_COMPUTE_UNIT: u32 = 200_000;
/// Safety margin added on top of simulated compute usage
const COMPUTE_UNIT_MARGIN: u32 = 50_000;
const BLOCKHASH_RETRIES: u8 = 3;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("RPC error: {0}")]
    ClientError(#[from] solana_rpc_client_api::client_error::Error),
    #[error("transaction is {0} bytes, above the {PACKET_DATA_SIZE}-byte packet limit")]
    TransactionTooLarge(u64),
    #[error("failed compiling message: {0}")]
    Compile(#[from] solana_sdk::message::CompileError),
    #[error(transparent)]
    SignerError(#[from] solana_sdk::signer::SignerError),
    #[error(transparent)]
    SerializeTxn(#[from] bincode::Error),
    #[error("failed to get blockhash data after {0} retries")]
    NoBlockhash(u8),
}

#[derive(Debug, Default, Clone)]
pub struct SendOptions {
    /// Explicit compute-unit price; takes precedence over the estimate URL.
    pub compute_unit_price_micro_lamports: Option<u64>,
    /// Priority-fee estimate endpoint, queried once per send.
    pub priofee_url: Option<String>,
    /// Skip simulation and pin the compute-unit limit.
    pub compute_unit_limit: Option<u32>,
}

/// Build one versioned transaction from `instructions`, pick a compute budget
/// (simulating unless pinned), sign, submit, and wait for confirmation.
pub async fn send_and_confirm_optimized(
    rpc_client: &RpcClient,
    instructions: &[Instruction],
    payer: &Keypair,
    additional_signers: &[&Keypair],
    lookup_tables: &[AddressLookupTableAccount],
    options: &SendOptions,
) -> Result<Signature, SendError> {
    let compute_units = match options.compute_unit_limit {
        Some(limit) => limit,
        None => {
            simulate_compute_units(rpc_client, instructions, &payer.pubkey(), lookup_tables)
                .await?
                .unwrap_or(DEFAULT_INSTRUCTION_COMPUTE_UNIT)
        }
    };

    let cu_price = match options.compute_unit_price_micro_lamports {
        Some(price) => Some(price),
        None => match &options.priofee_url {
            Some(url) => match priority_fee_estimate(url, None, None).await {
                Ok(estimate) => Some(estimate.per_compute_unit.medium),
                Err(e) => {
                    warn!("priority fee estimate failed, sending without one: {}", e);
                    None
                }
            },
            None => None,
        },
    };

    let mut final_instructions =
        vec![ComputeBudgetInstruction::set_compute_unit_limit(compute_units)];
    if let Some(price) = cu_price {
        final_instructions.push(ComputeBudgetInstruction::set_compute_unit_price(price));
    }
    final_instructions.extend_from_slice(instructions);

    let blockhash =
        get_blockhash_with_retry(rpc_client, rpc_client.commitment(), BLOCKHASH_RETRIES).await?;
    let message = v0::Message::try_compile(
        &payer.pubkey(),
        &final_instructions,
        lookup_tables,
        blockhash,
    )?;
    let mut signers: Vec<&Keypair> = vec![payer];
    signers.extend_from_slice(additional_signers);
    let transaction = VersionedTransaction::try_new(VersionedMessage::V0(message), &signers)?;

    let serialized_size = bincode::serialized_size(&transaction)?;
    if serialized_size > PACKET_DATA_SIZE as u64 {
        return Err(SendError::TransactionTooLarge(serialized_size));
    }

    let signature = rpc_client
        .send_and_confirm_transaction_with_spinner_and_config(
            &transaction,
            CommitmentConfig::confirmed(),
            RpcSendTransactionConfig {
                skip_preflight: true,
                preflight_commitment: Some(rpc_client.commitment().commitment),
                max_retries: Some(0),
                ..RpcSendTransactionConfig::default()
            },
        )
        .await?;
    Ok(signature)
}

async fn simulate_compute_units(
    rpc_client: &RpcClient,
    instructions: &[Instruction],
    payer: &Pubkey,
    lookup_tables: &[AddressLookupTableAccount],
) -> Result<Option<u32>, SendError> {
    let message = v0::Message::try_compile(payer, instructions, lookup_tables, Hash::default())?;
    let num_signatures = message.header.num_required_signatures as usize;
    let simulate_txn = VersionedTransaction {
        signatures: vec![Signature::default(); num_signatures],
        message: VersionedMessage::V0(message),
    };
    let result = rpc_client
        .simulate_transaction_with_config(
            &simulate_txn,
            RpcSimulateTransactionConfig {
                sig_verify: false,
                replace_recent_blockhash: true,
                commitment: Some(CommitmentConfig::confirmed()),
                ..Default::default()
            },
        )
        .await?;
    if let Some(err) = result.value.err {
        warn!("simulation failed ({err}), falling back to the default compute limit");
        return Ok(None);
    }
    Ok(result.value.units_consumed.and_then(|compute_units| {
        u32::try_from(compute_units)
            .ok()?
            .checked_add(COMPUTE_UNIT_MARGIN)
    }))
}

async fn get_blockhash_with_retry(
    rpc_client: &RpcClient,
    commitment: CommitmentConfig,
    retries: u8,
) -> Result<Hash, SendError> {
    for i in 0..retries {
        match rpc_client
            .get_latest_blockhash_with_commitment(commitment)
            .await
        {
            Ok((hash, _last_valid_block_height)) => return Ok(hash),
            Err(e) => warn!("i={}. Failed to get blockhash data: {}", i, e),
        }
    }
    Err(SendError::NoBlockhash(retries))
}
