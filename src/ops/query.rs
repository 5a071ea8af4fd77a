use anyhow::anyhow;
use log::warn;
use solana_account_decoder::UiAccountEncoding;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use spl_associated_token_account::get_associated_token_address_with_program_id;

use super::OpsContext;
use crate::vault::{derive_vault_strategy_auth, StrategyInitReceiptSlice, VaultSlice};

/// Print the vault's total position plus one block per initialized strategy:
/// its receipt address, strategy key, last refreshed value, and the live
/// balance of the strategy's token account.
pub async fn query_positions(ctx: &OpsContext) -> anyhow::Result<()> {
    let common = &ctx.common;
    let vault_account = ctx.rpc_client.get_account(&common.vault).await?;
    let vault_slice = VaultSlice::decode(&vault_account.data, None)
        .ok_or_else(|| anyhow!("vault account {} has an unexpected layout", common.vault))?;
    println!("vault total position: {}", vault_slice.asset_total_value);

    let receipts = ctx
        .rpc_client
        .get_program_accounts_with_config(
            &common.vault_program_id,
            RpcProgramAccountsConfig {
                filters: Some(vec![
                    RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                        0,
                        &StrategyInitReceiptSlice::DISCRIMINATOR,
                    )),
                    RpcFilterType::Memcmp(Memcmp::new_base58_encoded(8, common.vault.as_ref())),
                ]),
                account_config: RpcAccountInfoConfig {
                    encoding: Some(UiAccountEncoding::Base64),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await?;

    for (receipt_address, account) in receipts {
        let Some(receipt) = StrategyInitReceiptSlice::decode(&account.data) else {
            warn!("skipping receipt {} with an unexpected layout", receipt_address);
            continue;
        };
        println!("--------------------------------");
        println!("allocation: {receipt_address}");
        println!("strategy: {}", receipt.strategy);
        println!("last refreshed value (in asset): {}", receipt.position_value);

        // The strategy key is a mint for spot strategies; its owner is the
        // token program to derive the position's ATA with.
        let token_program = match ctx.rpc_client.get_account(&receipt.strategy).await {
            Ok(strategy_account) => strategy_account.owner,
            Err(e) => {
                warn!("strategy account {} unavailable: {}", receipt.strategy, e);
                continue;
            }
        };
        let (vault_strategy_auth, _) = derive_vault_strategy_auth(
            &common.vault,
            &receipt.strategy,
            &common.vault_program_id,
        );
        let strategy_ata = get_associated_token_address_with_program_id(
            &vault_strategy_auth,
            &receipt.strategy,
            &token_program,
        );
        match ctx.rpc_client.get_token_account_balance(&strategy_ata).await {
            Ok(balance) => println!("current raw amount (in strategy mint): {}", balance.amount),
            Err(e) => warn!("balance of {} unavailable: {}", strategy_ata, e),
        }
    }
    Ok(())
}
