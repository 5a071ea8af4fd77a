use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;

use super::OpsContext;
use crate::config::SpotOpts;
use crate::lut::get_lookup_table_accounts;
use crate::sender::send_and_confirm_optimized;
use crate::swap_setup::{assemble_swap, InstructionBuildContext, SwapSetupRequest};
use crate::token::setup_token_account;
use crate::vault::instructions::{
    deposit_strategy, initialize_strategy, withdraw_strategy, INITIALIZE_SPOT, SWAP_SPOT,
};
use crate::vault::{derive_oracle_init_receipt, derive_vault_strategy_auth};

// The spot strategy is keyed by the foreign mint itself.
struct SpotAddresses {
    vault_strategy_auth: Pubkey,
    asset_oracle_receipt: Pubkey,
    foreign_oracle_receipt: Pubkey,
    asset_ata: Pubkey,
    foreign_ata: Pubkey,
}

async fn setup_spot_addresses(
    ctx: &OpsContext,
    spot: &SpotOpts,
    instructions: &mut Vec<Instruction>,
) -> anyhow::Result<SpotAddresses> {
    let common = &ctx.common;
    let (vault_strategy_auth, _) = derive_vault_strategy_auth(
        &common.vault,
        &spot.foreign_mint,
        &common.vault_program_id,
    );
    let asset_ata = setup_token_account(
        &ctx.rpc_client,
        &ctx.manager.pubkey(),
        &common.asset_mint,
        &vault_strategy_auth,
        &common.asset_token_program,
        instructions,
    )
    .await?;
    let foreign_ata = setup_token_account(
        &ctx.rpc_client,
        &ctx.manager.pubkey(),
        &spot.foreign_mint,
        &vault_strategy_auth,
        &spot.foreign_token_program,
        instructions,
    )
    .await?;
    let (asset_oracle_receipt, _) = derive_oracle_init_receipt(
        &vault_strategy_auth,
        &common.asset_mint,
        &common.adaptor_program_id,
    );
    let (foreign_oracle_receipt, _) = derive_oracle_init_receipt(
        &vault_strategy_auth,
        &spot.foreign_mint,
        &common.adaptor_program_id,
    );
    Ok(SpotAddresses {
        vault_strategy_auth,
        asset_oracle_receipt,
        foreign_oracle_receipt,
        asset_ata,
        foreign_ata,
    })
}

pub async fn initialize_spot(ctx: &OpsContext, spot: &SpotOpts) -> anyhow::Result<()> {
    let common = &ctx.common;
    let mut instructions = Vec::new();
    let addresses = setup_spot_addresses(ctx, spot, &mut instructions).await?;

    let remaining_accounts = vec![
        AccountMeta::new_readonly(common.asset_mint, false),
        AccountMeta::new_readonly(addresses.asset_ata, false),
        AccountMeta::new_readonly(common.asset_token_program, false),
        AccountMeta::new_readonly(spot.asset_oracle, false),
        AccountMeta::new(addresses.asset_oracle_receipt, false),
        AccountMeta::new_readonly(addresses.foreign_ata, false),
        AccountMeta::new_readonly(spot.foreign_token_program, false),
        AccountMeta::new_readonly(spot.foreign_oracle, false),
        AccountMeta::new(addresses.foreign_oracle_receipt, false),
    ];
    instructions.push(initialize_strategy(
        &common.vault_program_id,
        &ctx.manager.pubkey(),
        &ctx.manager.pubkey(),
        &common.vault,
        &spot.foreign_mint,
        &common.adaptor_program_id,
        INITIALIZE_SPOT,
        remaining_accounts,
    ));

    let lookup_tables = match common.lookup_table_address {
        Some(address) => get_lookup_table_accounts(&ctx.rpc_client, &[address]).await?,
        None => Vec::new(),
    };
    let signature = send_and_confirm_optimized(
        &ctx.rpc_client,
        &instructions,
        &ctx.manager,
        &[],
        &lookup_tables,
        &ctx.send_options(),
    )
    .await?;
    println!("Spot initialized with signature: {signature}");
    Ok(())
}

/// Swap-augmented head for buy and sell: fixed oracle accounts first, the
/// aggregator route is appended after them by the swap assembler.
fn spot_movement_head(spot: &SpotOpts, addresses: &SpotAddresses) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(spot.asset_oracle, false),
        AccountMeta::new_readonly(addresses.asset_oracle_receipt, false),
        AccountMeta::new(addresses.foreign_ata, false),
        AccountMeta::new_readonly(spot.foreign_token_program, false),
        AccountMeta::new_readonly(spot.foreign_oracle, false),
        AccountMeta::new_readonly(addresses.foreign_oracle_receipt, false),
    ]
}

pub async fn buy_spot(ctx: &OpsContext, spot: &SpotOpts, amount: u64) -> anyhow::Result<()> {
    let common = &ctx.common;
    let mut instructions = Vec::new();
    let addresses = setup_spot_addresses(ctx, spot, &mut instructions).await?;

    let mut context = InstructionBuildContext::new(
        spot_movement_head(spot, &addresses),
        common.lookup_table_address,
    );
    assemble_swap(
        &ctx.jupiter,
        &SwapSetupRequest {
            input_mint: common.asset_mint,
            output_mint: spot.foreign_mint,
            amount_in: amount,
            minimum_threshold_amount_out: spot.minimum_threshold_amount_out,
            slippage_bps: spot.slippage_bps,
            max_accounts: spot.max_accounts,
        },
        &addresses.vault_strategy_auth,
        &mut context,
    )
    .await?;

    instructions.push(deposit_strategy(
        &common.vault_program_id,
        &ctx.manager.pubkey(),
        &common.vault,
        &spot.foreign_mint,
        &common.adaptor_program_id,
        &common.asset_mint,
        &common.asset_token_program,
        amount,
        SWAP_SPOT,
        context.additional_args().map(|args| args.to_vec()),
        context.remaining_accounts.clone(),
    ));

    let lookup_tables =
        get_lookup_table_accounts(&ctx.rpc_client, &context.lookup_table_addresses).await?;
    let signature = send_and_confirm_optimized(
        &ctx.rpc_client,
        &instructions,
        &ctx.manager,
        &[],
        &lookup_tables,
        &ctx.send_options(),
    )
    .await?;
    println!("Spot bought with signature: {signature}");
    Ok(())
}

/// `amount` is denominated in the foreign mint; the route swaps it back into
/// the vault asset.
pub async fn sell_spot(ctx: &OpsContext, spot: &SpotOpts, amount: u64) -> anyhow::Result<()> {
    let common = &ctx.common;
    let mut instructions = Vec::new();
    let addresses = setup_spot_addresses(ctx, spot, &mut instructions).await?;

    let mut context = InstructionBuildContext::new(
        spot_movement_head(spot, &addresses),
        common.lookup_table_address,
    );
    assemble_swap(
        &ctx.jupiter,
        &SwapSetupRequest {
            input_mint: spot.foreign_mint,
            output_mint: common.asset_mint,
            amount_in: amount,
            minimum_threshold_amount_out: spot.minimum_threshold_amount_out,
            slippage_bps: spot.slippage_bps,
            max_accounts: spot.max_accounts,
        },
        &addresses.vault_strategy_auth,
        &mut context,
    )
    .await?;

    instructions.push(withdraw_strategy(
        &common.vault_program_id,
        &ctx.manager.pubkey(),
        &common.vault,
        &spot.foreign_mint,
        &common.adaptor_program_id,
        &common.asset_mint,
        &common.asset_token_program,
        amount,
        SWAP_SPOT,
        context.additional_args().map(|args| args.to_vec()),
        context.remaining_accounts.clone(),
    ));

    let lookup_tables =
        get_lookup_table_accounts(&ctx.rpc_client, &context.lookup_table_addresses).await?;
    let signature = send_and_confirm_optimized(
        &ctx.rpc_client,
        &instructions,
        &ctx.manager,
        &[],
        &lookup_tables,
        &ctx.send_options(),
    )
    .await?;
    println!("Spot sold with signature: {signature}");
    Ok(())
}
