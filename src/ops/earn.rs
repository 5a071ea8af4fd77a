use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::system_program;
use spl_associated_token_account::get_associated_token_address_with_program_id;

use super::OpsContext;
use crate::config::EarnOpts;
use crate::lut::{ensure_lookup_table, get_lookup_table_accounts};
use crate::sender::{send_and_confirm_optimized, SendOptions};
use crate::token::setup_token_account;
use crate::vault::instructions::{
    deposit_strategy, initialize_strategy, withdraw_strategy, DEPOSIT_JUPITER_EARN,
    INITIALIZE_JUPITER_EARN, WITHDRAW_JUPITER_EARN,
};
use crate::vault::derive_vault_strategy_auth;

const LUT_UPDATE_COMPUTE_UNITS: u32 = 50_000;

/// PDA set of the lend protocol. The `lending` account doubles as the
/// strategy key for the vault.
struct EarnAddresses {
    f_token_mint: Pubkey,
    lending_admin: Pubkey,
    lending: Pubkey,
    supply_reserves: Pubkey,
    rate_model: Pubkey,
    user_claim: Pubkey,
    liquidity: Pubkey,
    rewards_rate_model: Pubkey,
    lending_supply_position: Pubkey,
    j_vault: Pubkey,
}

fn derive_earn_addresses(
    asset_mint: &Pubkey,
    asset_token_program: &Pubkey,
    earn: &EarnOpts,
) -> EarnAddresses {
    let (f_token_mint, _) = Pubkey::find_program_address(
        &[b"f_token_mint", asset_mint.as_ref()],
        &earn.lend_program_id,
    );
    let (lending_admin, _) =
        Pubkey::find_program_address(&[b"lending_admin"], &earn.lend_program_id);
    let (lending, _) = Pubkey::find_program_address(
        &[b"lending", asset_mint.as_ref(), f_token_mint.as_ref()],
        &earn.lend_program_id,
    );
    let (supply_reserves, _) = Pubkey::find_program_address(
        &[b"reserve", asset_mint.as_ref()],
        &earn.liquidity_program_id,
    );
    let (rate_model, _) = Pubkey::find_program_address(
        &[b"rate_model", asset_mint.as_ref()],
        &earn.liquidity_program_id,
    );
    let (user_claim, _) = Pubkey::find_program_address(
        &[b"user_claim", lending_admin.as_ref(), asset_mint.as_ref()],
        &earn.liquidity_program_id,
    );
    let (liquidity, _) =
        Pubkey::find_program_address(&[b"liquidity"], &earn.liquidity_program_id);
    let (rewards_rate_model, _) = Pubkey::find_program_address(
        &[b"lending_rewards_rate_model", asset_mint.as_ref()],
        &earn.rewards_rate_program_id,
    );
    let (lending_supply_position, _) = Pubkey::find_program_address(
        &[b"user_supply_position", asset_mint.as_ref(), lending.as_ref()],
        &earn.liquidity_program_id,
    );
    let j_vault =
        get_associated_token_address_with_program_id(&liquidity, asset_mint, asset_token_program);
    EarnAddresses {
        f_token_mint,
        lending_admin,
        lending,
        supply_reserves,
        rate_model,
        user_claim,
        liquidity,
        rewards_rate_model,
        lending_supply_position,
        j_vault,
    }
}

async fn setup_earn_token_accounts(
    ctx: &OpsContext,
    addresses: &EarnAddresses,
    instructions: &mut Vec<Instruction>,
) -> anyhow::Result<Pubkey> {
    let common = &ctx.common;
    let (vault_strategy_auth, _) = derive_vault_strategy_auth(
        &common.vault,
        &addresses.lending,
        &common.vault_program_id,
    );
    setup_token_account(
        &ctx.rpc_client,
        &ctx.manager.pubkey(),
        &common.asset_mint,
        &vault_strategy_auth,
        &common.asset_token_program,
        instructions,
    )
    .await?;
    setup_token_account(
        &ctx.rpc_client,
        &ctx.manager.pubkey(),
        &addresses.f_token_mint,
        &vault_strategy_auth,
        &spl_token::ID,
        instructions,
    )
    .await?;
    Ok(vault_strategy_auth)
}

pub async fn initialize_earn(ctx: &OpsContext, earn: &EarnOpts) -> anyhow::Result<()> {
    let common = &ctx.common;
    let addresses =
        derive_earn_addresses(&common.asset_mint, &common.asset_token_program, earn);

    let mut instructions = Vec::new();
    setup_earn_token_accounts(ctx, &addresses, &mut instructions).await?;
    instructions.push(initialize_strategy(
        &common.vault_program_id,
        &ctx.manager.pubkey(),
        &ctx.manager.pubkey(),
        &common.vault,
        &addresses.lending,
        &common.adaptor_program_id,
        INITIALIZE_JUPITER_EARN,
        vec![],
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
    println!("Jupiter earn initialized with signature: {signature}");

    // Register the full PDA set so later deposits and withdrawals fit in one
    // packet even with an aggregator route appended.
    if let Some(table) = common.lookup_table_address {
        let mut addresses_for_table: Vec<Pubkey> = instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter().map(|meta| meta.pubkey))
            .collect();
        addresses_for_table.extend([
            addresses.f_token_mint,
            addresses.lending_admin,
            addresses.supply_reserves,
            addresses.rate_model,
            addresses.user_claim,
            addresses.liquidity,
            addresses.rewards_rate_model,
            addresses.lending_supply_position,
            addresses.j_vault,
        ]);
        update_lookup_table(ctx, table, &addresses_for_table).await?;
    }
    Ok(())
}

async fn update_lookup_table(
    ctx: &OpsContext,
    table: Pubkey,
    addresses: &[Pubkey],
) -> anyhow::Result<()> {
    let authority: &Keypair = ctx.admin.as_ref().unwrap_or(&ctx.manager);
    let mut instructions = Vec::new();
    let table = ensure_lookup_table(
        &ctx.rpc_client,
        &ctx.manager.pubkey(),
        &authority.pubkey(),
        table,
        addresses,
        &mut instructions,
    )
    .await?;
    if instructions.is_empty() {
        return Ok(());
    }
    let additional_signers: Vec<&Keypair> = if authority.pubkey() != ctx.manager.pubkey() {
        vec![authority]
    } else {
        vec![]
    };
    let signature = send_and_confirm_optimized(
        &ctx.rpc_client,
        &instructions,
        &ctx.manager,
        &additional_signers,
        &[],
        &SendOptions {
            compute_unit_limit: Some(LUT_UPDATE_COMPUTE_UNITS),
            ..ctx.send_options()
        },
    )
    .await?;
    println!("LUT {table} updated with signature: {signature}");
    Ok(())
}

/// Trailing accounts of the lend adaptor's deposit and withdraw handlers,
/// decoded by position on-chain.
fn earn_movement_accounts(
    earn: &EarnOpts,
    addresses: &EarnAddresses,
    f_token_ata: Pubkey,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(f_token_ata, false),
        AccountMeta::new_readonly(addresses.lending_admin, false),
        AccountMeta::new(addresses.f_token_mint, false),
        AccountMeta::new(addresses.supply_reserves, false),
        AccountMeta::new(addresses.lending_supply_position, false),
        AccountMeta::new_readonly(addresses.rate_model, false),
        AccountMeta::new(addresses.j_vault, false),
        AccountMeta::new(addresses.user_claim, false),
        AccountMeta::new(addresses.liquidity, false),
        AccountMeta::new(earn.liquidity_program_id, false),
        AccountMeta::new_readonly(addresses.rewards_rate_model, false),
        AccountMeta::new_readonly(spl_associated_token_account::ID, false),
        AccountMeta::new(system_program::ID, false),
        AccountMeta::new(earn.lend_program_id, false),
    ]
}

pub async fn deposit_earn(ctx: &OpsContext, earn: &EarnOpts, amount: u64) -> anyhow::Result<()> {
    let common = &ctx.common;
    let addresses =
        derive_earn_addresses(&common.asset_mint, &common.asset_token_program, earn);

    let mut instructions = Vec::new();
    let vault_strategy_auth =
        setup_earn_token_accounts(ctx, &addresses, &mut instructions).await?;
    let f_token_ata = get_associated_token_address_with_program_id(
        &vault_strategy_auth,
        &addresses.f_token_mint,
        &spl_token::ID,
    );

    instructions.push(deposit_strategy(
        &common.vault_program_id,
        &ctx.manager.pubkey(),
        &common.vault,
        &addresses.lending,
        &common.adaptor_program_id,
        &common.asset_mint,
        &common.asset_token_program,
        amount,
        DEPOSIT_JUPITER_EARN,
        None,
        earn_movement_accounts(earn, &addresses, f_token_ata),
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
    println!("Jupiter earn deposited with signature: {signature}");
    Ok(())
}

pub async fn withdraw_earn(ctx: &OpsContext, earn: &EarnOpts, amount: u64) -> anyhow::Result<()> {
    let common = &ctx.common;
    let addresses =
        derive_earn_addresses(&common.asset_mint, &common.asset_token_program, earn);

    let mut instructions = Vec::new();
    let vault_strategy_auth =
        setup_earn_token_accounts(ctx, &addresses, &mut instructions).await?;
    let f_token_ata = get_associated_token_address_with_program_id(
        &vault_strategy_auth,
        &addresses.f_token_mint,
        &spl_token::ID,
    );

    instructions.push(withdraw_strategy(
        &common.vault_program_id,
        &ctx.manager.pubkey(),
        &common.vault,
        &addresses.lending,
        &common.adaptor_program_id,
        &common.asset_mint,
        &common.asset_token_program,
        amount,
        WITHDRAW_JUPITER_EARN,
        None,
        earn_movement_accounts(earn, &addresses, f_token_ata),
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
    println!("Jupiter earn withdrawn with signature: {signature}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_opts() -> EarnOpts {
        EarnOpts {
            lend_program_id: Pubkey::new_unique(),
            liquidity_program_id: Pubkey::new_unique(),
            rewards_rate_program_id: Pubkey::new_unique(),
        }
    }

    #[test]
    fn lending_pda_depends_on_f_token_mint() {
        let opts = sample_opts();
        let mint = Pubkey::new_unique();
        let addresses = derive_earn_addresses(&mint, &spl_token::ID, &opts);
        let (expected_lending, _) = Pubkey::find_program_address(
            &[
                b"lending",
                mint.as_ref(),
                addresses.f_token_mint.as_ref(),
            ],
            &opts.lend_program_id,
        );
        assert_eq!(addresses.lending, expected_lending);
        assert_eq!(
            addresses.j_vault,
            get_associated_token_address_with_program_id(
                &addresses.liquidity,
                &mint,
                &spl_token::ID
            )
        );
    }

    #[test]
    fn movement_accounts_keep_handler_order() {
        let opts = sample_opts();
        let mint = Pubkey::new_unique();
        let addresses = derive_earn_addresses(&mint, &spl_token::ID, &opts);
        let f_token_ata = Pubkey::new_unique();
        let accounts = earn_movement_accounts(&opts, &addresses, f_token_ata);

        assert_eq!(accounts.len(), 14);
        assert_eq!(accounts[0].pubkey, f_token_ata);
        assert!(accounts[0].is_writable);
        assert_eq!(accounts[1].pubkey, addresses.lending_admin);
        assert!(!accounts[1].is_writable);
        assert_eq!(accounts[11].pubkey, spl_associated_token_account::ID);
        assert_eq!(accounts[13].pubkey, opts.lend_program_id);
        assert!(accounts.iter().all(|meta| !meta.is_signer));
    }
}
