use anyhow::bail;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;

use super::OpsContext;
use crate::config::EarnOpts;
use crate::lut::ensure_lookup_table;
use crate::sender::{send_and_confirm_optimized, SendOptions};
use crate::vault::instructions::initialize_direct_withdraw;

const LUT_UPDATE_COMPUTE_UNITS: u32 = 50_000;

/// Register the adaptor instruction users may invoke directly to exit the
/// lend strategy without the manager. Admin-gated on-chain.
pub async fn init_direct_withdraw(
    ctx: &OpsContext,
    earn: &EarnOpts,
    discriminator: &[u8],
    allow_user_args: bool,
) -> anyhow::Result<()> {
    let Ok(discriminator) = <[u8; 8]>::try_from(discriminator) else {
        bail!(
            "instruction discriminator must be 8 bytes, got {}",
            discriminator.len()
        );
    };
    let common = &ctx.common;
    let admin = ctx.admin()?;

    let (f_token_mint, _) = Pubkey::find_program_address(
        &[b"f_token_mint", common.asset_mint.as_ref()],
        &earn.lend_program_id,
    );
    let (lending, _) = Pubkey::find_program_address(
        &[b"lending", common.asset_mint.as_ref(), f_token_mint.as_ref()],
        &earn.lend_program_id,
    );

    let instructions = vec![initialize_direct_withdraw(
        &common.vault_program_id,
        &admin.pubkey(),
        &admin.pubkey(),
        &common.vault,
        &lending,
        &common.adaptor_program_id,
        discriminator,
        allow_user_args,
    )];
    let signature = send_and_confirm_optimized(
        &ctx.rpc_client,
        &instructions,
        admin,
        &[],
        &[],
        &ctx.send_options(),
    )
    .await?;
    println!("Direct withdraw strategy initialized with signature: {signature}");

    if let Some(table) = common.lookup_table_address {
        let touched: Vec<Pubkey> = instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter().map(|meta| meta.pubkey))
            .collect();
        let mut lut_instructions = Vec::new();
        let table = ensure_lookup_table(
            &ctx.rpc_client,
            &admin.pubkey(),
            &admin.pubkey(),
            table,
            &touched,
            &mut lut_instructions,
        )
        .await?;
        if !lut_instructions.is_empty() {
            let signature = send_and_confirm_optimized(
                &ctx.rpc_client,
                &lut_instructions,
                admin,
                &[],
                &[],
                &SendOptions {
                    compute_unit_limit: Some(LUT_UPDATE_COMPUTE_UNITS),
                    ..ctx.send_options()
                },
            )
            .await?;
            println!("LUT {table} updated with signature: {signature}");
        }
    }
    Ok(())
}
