use log::debug;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

/// Resolve the ATA for `owner`/`mint` and append an idempotent create
/// instruction when the account does not exist yet. Returns the ATA address
/// either way.
pub async fn setup_token_account(
    rpc_client: &RpcClient,
    payer: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
    token_program: &Pubkey,
    instructions: &mut Vec<Instruction>,
) -> Result<Pubkey, solana_rpc_client_api::client_error::Error> {
    let ata = get_associated_token_address_with_program_id(owner, mint, token_program);
    let account = rpc_client
        .get_account_with_commitment(&ata, rpc_client.commitment())
        .await?
        .value;
    if account.is_none() {
        debug!("token account {} missing, scheduling creation", ata);
        instructions.push(create_associated_token_account_idempotent(
            payer,
            owner,
            mint,
            token_program,
        ));
    }
    Ok(ata)
}
