use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use spl_associated_token_account::get_associated_token_address_with_program_id;

use super::{
    derive_direct_withdraw_init_receipt, derive_strategy_init_receipt, derive_vault_strategy_auth,
};

// Vault program instructions.
pub const INITIALIZE_STRATEGY: [u8; 8] = [208, 119, 144, 145, 178, 57, 105, 252];
pub const DEPOSIT_STRATEGY: [u8; 8] = [246, 82, 57, 226, 131, 222, 253, 249];
pub const WITHDRAW_STRATEGY: [u8; 8] = [31, 45, 162, 5, 193, 217, 134, 188];
pub const INITIALIZE_DIRECT_WITHDRAW: [u8; 8] = [248, 207, 228, 15, 13, 191, 43, 58];

// Adaptor instructions, forwarded by the vault program via CPI. The vault
// only sees them as opaque discriminator bytes inside the args.
pub const INITIALIZE_SPOT: [u8; 8] = [206, 194, 174, 21, 64, 192, 115, 9];
pub const SWAP_SPOT: [u8; 8] = [198, 133, 229, 32, 233, 2, 193, 212];
pub const INITIALIZE_JUPITER_EARN: [u8; 8] = [96, 41, 228, 66, 7, 63, 88, 208];
pub const DEPOSIT_JUPITER_EARN: [u8; 8] = [56, 2, 200, 235, 238, 139, 231, 190];
pub const WITHDRAW_JUPITER_EARN: [u8; 8] = [232, 204, 244, 40, 201, 192, 7, 194];
pub const DIRECT_WITHDRAW_JUPITER_EARN: [u8; 8] = [207, 102, 176, 129, 66, 18, 173, 40];

#[derive(BorshSerialize, BorshDeserialize)]
struct InitializeStrategyArgs {
    instruction_discriminator: Vec<u8>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct DepositStrategyArgs {
    deposit_amount: u64,
    instruction_discriminator: Vec<u8>,
    additional_args: Option<Vec<u8>>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct WithdrawStrategyArgs {
    withdraw_amount: u64,
    instruction_discriminator: Vec<u8>,
    additional_args: Option<Vec<u8>>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct InitializeDirectWithdrawArgs {
    instruction_discriminator: Vec<u8>,
    additional_args: Option<Vec<u8>>,
    allow_user_args: bool,
}

fn instruction_data(discriminator: &[u8; 8], args: &impl BorshSerialize) -> Vec<u8> {
    let mut data = discriminator.to_vec();
    data.extend(borsh::to_vec(args).expect("serializing fixed-layout args"));
    data
}

/// Register a strategy with the vault and create its init receipt.
/// `remaining_accounts` carries whatever the adaptor's initialize handler
/// decodes by position.
#[allow(clippy::too_many_arguments)]
pub fn initialize_strategy(
    program_id: &Pubkey,
    payer: &Pubkey,
    manager: &Pubkey,
    vault: &Pubkey,
    strategy: &Pubkey,
    adaptor_program: &Pubkey,
    adaptor_discriminator: [u8; 8],
    remaining_accounts: Vec<AccountMeta>,
) -> Instruction {
    let (strategy_init_receipt, _) = derive_strategy_init_receipt(vault, strategy, program_id);
    let mut accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(*manager, true),
        AccountMeta::new(*vault, false),
        AccountMeta::new_readonly(*strategy, false),
        AccountMeta::new(strategy_init_receipt, false),
        AccountMeta::new_readonly(*adaptor_program, false),
        AccountMeta::new_readonly(system_program::ID, false),
    ];
    accounts.extend(remaining_accounts);
    Instruction {
        program_id: *program_id,
        accounts,
        data: instruction_data(
            &INITIALIZE_STRATEGY,
            &InitializeStrategyArgs {
                instruction_discriminator: adaptor_discriminator.to_vec(),
            },
        ),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn deposit_strategy(
    program_id: &Pubkey,
    manager: &Pubkey,
    vault: &Pubkey,
    strategy: &Pubkey,
    adaptor_program: &Pubkey,
    vault_asset_mint: &Pubkey,
    asset_token_program: &Pubkey,
    deposit_amount: u64,
    adaptor_discriminator: [u8; 8],
    additional_args: Option<Vec<u8>>,
    remaining_accounts: Vec<AccountMeta>,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: strategy_movement_accounts(
            program_id,
            manager,
            vault,
            strategy,
            adaptor_program,
            vault_asset_mint,
            asset_token_program,
            remaining_accounts,
        ),
        data: instruction_data(
            &DEPOSIT_STRATEGY,
            &DepositStrategyArgs {
                deposit_amount,
                instruction_discriminator: adaptor_discriminator.to_vec(),
                additional_args,
            },
        ),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn withdraw_strategy(
    program_id: &Pubkey,
    manager: &Pubkey,
    vault: &Pubkey,
    strategy: &Pubkey,
    adaptor_program: &Pubkey,
    vault_asset_mint: &Pubkey,
    asset_token_program: &Pubkey,
    withdraw_amount: u64,
    adaptor_discriminator: [u8; 8],
    additional_args: Option<Vec<u8>>,
    remaining_accounts: Vec<AccountMeta>,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: strategy_movement_accounts(
            program_id,
            manager,
            vault,
            strategy,
            adaptor_program,
            vault_asset_mint,
            asset_token_program,
            remaining_accounts,
        ),
        data: instruction_data(
            &WITHDRAW_STRATEGY,
            &WithdrawStrategyArgs {
                withdraw_amount,
                instruction_discriminator: adaptor_discriminator.to_vec(),
                additional_args,
            },
        ),
    }
}

/// Record the adaptor call users are allowed to make directly against a
/// strategy, bypassing the manager.
pub fn initialize_direct_withdraw(
    program_id: &Pubkey,
    payer: &Pubkey,
    admin: &Pubkey,
    vault: &Pubkey,
    strategy: &Pubkey,
    adaptor_program: &Pubkey,
    adaptor_discriminator: [u8; 8],
    allow_user_args: bool,
) -> Instruction {
    let (direct_withdraw_init_receipt, _) =
        derive_direct_withdraw_init_receipt(vault, strategy, program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new_readonly(*vault, false),
            AccountMeta::new_readonly(*strategy, false),
            AccountMeta::new(direct_withdraw_init_receipt, false),
            AccountMeta::new_readonly(*adaptor_program, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data(
            &INITIALIZE_DIRECT_WITHDRAW,
            &InitializeDirectWithdrawArgs {
                instruction_discriminator: adaptor_discriminator.to_vec(),
                additional_args: None,
                allow_user_args,
            },
        ),
    }
}

// Deposit and withdraw share the same account head, the handlers differ only
// in args and trailing accounts.
#[allow(clippy::too_many_arguments)]
fn strategy_movement_accounts(
    program_id: &Pubkey,
    manager: &Pubkey,
    vault: &Pubkey,
    strategy: &Pubkey,
    adaptor_program: &Pubkey,
    vault_asset_mint: &Pubkey,
    asset_token_program: &Pubkey,
    remaining_accounts: Vec<AccountMeta>,
) -> Vec<AccountMeta> {
    let (vault_strategy_auth, _) = derive_vault_strategy_auth(vault, strategy, program_id);
    let (strategy_init_receipt, _) = derive_strategy_init_receipt(vault, strategy, program_id);
    let vault_strategy_asset_ata = get_associated_token_address_with_program_id(
        &vault_strategy_auth,
        vault_asset_mint,
        asset_token_program,
    );
    let mut accounts = vec![
        AccountMeta::new_readonly(*manager, true),
        AccountMeta::new(*vault, false),
        AccountMeta::new(vault_strategy_auth, false),
        AccountMeta::new_readonly(*strategy, false),
        AccountMeta::new(strategy_init_receipt, false),
        AccountMeta::new_readonly(*vault_asset_mint, false),
        AccountMeta::new(vault_strategy_asset_ata, false),
        AccountMeta::new_readonly(*asset_token_program, false),
        AccountMeta::new_readonly(*adaptor_program, false),
    ];
    accounts.extend(remaining_accounts);
    accounts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_args_encode_borsh_layout() {
        let ix = deposit_strategy(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &spl_token::ID,
            1_000_000,
            SWAP_SPOT,
            Some(vec![7, 7, 7]),
            vec![],
        );
        assert_eq!(&ix.data[..8], &DEPOSIT_STRATEGY);
        let args = DepositStrategyArgs::try_from_slice(&ix.data[8..]).unwrap();
        assert_eq!(args.deposit_amount, 1_000_000);
        assert_eq!(args.instruction_discriminator, SWAP_SPOT.to_vec());
        assert_eq!(args.additional_args, Some(vec![7, 7, 7]));
    }

    #[test]
    fn withdraw_none_args_encode_as_option_tag() {
        let ix = withdraw_strategy(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &spl_token::ID,
            5,
            WITHDRAW_JUPITER_EARN,
            None,
            vec![],
        );
        assert_eq!(&ix.data[..8], &WITHDRAW_STRATEGY);
        // u64 amount, 4-byte vec length + 8 discriminator bytes, None tag.
        assert_eq!(ix.data.len(), 8 + 8 + 4 + 8 + 1);
        assert_eq!(*ix.data.last().unwrap(), 0);
    }

    #[test]
    fn movement_head_is_in_handler_order() {
        let program_id = Pubkey::new_unique();
        let manager = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let strategy = Pubkey::new_unique();
        let adaptor = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let trailing = AccountMeta::new_readonly(Pubkey::new_unique(), false);

        let ix = deposit_strategy(
            &program_id,
            &manager,
            &vault,
            &strategy,
            &adaptor,
            &mint,
            &spl_token::ID,
            1,
            DEPOSIT_JUPITER_EARN,
            None,
            vec![trailing.clone()],
        );

        let (auth, _) = derive_vault_strategy_auth(&vault, &strategy, &program_id);
        let (receipt, _) = derive_strategy_init_receipt(&vault, &strategy, &program_id);
        let ata = get_associated_token_address_with_program_id(&auth, &mint, &spl_token::ID);

        let keys: Vec<Pubkey> = ix.accounts.iter().map(|meta| meta.pubkey).collect();
        assert_eq!(
            keys,
            vec![
                manager,
                vault,
                auth,
                strategy,
                receipt,
                mint,
                ata,
                spl_token::ID,
                adaptor,
                trailing.pubkey,
            ]
        );
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[1].is_writable);
        assert!(ix.accounts[6].is_writable);
    }

    #[test]
    fn initialize_direct_withdraw_flags_user_args() {
        let program_id = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let strategy = Pubkey::new_unique();
        let ix = initialize_direct_withdraw(
            &program_id,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &vault,
            &strategy,
            &Pubkey::new_unique(),
            DIRECT_WITHDRAW_JUPITER_EARN,
            true,
        );
        assert_eq!(&ix.data[..8], &INITIALIZE_DIRECT_WITHDRAW);
        let args = InitializeDirectWithdrawArgs::try_from_slice(&ix.data[8..]).unwrap();
        assert!(args.allow_user_args);
        assert_eq!(args.additional_args, None);
        let (receipt, _) = derive_direct_withdraw_init_receipt(&vault, &strategy, &program_id);
        assert_eq!(ix.accounts[4].pubkey, receipt);
        assert!(ix.accounts[4].is_writable);
    }
}
