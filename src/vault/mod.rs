pub mod instructions;

use solana_sdk::pubkey::Pubkey;

pub const VAULT_STRATEGY_SEED: &str = "vault_strategy";
pub const STRATEGY_INIT_RECEIPT_SEED: &str = "strategy_init_receipt";
pub const DIRECT_WITHDRAW_INIT_RECEIPT_SEED: &str = "direct_withdraw_init_receipt";
pub const ORACLE_INIT_RECEIPT_SEED: &str = "oracle_init_receipt";

/// Per-(vault, strategy) authority that owns the strategy's token accounts.
pub fn derive_vault_strategy_auth(
    vault: &Pubkey,
    strategy: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            VAULT_STRATEGY_SEED.as_bytes(),
            vault.as_ref(),
            strategy.as_ref(),
        ],
        program_id,
    )
}

pub fn derive_strategy_init_receipt(
    vault: &Pubkey,
    strategy: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            STRATEGY_INIT_RECEIPT_SEED.as_bytes(),
            vault.as_ref(),
            strategy.as_ref(),
        ],
        program_id,
    )
}

pub fn derive_direct_withdraw_init_receipt(
    vault: &Pubkey,
    strategy: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            DIRECT_WITHDRAW_INIT_RECEIPT_SEED.as_bytes(),
            vault.as_ref(),
            strategy.as_ref(),
        ],
        program_id,
    )
}

/// Oracle registration receipt, keyed by the strategy authority and the mint
/// the oracle prices, owned by the adaptor program.
pub fn derive_oracle_init_receipt(
    strategy_auth: &Pubkey,
    mint: &Pubkey,
    adaptor_program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            ORACLE_INIT_RECEIPT_SEED.as_bytes(),
            strategy_auth.as_ref(),
            mint.as_ref(),
        ],
        adaptor_program_id,
    )
}

pub struct VaultSlice {
    pub asset_mint: Pubkey,
    pub asset_total_value: u64,
}

impl VaultSlice {
    pub const OFFSET: usize = 40;
    pub const LENGTH: usize = 40;

    pub fn decode(data: &[u8], offset: Option<usize>) -> Option<VaultSlice> {
        let offset = offset.unwrap_or(Self::OFFSET);
        if data.len() < Self::LENGTH + offset {
            return None;
        }

        Some(VaultSlice {
            asset_mint: Pubkey::new_from_array(data[offset..offset + 32].try_into().ok()?),
            asset_total_value: u64::from_le_bytes(
                data[offset + 32..offset + 40].try_into().ok()?,
            ),
        })
    }
}

pub struct StrategyInitReceiptSlice {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub position_value: u64,
}

impl StrategyInitReceiptSlice {
    pub const DISCRIMINATOR: [u8; 8] = [51, 8, 192, 253, 115, 78, 112, 214];
    pub const LENGTH: usize = 80;

    pub fn decode(data: &[u8]) -> Option<StrategyInitReceiptSlice> {
        if data.len() < Self::LENGTH || data[..8] != Self::DISCRIMINATOR {
            return None;
        }

        Some(StrategyInitReceiptSlice {
            vault: Pubkey::new_from_array(data[8..40].try_into().ok()?),
            strategy: Pubkey::new_from_array(data[40..72].try_into().ok()?),
            position_value: u64::from_le_bytes(data[72..80].try_into().ok()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_slice_decodes_mint_and_value() {
        let mint = Pubkey::new_unique();
        let mut data = vec![0u8; VaultSlice::OFFSET];
        data.extend_from_slice(mint.as_ref());
        data.extend_from_slice(&42_000u64.to_le_bytes());

        let slice = VaultSlice::decode(&data, None).unwrap();
        assert_eq!(slice.asset_mint, mint);
        assert_eq!(slice.asset_total_value, 42_000);

        assert!(VaultSlice::decode(&data[..data.len() - 1], None).is_none());
    }

    #[test]
    fn receipt_slice_rejects_foreign_discriminator() {
        let vault = Pubkey::new_unique();
        let strategy = Pubkey::new_unique();
        let mut data = StrategyInitReceiptSlice::DISCRIMINATOR.to_vec();
        data.extend_from_slice(vault.as_ref());
        data.extend_from_slice(strategy.as_ref());
        data.extend_from_slice(&7u64.to_le_bytes());

        let slice = StrategyInitReceiptSlice::decode(&data).unwrap();
        assert_eq!(slice.vault, vault);
        assert_eq!(slice.strategy, strategy);
        assert_eq!(slice.position_value, 7);

        data[0] ^= 0xff;
        assert!(StrategyInitReceiptSlice::decode(&data).is_none());
    }
}
