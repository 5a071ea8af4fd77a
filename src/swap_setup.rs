use log::{debug, info};
use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::jupiter::types::{QuoteParams, SwapInstructionsPayload};
use crate::jupiter::{JupiterApiClient, JupiterApiError};

#[derive(Debug, Error)]
pub enum SwapSetupError {
    #[error("quote worst-case output {offered} is below the required floor {required}")]
    SlippageExceeded { offered: u64, required: u64 },
    #[error(transparent)]
    ExternalService(#[from] JupiterApiError),
}

#[derive(Debug, Clone, Copy)]
pub struct SwapSetupRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    /// Exact input amount in base units. Zero makes the whole setup a no-op.
    pub amount_in: u64,
    /// Floor on the quote's worst-case output. Zero means no floor.
    pub minimum_threshold_amount_out: u64,
    pub slippage_bps: u16,
    pub max_accounts: usize,
}

/// Accumulator for one transaction-construction pass. Owned by a single
/// handler; token-account setup and swap setup append to it, the final
/// strategy instruction consumes it. Accounts and bytes are only ever
/// appended, preserving the trailing-account order the adaptor program
/// decodes by position.
#[derive(Debug, Clone, Default)]
pub struct InstructionBuildContext {
    pub remaining_accounts: Vec<AccountMeta>,
    pub additional_args: Vec<u8>,
    pub lookup_table_addresses: Vec<Pubkey>,
}

impl InstructionBuildContext {
    pub fn new(remaining_accounts: Vec<AccountMeta>, lookup_table: Option<Pubkey>) -> Self {
        InstructionBuildContext {
            remaining_accounts,
            additional_args: Vec::new(),
            lookup_table_addresses: lookup_table.into_iter().collect(),
        }
    }

    /// The adaptor expects `None` rather than an empty blob when no swap
    /// arguments were accumulated.
    pub fn additional_args(&self) -> Option<&[u8]> {
        if self.additional_args.is_empty() {
            None
        } else {
            Some(&self.additional_args)
        }
    }

    /// Commit a validated swap payload: the swap program id, then its
    /// accounts in service order (service writable flags, never signers),
    /// then the lookup tables (duplicates kept; resolution dedups), then the
    /// instruction data bytes appended after whatever is already buffered.
    fn apply_swap(&mut self, payload: &SwapInstructionsPayload) {
        let ix = &payload.swap_instruction;
        self.remaining_accounts
            .push(AccountMeta::new_readonly(ix.program_id, false));
        for account in &ix.accounts {
            self.remaining_accounts.push(AccountMeta {
                pubkey: account.pubkey,
                is_signer: false,
                is_writable: account.is_writable,
            });
        }
        self.lookup_table_addresses
            .extend(payload.address_lookup_table_addresses.iter().copied());
        self.additional_args.extend_from_slice(&ix.data);
    }
}

/// A quote whose worst-case output sits strictly below the caller's floor is
/// rejected before the swap-instructions request is made.
fn check_slippage_floor(offered: u64, required: u64) -> Result<(), SwapSetupError> {
    if offered < required {
        return Err(SwapSetupError::SlippageExceeded { offered, required });
    }
    Ok(())
}

/// Fetch a swap route for `request` and fold it into `context`.
///
/// Everything is staged and validated before the first append: a slippage or
/// service failure returns with the context exactly as it was passed in.
pub async fn assemble_swap(
    client: &JupiterApiClient,
    request: &SwapSetupRequest,
    authority: &Pubkey,
    context: &mut InstructionBuildContext,
) -> Result<(), SwapSetupError> {
    if request.amount_in == 0 {
        debug!("swap amount is zero, skipping route setup");
        return Ok(());
    }

    let quote = client
        .quote(&QuoteParams {
            input_mint: request.input_mint,
            output_mint: request.output_mint,
            amount: request.amount_in,
            slippage_bps: request.slippage_bps,
            max_accounts: request.max_accounts,
        })
        .await?;

    check_slippage_floor(
        quote.other_amount_threshold,
        request.minimum_threshold_amount_out,
    )?;

    let payload = client.swap_instructions(&quote, authority).await?;
    info!(
        "swap route: {} -> {} for {} base units, {} accounts, {} lookup tables",
        request.input_mint,
        request.output_mint,
        request.amount_in,
        payload.swap_instruction.accounts.len(),
        payload.address_lookup_table_addresses.len(),
    );
    context.apply_swap(&payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jupiter::types::{SwapAccountMeta, SwapInstruction};

    fn seeded_context() -> InstructionBuildContext {
        let mut context = InstructionBuildContext::new(
            vec![
                AccountMeta::new_readonly(Pubkey::new_unique(), false),
                AccountMeta::new(Pubkey::new_unique(), false),
            ],
            Some(Pubkey::new_unique()),
        );
        context.additional_args = vec![0xde, 0xad, 0xbe, 0xef];
        context
    }

    fn sample_payload() -> SwapInstructionsPayload {
        SwapInstructionsPayload {
            swap_instruction: SwapInstruction {
                program_id: Pubkey::new_unique(),
                accounts: vec![
                    SwapAccountMeta {
                        pubkey: Pubkey::new_unique(),
                        is_writable: true,
                    },
                    SwapAccountMeta {
                        pubkey: Pubkey::new_unique(),
                        is_writable: false,
                    },
                ],
                data: vec![9, 8, 7],
            },
            address_lookup_table_addresses: vec![Pubkey::new_unique(), Pubkey::new_unique()],
        }
    }

    #[tokio::test]
    async fn zero_amount_is_a_no_op() {
        let client = JupiterApiClient::new("http://127.0.0.1:0".to_string());
        let mut context = seeded_context();
        let before = context.clone();
        let request = SwapSetupRequest {
            input_mint: Pubkey::new_unique(),
            output_mint: Pubkey::new_unique(),
            amount_in: 0,
            minimum_threshold_amount_out: 1_000_000,
            slippage_bps: 50,
            max_accounts: 16,
        };
        assemble_swap(&client, &request, &Pubkey::new_unique(), &mut context)
            .await
            .unwrap();
        assert_eq!(context.remaining_accounts, before.remaining_accounts);
        assert_eq!(context.additional_args, before.additional_args);
        assert_eq!(context.lookup_table_addresses, before.lookup_table_addresses);
    }

    #[test]
    fn apply_swap_is_a_pure_append() {
        let mut context = seeded_context();
        let before = context.clone();
        let payload = sample_payload();
        context.apply_swap(&payload);

        // Existing bytes are a prefix of the result, new data follows.
        assert_eq!(
            context.additional_args.len(),
            before.additional_args.len() + payload.swap_instruction.data.len()
        );
        assert_eq!(
            &context.additional_args[..before.additional_args.len()],
            &before.additional_args[..]
        );
        assert_eq!(
            &context.additional_args[before.additional_args.len()..],
            &payload.swap_instruction.data[..]
        );

        // Program id plus each swap account, appended in service order.
        assert_eq!(
            context.remaining_accounts.len(),
            before.remaining_accounts.len() + 1 + payload.swap_instruction.accounts.len()
        );
        assert_eq!(
            &context.remaining_accounts[..before.remaining_accounts.len()],
            &before.remaining_accounts[..]
        );
        let appended = &context.remaining_accounts[before.remaining_accounts.len()..];
        assert_eq!(appended[0].pubkey, payload.swap_instruction.program_id);
        assert!(!appended[0].is_writable);
        for (meta, account) in appended[1..].iter().zip(&payload.swap_instruction.accounts) {
            assert_eq!(meta.pubkey, account.pubkey);
            assert_eq!(meta.is_writable, account.is_writable);
            assert!(!meta.is_signer);
        }

        // Lookup tables are appended in service order, existing entries first.
        assert_eq!(
            context.lookup_table_addresses[..before.lookup_table_addresses.len()],
            before.lookup_table_addresses[..]
        );
        assert_eq!(
            context.lookup_table_addresses[before.lookup_table_addresses.len()..],
            payload.address_lookup_table_addresses[..]
        );
    }

    #[test]
    fn quote_below_floor_fails_without_touching_the_context() {
        let context = seeded_context();
        let before = context.clone();

        // 1,000,000 in at 50 bps quotes a 990,000 worst case; a floor of
        // 1,000,000 must reject it, a floor of zero must accept it.
        let err = check_slippage_floor(990_000, 1_000_000).unwrap_err();
        match err {
            SwapSetupError::SlippageExceeded { offered, required } => {
                assert_eq!(offered, 990_000);
                assert_eq!(required, 1_000_000);
            }
            other => panic!("unexpected error: {other}"),
        }
        check_slippage_floor(990_000, 0).unwrap();
        check_slippage_floor(990_000, 990_000).unwrap();

        // Validation happens before the commit, so a rejected quote leaves
        // the accumulator exactly as it was.
        assert_eq!(context.remaining_accounts, before.remaining_accounts);
        assert_eq!(context.additional_args, before.additional_args);
        assert_eq!(context.lookup_table_addresses, before.lookup_table_addresses);
    }

    #[test]
    fn additional_args_accessor_maps_empty_to_none() {
        let context = InstructionBuildContext::default();
        assert!(context.additional_args().is_none());
        let mut context = InstructionBuildContext::default();
        context.additional_args.push(1);
        assert_eq!(context.additional_args(), Some(&[1u8][..]));
    }
}
