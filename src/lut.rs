use std::collections::HashSet;

use log::info;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::address_lookup_table::instruction::{create_lookup_table, extend_lookup_table};
use solana_sdk::address_lookup_table::state::{AddressLookupTable, LOOKUP_TABLE_MAX_ADDRESSES};
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LutError {
    #[error(
        "extending table {table} would hold {requested} addresses, above the {max}-entry maximum"
    )]
    TableCapacityExceeded {
        table: Pubkey,
        requested: usize,
        max: usize,
    },
    #[error("RPC error: {0}")]
    ClientError(#[from] solana_rpc_client_api::client_error::Error),
    #[error("failed to deserialize lookup table {0}")]
    Deserialize(Pubkey),
}

/// Addresses in `wanted` that are not yet in `existing`, deduplicated,
/// first-seen order preserved.
fn missing_addresses(existing: &[Pubkey], wanted: &[Pubkey]) -> Vec<Pubkey> {
    let mut seen: HashSet<Pubkey> = existing.iter().copied().collect();
    wanted
        .iter()
        .copied()
        .filter(|address| seen.insert(*address))
        .collect()
}

/// The on-chain table holds at most `LOOKUP_TABLE_MAX_ADDRESSES` entries and
/// entries are never removed, so overflowing it is fatal for that table.
fn check_table_capacity(table: Pubkey, existing: usize, missing: usize) -> Result<(), LutError> {
    let requested = existing + missing;
    if requested > LOOKUP_TABLE_MAX_ADDRESSES {
        return Err(LutError::TableCapacityExceeded {
            table,
            requested,
            max: LOOKUP_TABLE_MAX_ADDRESSES,
        });
    }
    Ok(())
}

/// Ensure `addresses` are registered in the lookup table at `table`.
///
/// Appends a create instruction when the table account does not exist yet (the
/// created address is derived from the authority and a recent slot, and is
/// returned so the caller can record it), then one extend instruction covering
/// the addresses not already present. Entries are only ever added.
pub async fn ensure_lookup_table(
    rpc_client: &RpcClient,
    payer: &Pubkey,
    authority: &Pubkey,
    table: Pubkey,
    addresses: &[Pubkey],
    instructions: &mut Vec<Instruction>,
) -> Result<Pubkey, LutError> {
    let account = rpc_client
        .get_account_with_commitment(&table, rpc_client.commitment())
        .await?
        .value;

    let (table, existing) = match account {
        Some(account) => {
            let state = AddressLookupTable::deserialize(&account.data)
                .map_err(|_| LutError::Deserialize(table))?;
            (table, state.addresses.to_vec())
        }
        None => {
            let recent_slot = rpc_client.get_slot().await?;
            let (create_ix, derived) = create_lookup_table(*authority, *payer, recent_slot);
            info!("creating lookup table {} at slot {}", derived, recent_slot);
            instructions.push(create_ix);
            (derived, Vec::new())
        }
    };

    let missing = missing_addresses(&existing, addresses);
    check_table_capacity(table, existing.len(), missing.len())?;
    if !missing.is_empty() {
        info!("extending lookup table {} with {} addresses", table, missing.len());
        instructions.push(extend_lookup_table(
            table,
            *authority,
            Some(*payer),
            missing,
        ));
    }
    Ok(table)
}

/// Resolve table addresses into accounts usable for v0 message compilation.
/// Duplicate addresses are resolved once.
pub async fn get_lookup_table_accounts(
    rpc_client: &RpcClient,
    addresses: &[Pubkey],
) -> Result<Vec<AddressLookupTableAccount>, LutError> {
    let mut accounts = Vec::new();
    for address in missing_addresses(&[], addresses) {
        let account = rpc_client.get_account(&address).await?;
        let state = AddressLookupTable::deserialize(&account.data)
            .map_err(|_| LutError::Deserialize(address))?;
        accounts.push(AddressLookupTableAccount {
            key: address,
            addresses: state.addresses.to_vec(),
        });
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_addresses_dedups_in_first_seen_order() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();
        assert_eq!(missing_addresses(&[], &[a, b, a, c]), vec![a, b, c]);
    }

    #[test]
    fn missing_addresses_is_empty_when_table_covers_input() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert!(missing_addresses(&[a, b], &[b, a, b]).is_empty());
    }

    #[test]
    fn missing_addresses_skips_only_known_entries() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();
        assert_eq!(missing_addresses(&[b], &[a, b, c]), vec![a, c]);
    }

    #[test]
    fn extending_to_the_entry_maximum_is_allowed() {
        let table = Pubkey::new_unique();
        check_table_capacity(table, 200, LOOKUP_TABLE_MAX_ADDRESSES - 200).unwrap();
        check_table_capacity(table, LOOKUP_TABLE_MAX_ADDRESSES, 0).unwrap();
    }

    #[test]
    fn extending_past_the_entry_maximum_fails() {
        let table = Pubkey::new_unique();
        let err = check_table_capacity(table, LOOKUP_TABLE_MAX_ADDRESSES, 1).unwrap_err();
        match err {
            LutError::TableCapacityExceeded {
                table: reported,
                requested,
                max,
            } => {
                assert_eq!(reported, table);
                assert_eq!(requested, LOOKUP_TABLE_MAX_ADDRESSES + 1);
                assert_eq!(max, LOOKUP_TABLE_MAX_ADDRESSES);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
