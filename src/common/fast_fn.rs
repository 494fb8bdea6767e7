//! 关联代币账户（ATA）快速派生
//!
//! ATA derivation is a bump search; results are cached per
//! (wallet, mint, token program).

use dashmap::DashMap;
use once_cell::sync::Lazy;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};

const MAX_ATA_CACHE_SIZE: usize = 100_000;

static ATA_CACHE: Lazy<DashMap<(Pubkey, Pubkey, Pubkey), Pubkey>> =
    Lazy::new(|| DashMap::with_capacity(1_024));

pub fn get_associated_token_address_with_program_id_fast(
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Pubkey {
    let key = (*wallet, *mint, *token_program);
    if let Some(address) = ATA_CACHE.get(&key) {
        return *address;
    }
    let address = get_associated_token_address_with_program_id(wallet, mint, token_program);
    if ATA_CACHE.len() >= MAX_ATA_CACHE_SIZE {
        ATA_CACHE.clear();
    }
    ATA_CACHE.insert(key, address);
    address
}

/// Create `owner`'s ATA for `mint` unless it already exists.
pub fn create_associated_token_account_idempotent_fast(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, token_program)
}
