use solana_sdk::pubkey::Pubkey;

use crate::common::types::{MarketMeta, MarketState, VenueAccounts};
use crate::parser::types::{DexProtocol, FeeRate, PoolState};

pub(crate) fn mint() -> Pubkey {
    Pubkey::new_unique()
}

/// Constant-product market with a 0.3% trade fee.
pub(crate) fn market(base: Pubkey, quote: Pubkey, reserve_base: u64, reserve_quote: u64) -> MarketState {
    MarketMeta {
        address: Pubkey::new_unique(),
        protocol: DexProtocol::RaydiumAmmV4,
        base_mint: base,
        quote_mint: quote,
        base_vault: Pubkey::new_unique(),
        quote_vault: Pubkey::new_unique(),
        venue: VenueAccounts::None,
    }
    .with_pool_state(PoolState {
        reserve_base,
        reserve_quote,
        last_update_timestamp: 0,
        trade_fee: FeeRate { numerator: 30, denominator: 10_000 },
        owner_fee: FeeRate::ZERO,
    })
}

/// Initialized SPL token account bytes.
pub(crate) fn token_account(mint: Pubkey, amount: u64) -> Vec<u8> {
    use spl_token::solana_program::program_pack::Pack;
    use spl_token::state::{Account, AccountState};

    let account = Account {
        mint,
        owner: Pubkey::new_unique(),
        amount,
        state: AccountState::Initialized,
        ..Default::default()
    };
    let mut data = vec![0u8; Account::LEN];
    account.pack_into_slice(&mut data);
    data
}

/// Raydium AMM v4 market description with fresh mints and vaults.
pub(crate) fn amm_v4_meta() -> MarketMeta {
    MarketMeta {
        address: Pubkey::new_unique(),
        protocol: DexProtocol::RaydiumAmmV4,
        base_mint: mint(),
        quote_mint: mint(),
        base_vault: Pubkey::new_unique(),
        quote_vault: Pubkey::new_unique(),
        venue: VenueAccounts::None,
    }
}

/// `AmmInfo` bytes for `meta` with a 0.25% swap fee.
pub(crate) fn amm_v4_pool(meta: &MarketMeta) -> Vec<u8> {
    use crate::instruction::utils::raydium_amm_v4_types::{AmmInfo, Fees, pool_status};

    AmmInfo {
        status: pool_status::SWAP_ONLY,
        fees: Fees {
            swap_fee_numerator: 25,
            swap_fee_denominator: 10_000,
            pnl_numerator: 12,
            pnl_denominator: 100,
            ..Default::default()
        },
        token_coin: meta.base_vault,
        token_pc: meta.quote_vault,
        coin_mint: meta.base_mint,
        pc_mint: meta.quote_mint,
        ..Default::default()
    }
    .to_bytes()
}
