//! 池账户解码
//!
//! A venue's pool account holds mints, vaults, fees and any amounts owed to
//! the protocol, but not the reserves: those are the vault token balances
//! minus what is owed. [`decode_pool_state`] therefore takes the pool
//! account together with both vault accounts (and, for Raydium CPMM, the
//! shared fee config) and turns them into the uniform [`PoolState`].
//! Malformed input is reported, never defaulted.

use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::{Account as TokenAccount, AccountState};

use crate::{
    common::{errors::DecodeError, types::VenueAccounts},
    instruction::utils::{
        orca_v2_types::{self, SWAP_ACCOUNT_SIZE, SwapV1, swap_v1_decode},
        raydium_amm_v4_types::{AMM_INFO_SIZE, AmmInfo, amm_info_decode, pool_status},
        raydium_cpmm_types::{
            self, AMM_CONFIG_DISCRIMINATOR, AMM_CONFIG_SIZE, AmmConfig, POOL_STATE_DISCRIMINATOR,
            POOL_STATE_SIZE, amm_config_decode, pool_state_decode,
        },
    },
    parser::types::{DexProtocol, FeeRate, PoolState},
};

/// Raw buffers one market's pool state is assembled from
#[derive(Debug, Clone, Copy)]
pub struct RawMarketAccounts<'a> {
    pub pool: &'a [u8],
    pub base_vault: &'a [u8],
    pub quote_vault: &'a [u8],
    /// Raydium CPMM `AmmConfig`; ignored by other venues
    pub fee_config: Option<&'a [u8]>,
    /// Unix seconds at which the newest of these buffers was observed
    pub observed_at: u64,
}

/// Static fields of a pool account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAccount {
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub venue: VenueAccounts,
}

/// Decode the mints, vaults and venue accounts of a raw pool account.
pub fn decode_pool_account(protocol: DexProtocol, data: &[u8]) -> Result<PoolAccount, DecodeError> {
    match protocol {
        DexProtocol::RaydiumAmmV4 => {
            let info = amm_info(data)?;
            Ok(PoolAccount {
                base_mint: info.coin_mint,
                quote_mint: info.pc_mint,
                base_vault: info.token_coin,
                quote_vault: info.token_pc,
                venue: VenueAccounts::None,
            })
        }
        DexProtocol::RaydiumCpmm => {
            let pool = cpmm_pool(data)?;
            Ok(PoolAccount {
                base_mint: pool.token0_mint,
                quote_mint: pool.token1_mint,
                base_vault: pool.token0_vault,
                quote_vault: pool.token1_vault,
                venue: VenueAccounts::RaydiumCpmm { amm_config: pool.amm_config },
            })
        }
        DexProtocol::OrcaV2 => {
            let swap = orca_swap(data)?;
            Ok(PoolAccount {
                base_mint: swap.token_a_mint,
                quote_mint: swap.token_b_mint,
                base_vault: swap.token_a,
                quote_vault: swap.token_b,
                venue: VenueAccounts::OrcaV2 {
                    pool_mint: swap.pool_mint,
                    fee_account: swap.pool_fee_account,
                },
            })
        }
        DexProtocol::RaydiumClmm => Err(DecodeError::UnsupportedProtocol(protocol.tag().to_string())),
    }
}

/// Decode a market's raw accounts for `protocol` into a [`PoolState`].
pub fn decode_pool_state(
    protocol: DexProtocol,
    accounts: &RawMarketAccounts<'_>,
) -> Result<PoolState, DecodeError> {
    match protocol {
        DexProtocol::RaydiumAmmV4 => decode_raydium_amm_v4(accounts),
        DexProtocol::RaydiumCpmm => decode_raydium_cpmm(accounts),
        DexProtocol::OrcaV2 => decode_orca_v2(accounts),
        DexProtocol::RaydiumClmm => Err(DecodeError::UnsupportedProtocol(protocol.tag().to_string())),
    }
}

/// Same as [`decode_pool_state`] but keyed by the string tag.
pub fn decode_pool_state_by_tag(
    tag: &str,
    accounts: &RawMarketAccounts<'_>,
) -> Result<PoolState, DecodeError> {
    decode_pool_state(tag.parse()?, accounts)
}

fn expect_len(protocol: DexProtocol, data: &[u8], expected: usize) -> Result<(), DecodeError> {
    if data.len() != expected {
        return Err(DecodeError::WrongLength { protocol, expected, actual: data.len() });
    }
    Ok(())
}

fn invalid(protocol: DexProtocol, field: &'static str, reason: impl Into<String>) -> DecodeError {
    DecodeError::InvalidField { protocol, field, reason: reason.into() }
}

fn fee(
    protocol: DexProtocol,
    field: &'static str,
    numerator: u64,
    denominator: u64,
) -> Result<FeeRate, DecodeError> {
    FeeRate::new(numerator, denominator).ok_or_else(|| {
        invalid(protocol, field, format!("{}/{} is not a fraction below one", numerator, denominator))
    })
}

/// `a * b` as one exact fraction.
fn fee_product(protocol: DexProtocol, field: &'static str, a: FeeRate, b: FeeRate) -> Result<FeeRate, DecodeError> {
    let overflow = || invalid(protocol, field, "fee scale overflows u64");
    let numerator = a.numerator.checked_mul(b.numerator).ok_or_else(overflow)?;
    let denominator = a.denominator.checked_mul(b.denominator).ok_or_else(overflow)?;
    fee(protocol, field, numerator, denominator)
}

/// `a + b` as one exact fraction.
fn fee_sum(protocol: DexProtocol, field: &'static str, a: FeeRate, b: FeeRate) -> Result<FeeRate, DecodeError> {
    if a.denominator == b.denominator {
        return fee(protocol, field, a.numerator.saturating_add(b.numerator), a.denominator);
    }
    let overflow = || invalid(protocol, field, "fee scale overflows u64");
    let left = a.numerator.checked_mul(b.denominator).ok_or_else(overflow)?;
    let right = b.numerator.checked_mul(a.denominator).ok_or_else(overflow)?;
    let denominator = a.denominator.checked_mul(b.denominator).ok_or_else(overflow)?;
    fee(protocol, field, left.checked_add(right).ok_or_else(overflow)?, denominator)
}

/// Balance of an initialized SPL token account holding `mint`.
fn vault_amount(
    protocol: DexProtocol,
    field: &'static str,
    data: &[u8],
    mint: &Pubkey,
) -> Result<u64, DecodeError> {
    expect_len(protocol, data, TokenAccount::LEN)?;
    let account = TokenAccount::unpack(data).map_err(|e| invalid(protocol, field, e.to_string()))?;
    if account.state != AccountState::Initialized {
        return Err(invalid(protocol, field, format!("token account is {:?}", account.state)));
    }
    if account.mint != *mint {
        return Err(invalid(protocol, field, format!("holds {} instead of {}", account.mint, mint)));
    }
    Ok(account.amount)
}

/// Vault balance minus amounts owed outside the pool.
fn reserve(
    protocol: DexProtocol,
    field: &'static str,
    vault: u64,
    owed: u128,
) -> Result<u64, DecodeError> {
    (vault as u128)
        .checked_sub(owed)
        .map(|amount| amount as u64)
        .ok_or_else(|| invalid(protocol, field, format!("owed {} exceeds vault balance {}", owed, vault)))
}

// ==================== Raydium AMM V4 ====================

fn amm_info(data: &[u8]) -> Result<AmmInfo, DecodeError> {
    let protocol = DexProtocol::RaydiumAmmV4;
    expect_len(protocol, data, AMM_INFO_SIZE)?;
    amm_info_decode(data).ok_or_else(|| invalid(protocol, "layout", "borsh decode failed"))
}

fn decode_raydium_amm_v4(accounts: &RawMarketAccounts<'_>) -> Result<PoolState, DecodeError> {
    let protocol = DexProtocol::RaydiumAmmV4;
    let info = amm_info(accounts.pool)?;
    if !pool_status::is_swappable(info.status) {
        return Err(invalid(protocol, "status", format!("status {} does not allow swaps", info.status)));
    }
    let fees = &info.fees;
    let trade_fee = fee(protocol, "swap_fee", fees.swap_fee_numerator, fees.swap_fee_denominator)?;
    let pnl_share = fee(protocol, "pnl", fees.pnl_numerator, fees.pnl_denominator)?;

    let coin = vault_amount(protocol, "token_coin", accounts.base_vault, &info.coin_mint)?;
    let pc = vault_amount(protocol, "token_pc", accounts.quote_vault, &info.pc_mint)?;
    Ok(PoolState {
        reserve_base: reserve(protocol, "need_take_pnl_coin", coin, info.out_put.need_take_pnl_coin as u128)?,
        reserve_quote: reserve(protocol, "need_take_pnl_pc", pc, info.out_put.need_take_pnl_pc as u128)?,
        last_update_timestamp: accounts.observed_at,
        trade_fee,
        owner_fee: fee_product(protocol, "pnl", trade_fee, pnl_share)?,
    })
}

// ==================== Raydium CPMM ====================

fn cpmm_pool(data: &[u8]) -> Result<raydium_cpmm_types::PoolState, DecodeError> {
    let protocol = DexProtocol::RaydiumCpmm;
    expect_len(protocol, data, POOL_STATE_SIZE)?;
    if data[..8] != POOL_STATE_DISCRIMINATOR {
        return Err(invalid(protocol, "discriminator", "not a PoolState account"));
    }
    pool_state_decode(&data[8..]).ok_or_else(|| invalid(protocol, "layout", "borsh decode failed"))
}

fn cpmm_config(data: &[u8]) -> Result<AmmConfig, DecodeError> {
    let protocol = DexProtocol::RaydiumCpmm;
    expect_len(protocol, data, AMM_CONFIG_SIZE)?;
    if data[..8] != AMM_CONFIG_DISCRIMINATOR {
        return Err(invalid(protocol, "amm_config", "not an AmmConfig account"));
    }
    amm_config_decode(&data[8..]).ok_or_else(|| invalid(protocol, "amm_config", "borsh decode failed"))
}

fn decode_raydium_cpmm(accounts: &RawMarketAccounts<'_>) -> Result<PoolState, DecodeError> {
    let protocol = DexProtocol::RaydiumCpmm;
    let pool = cpmm_pool(accounts.pool)?;
    if !pool.swap_enabled() {
        return Err(invalid(protocol, "status", format!("swap disabled (status {:#04x})", pool.status)));
    }
    let config_data = accounts
        .fee_config
        .ok_or_else(|| invalid(protocol, "amm_config", "fee config account not provided"))?;
    let config = cpmm_config(config_data)?;

    let scale = raydium_cpmm_types::FEE_RATE_DENOMINATOR;
    let pool_fee = fee(protocol, "trade_fee_rate", config.trade_fee_rate, scale)?;
    let trade_fee = if pool.enable_creator_fee {
        // charged from the input on top of the trade fee
        let creator = fee(protocol, "creator_fee_rate", config.creator_fee_rate, scale)?;
        fee_sum(protocol, "creator_fee_rate", pool_fee, creator)?
    } else {
        pool_fee
    };
    let owner_share = fee(
        protocol,
        "protocol_fee_rate",
        config.protocol_fee_rate.saturating_add(config.fund_fee_rate),
        scale,
    )?;

    let token0 = vault_amount(protocol, "token0_vault", accounts.base_vault, &pool.token0_mint)?;
    let token1 = vault_amount(protocol, "token1_vault", accounts.quote_vault, &pool.token1_mint)?;
    let (owed0, owed1) = pool.accrued_fees();
    Ok(PoolState {
        reserve_base: reserve(protocol, "token0_vault", token0, owed0)?,
        reserve_quote: reserve(protocol, "token1_vault", token1, owed1)?,
        last_update_timestamp: accounts.observed_at,
        trade_fee,
        owner_fee: fee_product(protocol, "protocol_fee_rate", pool_fee, owner_share)?,
    })
}

// ==================== Orca V2 ====================

fn orca_swap(data: &[u8]) -> Result<SwapV1, DecodeError> {
    let protocol = DexProtocol::OrcaV2;
    expect_len(protocol, data, SWAP_ACCOUNT_SIZE)?;
    let swap = swap_v1_decode(data).map_err(|e| invalid(protocol, "is_initialized", e))?;
    if swap.version != orca_v2_types::CURRENT_VERSION {
        return Err(invalid(protocol, "version", format!("unknown version {}", swap.version)));
    }
    if !swap.is_initialized {
        return Err(invalid(protocol, "is_initialized", "pool is not initialized"));
    }
    Ok(swap)
}

fn decode_orca_v2(accounts: &RawMarketAccounts<'_>) -> Result<PoolState, DecodeError> {
    let protocol = DexProtocol::OrcaV2;
    let swap = orca_swap(accounts.pool)?;
    if swap.curve_type != orca_v2_types::curve_type::CONSTANT_PRODUCT {
        return Err(invalid(
            protocol,
            "curve_type",
            format!("curve {} is not constant product", swap.curve_type),
        ));
    }
    let fees = &swap.fees;
    let lp_fee = fee(protocol, "trade_fee", fees.trade_fee_numerator, fees.trade_fee_denominator)?;
    let owner_fee = fee(
        protocol,
        "owner_trade_fee",
        fees.owner_trade_fee_numerator,
        fees.owner_trade_fee_denominator,
    )?;

    Ok(PoolState {
        reserve_base: vault_amount(protocol, "token_a", accounts.base_vault, &swap.token_a_mint)?,
        reserve_quote: vault_amount(protocol, "token_b", accounts.quote_vault, &swap.token_b_mint)?,
        last_update_timestamp: accounts.observed_at,
        // both fees come out of the input amount
        trade_fee: fee_sum(protocol, "owner_trade_fee", lp_fee, owner_fee)?,
        owner_fee,
    })
}
