//! Raydium CPMM 账户类型
//!
//! Anchor zero-copy 账户：前 8 字节为 discriminator，其后为 packed 字段，
//! 与 Borsh 的定长编码一致。
//!
//! - `PoolState`：vault、mint 以及尚未提取的协议/基金/创建者费用
//! - `AmmConfig`：费率档位，多个池共享同一个 config
//!
//! 费率以 1/1_000_000 为单位存储（2500 = 0.25%）；protocol / fund 费率是交易费的比例。

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// `sha256("account:PoolState")[..8]`
pub const POOL_STATE_DISCRIMINATOR: [u8; 8] = [247, 237, 227, 245, 215, 195, 222, 70];
/// `sha256("account:AmmConfig")[..8]`
pub const AMM_CONFIG_DISCRIMINATOR: [u8; 8] = [218, 244, 33, 104, 203, 203, 43, 111];

pub const FEE_RATE_DENOMINATOR: u64 = 1_000_000;

/// Bit 2 of `status` disables swaps.
pub const SWAP_DISABLED_MASK: u8 = 1 << 2;

/// Which side the creator fee is charged on
pub mod creator_fee_on {
    pub const BOTH_TOKEN: u8 = 0;
    pub const ONLY_TOKEN_0: u8 = 1;
    pub const ONLY_TOKEN_1: u8 = 2;
}

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct PoolState {
    pub amm_config: Pubkey,
    pub pool_creator: Pubkey,
    pub token0_vault: Pubkey,
    pub token1_vault: Pubkey,
    pub lp_mint: Pubkey,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
    pub token0_program: Pubkey,
    pub token1_program: Pubkey,
    pub observation_key: Pubkey,
    pub auth_bump: u8,
    pub status: u8,
    pub lp_mint_decimals: u8,
    pub mint0_decimals: u8,
    pub mint1_decimals: u8,
    pub lp_supply: u64,
    pub protocol_fees_token0: u64,
    pub protocol_fees_token1: u64,
    pub fund_fees_token0: u64,
    pub fund_fees_token1: u64,
    pub open_time: u64,
    pub recent_epoch: u64,
    pub creator_fee_on: u8,
    pub enable_creator_fee: bool,
    pub padding1: [u8; 6],
    pub creator_fees_token0: u64,
    pub creator_fees_token1: u64,
    pub padding: [u64; 28],
}

/// Account size including the discriminator
pub const POOL_STATE_SIZE: usize = 637;

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AmmConfig {
    pub bump: u8,
    pub disable_create_pool: bool,
    pub index: u16,
    pub trade_fee_rate: u64,
    pub protocol_fee_rate: u64,
    pub fund_fee_rate: u64,
    pub create_pool_fee: u64,
    pub protocol_owner: Pubkey,
    pub fund_owner: Pubkey,
    pub creator_fee_rate: u64,
    pub padding: [u64; 15],
}

/// Account size including the discriminator
pub const AMM_CONFIG_SIZE: usize = 236;

impl PoolState {
    pub fn swap_enabled(&self) -> bool {
        self.status & SWAP_DISABLED_MASK == 0
    }

    /// Vault amounts owed to protocol, fund and creator, per token.
    pub fn accrued_fees(&self) -> (u128, u128) {
        (
            self.protocol_fees_token0 as u128
                + self.fund_fees_token0 as u128
                + self.creator_fees_token0 as u128,
            self.protocol_fees_token1 as u128
                + self.fund_fees_token1 as u128
                + self.creator_fees_token1 as u128,
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        with_discriminator(&POOL_STATE_DISCRIMINATOR, borsh::to_vec(self).unwrap_or_default())
    }
}

impl AmmConfig {
    pub fn to_bytes(&self) -> Vec<u8> {
        with_discriminator(&AMM_CONFIG_DISCRIMINATOR, borsh::to_vec(self).unwrap_or_default())
    }
}

fn with_discriminator(discriminator: &[u8; 8], body: Vec<u8>) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + body.len());
    data.extend_from_slice(discriminator);
    data.extend(body);
    data
}

/// Decode the body that follows the discriminator.
pub fn pool_state_decode(body: &[u8]) -> Option<PoolState> {
    if body.len() < POOL_STATE_SIZE - 8 {
        return None;
    }
    borsh::from_slice::<PoolState>(&body[..POOL_STATE_SIZE - 8]).ok()
}

/// Decode the body that follows the discriminator.
pub fn amm_config_decode(body: &[u8]) -> Option<AmmConfig> {
    if body.len() < AMM_CONFIG_SIZE - 8 {
        return None;
    }
    borsh::from_slice::<AmmConfig>(&body[..AMM_CONFIG_SIZE - 8]).ok()
}
