//! Orca Token Swap V2 (spl-token-swap) 账户类型
//!
//! 布局（324 字节）：1 字节版本号，其后为 `SwapV1`：
//! `is_initialized, bump_seed, token_program_id, token_a, token_b, pool_mint,
//!  token_a_mint, token_b_mint, pool_fee_account, fees (8 × u64), curve_type, calculator (32)`
//!
//! 储备就是两个 vault（`token_a` / `token_b`）的余额。交易费与 owner 交易费都从输入中扣除。

use solana_sdk::pubkey::Pubkey;

use crate::parser::utils::BinaryReader;

pub const SWAP_ACCOUNT_SIZE: usize = 324;
/// `SwapVersion::SwapV1`
pub const CURRENT_VERSION: u8 = 1;

/// Only the constant-product curve is quoted
pub mod curve_type {
    pub const CONSTANT_PRODUCT: u8 = 0;
    pub const CONSTANT_PRICE: u8 = 1;
    pub const STABLE: u8 = 2;
    pub const OFFSET: u8 = 3;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fees {
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub owner_trade_fee_numerator: u64,
    pub owner_trade_fee_denominator: u64,
    pub owner_withdraw_fee_numerator: u64,
    pub owner_withdraw_fee_denominator: u64,
    pub host_fee_numerator: u64,
    pub host_fee_denominator: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapV1 {
    pub version: u8,
    pub is_initialized: bool,
    pub bump_seed: u8,
    pub token_program_id: Pubkey,
    pub token_a: Pubkey,
    pub token_b: Pubkey,
    pub pool_mint: Pubkey,
    pub token_a_mint: Pubkey,
    pub token_b_mint: Pubkey,
    pub pool_fee_account: Pubkey,
    pub fees: Fees,
    pub curve_type: u8,
    pub calculator: [u8; 32],
}

impl SwapV1 {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(SWAP_ACCOUNT_SIZE);
        data.push(self.version);
        data.push(self.is_initialized as u8);
        data.push(self.bump_seed);
        for key in [
            &self.token_program_id,
            &self.token_a,
            &self.token_b,
            &self.pool_mint,
            &self.token_a_mint,
            &self.token_b_mint,
            &self.pool_fee_account,
        ] {
            data.extend_from_slice(key.as_ref());
        }
        let fees = &self.fees;
        for value in [
            fees.trade_fee_numerator,
            fees.trade_fee_denominator,
            fees.owner_trade_fee_numerator,
            fees.owner_trade_fee_denominator,
            fees.owner_withdraw_fee_numerator,
            fees.owner_withdraw_fee_denominator,
            fees.host_fee_numerator,
            fees.host_fee_denominator,
        ] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.push(self.curve_type);
        data.extend_from_slice(&self.calculator);
        data
    }
}

pub fn swap_v1_decode(data: &[u8]) -> Result<SwapV1, String> {
    let mut reader = BinaryReader::new(data);
    let version = reader.read_u8()?;
    let is_initialized = match reader.read_u8()? {
        0 => false,
        1 => true,
        other => return Err(format!("is_initialized must be 0 or 1, got {}", other)),
    };
    let bump_seed = reader.read_u8()?;
    let token_program_id = reader.read_pubkey()?;
    let token_a = reader.read_pubkey()?;
    let token_b = reader.read_pubkey()?;
    let pool_mint = reader.read_pubkey()?;
    let token_a_mint = reader.read_pubkey()?;
    let token_b_mint = reader.read_pubkey()?;
    let pool_fee_account = reader.read_pubkey()?;
    let fees = Fees {
        trade_fee_numerator: reader.read_u64()?,
        trade_fee_denominator: reader.read_u64()?,
        owner_trade_fee_numerator: reader.read_u64()?,
        owner_trade_fee_denominator: reader.read_u64()?,
        owner_withdraw_fee_numerator: reader.read_u64()?,
        owner_withdraw_fee_denominator: reader.read_u64()?,
        host_fee_numerator: reader.read_u64()?,
        host_fee_denominator: reader.read_u64()?,
    };
    let curve_type = reader.read_u8()?;
    let mut calculator = [0u8; 32];
    calculator.copy_from_slice(reader.read_fixed_array(32)?);
    Ok(SwapV1 {
        version,
        is_initialized,
        bump_seed,
        token_program_id,
        token_a,
        token_b,
        pool_mint,
        token_a_mint,
        token_b_mint,
        pool_fee_account,
        fees,
        curve_type,
        calculator,
    })
}
