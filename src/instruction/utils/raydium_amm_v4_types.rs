//! Raydium AMM V4 (Raydium Liquidity Pool V4) 类型定义
//!
//! Raydium AMM V4 是 Raydium 的传统自动做市商（AMM）协议，使用恒定乘积公式（x * y = k）进行流动性提供和交易。
//!
//! ## 程序信息
//! - **程序名称**: Raydium Liquidity Pool V4
//! - **程序地址**: `675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8`
//!
//! ## 储备
//! `AmmInfo` 不保存储备；真实储备 = vault 余额 − `need_take_pnl_*`。
//!
//! ## 费用
//! Swap 按 `swap_fee_numerator / swap_fee_denominator` 从输入中扣除（通常 25/10000），
//! 其中 `pnl_numerator / pnl_denominator` 归协议所有。

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Fees {
    pub min_separate_numerator: u64,
    pub min_separate_denominator: u64,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub pnl_numerator: u64,
    pub pnl_denominator: u64,
    pub swap_fee_numerator: u64,
    pub swap_fee_denominator: u64,
}

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct OutPutData {
    pub need_take_pnl_coin: u64,
    pub need_take_pnl_pc: u64,
    pub total_pnl_pc: u64,
    pub total_pnl_coin: u64,
    pub pool_open_time: u64,
    pub punish_pc_amount: u64,
    pub punish_coin_amount: u64,
    pub orderbook_to_init_time: u64,
    pub swap_coin_in_amount: u128,
    pub swap_pc_out_amount: u128,
    pub swap_take_pc_fee: u64,
    pub swap_pc_in_amount: u128,
    pub swap_coin_out_amount: u128,
    pub swap_take_coin_fee: u64,
}

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AmmInfo {
    pub status: u64,
    pub nonce: u64,
    pub order_num: u64,
    pub depth: u64,
    pub coin_decimals: u64,
    pub pc_decimals: u64,
    pub state: u64,
    pub reset_flag: u64,
    pub min_size: u64,
    pub vol_max_cut_ratio: u64,
    pub amount_wave: u64,
    pub coin_lot_size: u64,
    pub pc_lot_size: u64,
    pub min_price_multiplier: u64,
    pub max_price_multiplier: u64,
    pub sys_decimal_value: u64,
    pub fees: Fees,
    pub out_put: OutPutData,
    pub token_coin: Pubkey,
    pub token_pc: Pubkey,
    pub coin_mint: Pubkey,
    pub pc_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub open_orders: Pubkey,
    pub market: Pubkey,
    pub serum_dex: Pubkey,
    pub target_orders: Pubkey,
    pub withdraw_queue: Pubkey,
    pub token_temp_lp: Pubkey,
    pub amm_owner: Pubkey,
    pub lp_amount: u64,
    pub client_order_id: u64,
    pub padding: [u64; 2],
}

pub const AMM_INFO_SIZE: usize = 752;

/// Pool 状态常量（`AmmStatus`）
pub mod pool_status {
    /// 未初始化
    pub const UNINITIALIZED: u64 = 0;
    /// 已初始化
    pub const INITIALIZED: u64 = 1;
    /// 已禁用
    pub const DISABLED: u64 = 2;
    /// 只能提现
    pub const WITHDRAW_ONLY: u64 = 3;
    /// 只能增减流动性
    pub const LIQUIDITY_ONLY: u64 = 4;
    /// 只能订单簿
    pub const ORDER_BOOK_ONLY: u64 = 5;
    /// 只能交易
    pub const SWAP_ONLY: u64 = 6;
    /// 等待开盘，首笔 swap 后自动切换为 SwapOnly
    pub const WAITING_TRADE: u64 = 7;

    /// 只有这些状态允许 swap
    pub fn is_swappable(status: u64) -> bool {
        matches!(status, INITIALIZED | SWAP_ONLY | WAITING_TRADE)
    }
}

pub fn amm_info_decode(data: &[u8]) -> Option<AmmInfo> {
    if data.len() < AMM_INFO_SIZE {
        return None;
    }
    borsh::from_slice::<AmmInfo>(&data[..AMM_INFO_SIZE]).ok()
}

impl AmmInfo {
    /// Account bytes as stored on chain
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amm_info_size() {
        let info = AmmInfo::default();
        assert_eq!(info.to_bytes().len(), AMM_INFO_SIZE);
        assert_eq!(amm_info_decode(&info.to_bytes()), Some(info));
        assert_eq!(amm_info_decode(&[0u8; AMM_INFO_SIZE - 1]), None);
    }

    #[test]
    fn test_swap_permission() {
        assert!(pool_status::is_swappable(pool_status::SWAP_ONLY));
        assert!(pool_status::is_swappable(pool_status::WAITING_TRADE));
        assert!(!pool_status::is_swappable(pool_status::ORDER_BOOK_ONLY));
        assert!(!pool_status::is_swappable(pool_status::WITHDRAW_ONLY));
    }
}
