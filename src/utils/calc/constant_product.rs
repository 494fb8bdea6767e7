//! 恒定乘积（x * y = k）计算
//!
//! All intermediate values live in u128: `k` is the product of two u64
//! reserves and cannot overflow there.

use crate::constants::trade::trade::BPS_DENOMINATOR;
use crate::parser::types::FeeRate;

/// Result of an exact-in constant-product swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductSwap {
    pub effective_amount_in: u128,
    pub amount_out: u64,
    pub fee_amount: u64,
}

/// Output of swapping `amount_in` into a pool holding `(reserve_in, reserve_out)`.
///
/// `amount_out = reserve_out - k / (reserve_in + amount_in * (1 - fee))`.
/// Returns `None` if a reserve is empty.
pub fn compute_swap_exact_in(
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
    trade_fee: FeeRate,
) -> Option<ConstantProductSwap> {
    if reserve_in == 0 || reserve_out == 0 {
        return None;
    }
    let effective_amount_in = trade_fee.apply_to(amount_in);
    let k = reserve_in as u128 * reserve_out as u128;
    let new_reserve_in = reserve_in as u128 + effective_amount_in;
    let new_reserve_out = k / new_reserve_in;
    // new_reserve_out <= reserve_out since new_reserve_in >= reserve_in
    let amount_out = (reserve_out as u128).saturating_sub(new_reserve_out);
    Some(ConstantProductSwap {
        effective_amount_in,
        amount_out: u64::try_from(amount_out).unwrap_or(u64::MAX),
        fee_amount: u64::try_from(trade_fee.fee_on(amount_in)).unwrap_or(u64::MAX),
    })
}

/// `amount * (1 - slippage_bps / 10_000)`, floored.
pub fn apply_slippage(amount: u64, slippage_bps: u64) -> u64 {
    let keep = BPS_DENOMINATOR.saturating_sub(slippage_bps) as u128;
    (amount as u128 * keep / BPS_DENOMINATOR as u128) as u64
}

/// `|spot - execution| / spot * 100` for the trade.
pub fn price_impact_pct(reserve_in: u64, reserve_out: u64, amount_in: u64, amount_out: u64) -> f64 {
    if reserve_in == 0 || amount_in == 0 {
        return 0.0;
    }
    let spot = reserve_out as f64 / reserve_in as f64;
    if spot == 0.0 {
        return 0.0;
    }
    let execution = amount_out as f64 / amount_in as f64;
    (spot - execution).abs() / spot * 100.0
}
