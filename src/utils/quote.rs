//! Quote / simulation helpers for swap routing.
//!
//! Pure functions over a [`PoolState`]; no I/O. Every venue in this crate is
//! constant-product, so one quote path serves all of them.

use serde::{Deserialize, Serialize};

use crate::{
    common::errors::QuoteError,
    constants::trade::trade::BPS_DENOMINATOR,
    parser::types::{PoolState, SwapDirection},
    utils::calc::constant_product::{apply_slippage, compute_swap_exact_in, price_impact_pct},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Output amount for an exact-in swap (in smallest units).
    pub expected_amount: u64,
    /// Deviation of the execution price from the pre-trade spot price, in percent.
    pub price_impact_pct: f64,
    /// Trade fee in input token units. Already embedded in `expected_amount`.
    pub fees: u64,
    /// `expected_amount` reduced by the slippage tolerance.
    pub min_output_amount: u64,
}

/// Quote an exact-in swap of `amount_in` against `pool`.
pub fn quote_exact_in(
    pool: &PoolState,
    amount_in: u64,
    direction: SwapDirection,
    slippage_bps: u64,
) -> Result<SwapQuote, QuoteError> {
    if amount_in == 0 {
        return Err(QuoteError::InvalidAmount);
    }
    if slippage_bps > BPS_DENOMINATOR {
        return Err(QuoteError::InvalidSlippage(slippage_bps));
    }
    let (reserve_in, reserve_out) = pool.reserves_for(direction);
    let swap = compute_swap_exact_in(reserve_in, reserve_out, amount_in, pool.trade_fee)
        .ok_or(QuoteError::IlliquidMarket)?;

    Ok(SwapQuote {
        expected_amount: swap.amount_out,
        price_impact_pct: price_impact_pct(reserve_in, reserve_out, amount_in, swap.amount_out),
        fees: swap.fee_amount,
        min_output_amount: apply_slippage(swap.amount_out, slippage_bps),
    })
}
