//! 路径定价与排序
//!
//! Each candidate is priced hop by hop against the pool snapshot carried by
//! the hop; the output of hop `i` is the input of hop `i + 1`.

use std::cmp::Ordering;
use tracing::{debug, info};

use crate::{
    common::errors::QuoteError,
    routing::types::{DexRoute, HopQuote, RoutingInfo},
    utils::quote::quote_exact_in,
};

/// Price `hops` for an exact-in swap of `amount_in`.
pub fn simulate_route(
    hops: &[DexRoute],
    amount_in: u64,
    slippage_bps: u64,
) -> Result<RoutingInfo, QuoteError> {
    if hops.is_empty() {
        return Err(QuoteError::EmptyRoute);
    }

    let mut legs = Vec::with_capacity(hops.len());
    let mut amount = amount_in;
    let mut price_impact_pct = 0.0;
    let mut estimated_fees: u64 = 0;
    for hop in hops {
        let pool = hop.pool_state.as_ref().ok_or(QuoteError::MissingPoolState)?;
        let quote = quote_exact_in(pool, amount, hop.direction, slippage_bps)?;
        legs.push(HopQuote {
            amount_in: amount,
            amount_out: quote.expected_amount,
            min_amount_out: quote.min_output_amount,
            fee: quote.fees,
            price_impact_pct: quote.price_impact_pct,
        });
        price_impact_pct += quote.price_impact_pct;
        estimated_fees = estimated_fees.saturating_add(quote.fees);
        amount = quote.expected_amount;
    }
    if amount == 0 {
        return Err(QuoteError::ZeroOutput);
    }

    let min_output_amount = legs.last().map_or(0, |leg| leg.min_amount_out);
    Ok(RoutingInfo {
        hops: hops.to_vec(),
        legs,
        input_amount: amount_in,
        expected_output_amount: amount,
        min_output_amount,
        price_impact_pct,
        estimated_fees,
    })
}

/// Best first: higher output, then lower price impact. Paths that cannot be
/// priced are dropped.
pub fn rank_routes(
    candidates: Vec<Vec<DexRoute>>,
    amount_in: u64,
    slippage_bps: u64,
) -> Vec<RoutingInfo> {
    let total = candidates.len();
    let mut ranked: Vec<RoutingInfo> = candidates
        .into_iter()
        .filter_map(|hops| match simulate_route(&hops, amount_in, slippage_bps) {
            Ok(route) => Some(route),
            Err(e) => {
                debug!(hops = hops.len(), error = %e, "dropping unpriceable path");
                None
            }
        })
        .collect();
    ranked.sort_by(compare_routes);
    info!(candidates = total, priced = ranked.len(), "routes ranked");
    ranked
}

fn compare_routes(a: &RoutingInfo, b: &RoutingInfo) -> Ordering {
    b.expected_output_amount
        .cmp(&a.expected_output_amount)
        .then_with(|| a.price_impact_pct.total_cmp(&b.price_impact_pct))
}
