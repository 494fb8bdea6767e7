//! 拆单路由
//!
//! Spreads one input amount over several ranked paths that share no market.
//! Each share is re-priced on its own path; the plan does not search for an
//! optimal split.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::{
    common::errors::RouterError,
    routing::{optimizer::simulate_route, types::RoutingInfo},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitAllocation {
    pub percent: u8,
    /// The path re-priced for this share
    pub route: RoutingInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub allocations: Vec<SplitAllocation>,
    pub total_input_amount: u64,
    pub total_expected_output: u64,
    pub total_min_output: u64,
}

/// Up to `count` best routes, skipping any that reuse a market already taken.
pub fn select_disjoint_routes(ranked: &[RoutingInfo], count: usize) -> Vec<RoutingInfo> {
    let mut used = HashSet::new();
    let mut selected = Vec::with_capacity(count);
    for route in ranked {
        if selected.len() == count {
            break;
        }
        if route.market_addresses().any(|address| used.contains(&address)) {
            continue;
        }
        used.extend(route.market_addresses());
        selected.push(route.clone());
    }
    selected
}

/// Split `amount` by `percents` (must sum to 100). Rounding dust goes to the first share.
pub fn allocate_amounts(amount: u64, percents: &[u8]) -> Result<Vec<u64>, RouterError> {
    if percents.is_empty() {
        return Err(RouterError::InvalidSplit("no shares given".to_string()));
    }
    if percents.contains(&0) {
        return Err(RouterError::InvalidSplit("shares must be greater than zero".to_string()));
    }
    let sum: u32 = percents.iter().map(|p| *p as u32).sum();
    if sum != 100 {
        return Err(RouterError::InvalidSplit(format!("shares sum to {sum}, expected 100")));
    }

    let mut shares: Vec<u64> =
        percents.iter().map(|p| (amount as u128 * *p as u128 / 100) as u64).collect();
    let allocated: u64 = shares.iter().sum();
    shares[0] += amount - allocated;
    Ok(shares)
}

/// Price a split of `amount` over the best disjoint routes in `ranked`.
pub fn plan_split(
    ranked: &[RoutingInfo],
    amount: u64,
    percents: &[u8],
    slippage_bps: u64,
) -> Result<SplitPlan, RouterError> {
    let shares = allocate_amounts(amount, percents)?;
    let routes = select_disjoint_routes(ranked, percents.len());
    if routes.len() < percents.len() {
        return Err(RouterError::InvalidSplit(format!(
            "{} share(s) requested but only {} disjoint route(s) available",
            percents.len(),
            routes.len()
        )));
    }

    let mut allocations = Vec::with_capacity(routes.len());
    for ((route, share), percent) in routes.iter().zip(shares).zip(percents) {
        let priced = simulate_route(&route.hops, share, slippage_bps)?;
        allocations.push(SplitAllocation { percent: *percent, route: priced });
    }

    let total_expected_output =
        allocations.iter().map(|a| a.route.expected_output_amount).fold(0u64, u64::saturating_add);
    let total_min_output =
        allocations.iter().map(|a| a.route.min_output_amount).fold(0u64, u64::saturating_add);
    debug!(routes = allocations.len(), total_expected_output, "split planned");

    Ok(SplitPlan { allocations, total_input_amount: amount, total_expected_output, total_min_output })
}
