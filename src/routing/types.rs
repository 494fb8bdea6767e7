use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::common::types::{MarketState, VenueAccounts};
use crate::parser::types::{DexProtocol, PoolState, SwapDirection};

/// One hop of a path: a swap through a single market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexRoute {
    pub protocol: DexProtocol,
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub market_address: Pubkey,
    pub direction: SwapDirection,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub venue: VenueAccounts,
    /// Reserves observed when the route was discovered
    pub pool_state: Option<PoolState>,
}

impl DexRoute {
    /// Hop entering `market` with `input_mint`, or `None` if the market does not trade it.
    pub fn through(market: &MarketState, input_mint: &Pubkey) -> Option<Self> {
        let (direction, output_mint) = market.traverse_from(input_mint)?;
        Some(Self {
            protocol: market.protocol,
            input_mint: *input_mint,
            output_mint,
            market_address: market.address,
            direction,
            base_vault: market.base_vault,
            quote_vault: market.quote_vault,
            venue: market.venue,
            pool_state: Some(market.pool_state),
        })
    }

    /// Vaults ordered as (source, destination) for this hop's direction.
    pub fn vaults_in_out(&self) -> (Pubkey, Pubkey) {
        match self.direction {
            SwapDirection::BaseToQuote => (self.base_vault, self.quote_vault),
            SwapDirection::QuoteToBase => (self.quote_vault, self.base_vault),
        }
    }
}

/// Simulated amounts of one hop
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HopQuote {
    pub amount_in: u64,
    pub amount_out: u64,
    pub min_amount_out: u64,
    /// In the hop's input token
    pub fee: u64,
    pub price_impact_pct: f64,
}

/// A priced path from the requested input mint to the requested output mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingInfo {
    pub hops: Vec<DexRoute>,
    /// One entry per hop, same order as `hops`
    pub legs: Vec<HopQuote>,
    pub input_amount: u64,
    pub expected_output_amount: u64,
    pub min_output_amount: u64,
    /// Sum of per-hop price impacts
    pub price_impact_pct: f64,
    /// Sum of per-hop fees, each in its own input token
    pub estimated_fees: u64,
}

impl RoutingInfo {
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    pub fn input_mint(&self) -> Option<Pubkey> {
        self.hops.first().map(|hop| hop.input_mint)
    }

    pub fn output_mint(&self) -> Option<Pubkey> {
        self.hops.last().map(|hop| hop.output_mint)
    }

    pub fn market_addresses(&self) -> impl Iterator<Item = Pubkey> + '_ {
        self.hops.iter().map(|hop| hop.market_address)
    }
}
