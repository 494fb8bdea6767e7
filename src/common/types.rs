use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::time::Duration;

use crate::common::errors::DecodeError;
use crate::constants::trade::trade::{
    DEFAULT_LOOKUP_CONCURRENCY, DEFAULT_MAX_CANDIDATE_PATHS, DEFAULT_MAX_HOPS, DEFAULT_SLIPPAGE,
};
use crate::parser::{
    pool_codec::decode_pool_account,
    types::{DexProtocol, PoolState, SwapDirection},
};
use crate::trading::common::retry::RetryPolicy;

/// Venue-specific accounts a swap instruction needs beyond pool and vaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "venue")]
pub enum VenueAccounts {
    /// Raydium AMM v4 needs nothing extra
    #[default]
    None,
    RaydiumCpmm {
        /// Fee tier shared by every pool created under it
        amm_config: Pubkey,
    },
    OrcaV2 {
        pool_mint: Pubkey,
        fee_account: Pubkey,
    },
}

impl VenueAccounts {
    /// Whether these accounts are the ones `protocol`'s swap instruction expects.
    pub fn fits(&self, protocol: DexProtocol) -> bool {
        matches!(
            (protocol, self),
            (DexProtocol::RaydiumAmmV4, VenueAccounts::None)
                | (DexProtocol::RaydiumCpmm, VenueAccounts::RaydiumCpmm { .. })
                | (DexProtocol::OrcaV2, VenueAccounts::OrcaV2 { .. })
                | (DexProtocol::RaydiumClmm, _)
        )
    }
}

/// What an account contributes to a market's pool state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    Pool,
    BaseVault,
    QuoteVault,
    /// Shared fee configuration (Raydium CPMM `AmmConfig`)
    FeeConfig,
}

/// Static description of a market: everything except its live pool state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketMeta {
    pub address: Pubkey,
    pub protocol: DexProtocol,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    #[serde(default)]
    pub venue: VenueAccounts,
}

impl MarketMeta {
    /// Read mints, vaults and venue accounts out of a raw pool account.
    pub fn from_pool_account(
        address: Pubkey,
        protocol: DexProtocol,
        data: &[u8],
    ) -> Result<Self, DecodeError> {
        let account = decode_pool_account(protocol, data)?;
        Ok(Self {
            address,
            protocol,
            base_mint: account.base_mint,
            quote_mint: account.quote_mint,
            base_vault: account.base_vault,
            quote_vault: account.quote_vault,
            venue: account.venue,
        })
    }

    /// Every account the pool state is assembled from.
    pub fn component_accounts(&self) -> Vec<(Pubkey, AccountRole)> {
        let mut accounts = vec![
            (self.address, AccountRole::Pool),
            (self.base_vault, AccountRole::BaseVault),
            (self.quote_vault, AccountRole::QuoteVault),
        ];
        if let VenueAccounts::RaydiumCpmm { amm_config } = self.venue {
            accounts.push((amm_config, AccountRole::FeeConfig));
        }
        accounts
    }

    pub fn with_pool_state(self, pool_state: PoolState) -> MarketState {
        MarketState {
            address: self.address,
            protocol: self.protocol,
            base_mint: self.base_mint,
            quote_mint: self.quote_mint,
            base_vault: self.base_vault,
            quote_vault: self.quote_vault,
            venue: self.venue,
            pool_state,
        }
    }
}

/// Latest known state of one market
///
/// Owned by the market cache; everything outside it works on clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub address: Pubkey,
    pub protocol: DexProtocol,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub venue: VenueAccounts,
    pub pool_state: PoolState,
}

impl MarketState {
    pub fn meta(&self) -> MarketMeta {
        MarketMeta {
            address: self.address,
            protocol: self.protocol,
            base_mint: self.base_mint,
            quote_mint: self.quote_mint,
            base_vault: self.base_vault,
            quote_vault: self.quote_vault,
            venue: self.venue,
        }
    }

    /// Direction and output mint when entering this market with `input_mint`.
    pub fn traverse_from(&self, input_mint: &Pubkey) -> Option<(SwapDirection, Pubkey)> {
        if self.base_mint == self.quote_mint {
            return None;
        }
        if *input_mint == self.base_mint {
            Some((SwapDirection::BaseToQuote, self.quote_mint))
        } else if *input_mint == self.quote_mint {
            Some((SwapDirection::QuoteToBase, self.base_mint))
        } else {
            None
        }
    }
}

/// How `max_hops` bounds discovered paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HopBound {
    /// Paths of 1..=max_hops hops
    #[default]
    Inclusive,
    /// Only paths of exactly max_hops hops
    Exact,
}

impl HopBound {
    pub fn accepts(&self, hops: usize, max_hops: usize) -> bool {
        match self {
            HopBound::Inclusive => hops >= 1 && hops <= max_hops,
            HopBound::Exact => hops == max_hops,
        }
    }
}

/// Router configuration
///
/// Loading it from files or the environment is left to the caller; any serde
/// format works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub default_max_hops: usize,
    pub hop_bound: HopBound,
    /// Slippage tolerance in basis points (100 = 1%)
    pub slippage_bps: u64,
    /// Concurrent market-directory lookups per discovery level
    pub lookup_concurrency: usize,
    pub max_candidate_paths: usize,
    /// Restrict intermediate mints to SOL / USDC / USDT
    pub hot_intermediates_only: bool,
    pub retry: RetryPolicy,
    /// Upper bound for `find_best_routes` and `build_swap_transaction`
    pub request_timeout_ms: Option<u64>,
    pub compute_unit_limit: Option<u32>,
    /// Priority fee in micro-lamports per compute unit
    pub compute_unit_price: Option<u64>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_max_hops: DEFAULT_MAX_HOPS,
            hop_bound: HopBound::default(),
            slippage_bps: DEFAULT_SLIPPAGE,
            lookup_concurrency: DEFAULT_LOOKUP_CONCURRENCY,
            max_candidate_paths: DEFAULT_MAX_CANDIDATE_PATHS,
            hot_intermediates_only: false,
            retry: RetryPolicy::default(),
            request_timeout_ms: None,
            compute_unit_limit: None,
            compute_unit_price: None,
        }
    }
}

impl RouterConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Outcome of a submitted swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapExecution {
    pub signature: Signature,
    pub confirmed: bool,
}
