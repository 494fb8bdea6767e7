//! 路径发现
//!
//! Topology is pulled from a [`MarketDirectory`] one level at a time, with the
//! lookups of a level running concurrently. The search itself is a pure DFS
//! over the loaded adjacency lists.

use futures::{StreamExt, stream};
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::{
    common::{
        errors::RouterError,
        ledger::MarketDirectory,
        types::{HopBound, MarketState, RouterConfig},
    },
    constants::{
        is_hot_mint,
        trade::trade::{DEFAULT_LOOKUP_CONCURRENCY, DEFAULT_MAX_CANDIDATE_PATHS},
    },
    routing::types::DexRoute,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub hop_bound: HopBound,
    pub lookup_concurrency: usize,
    /// Search stops once this many paths are found
    pub max_candidate_paths: usize,
    /// Only SOL / USDC / USDT may appear between the input and output mints
    pub hot_intermediates_only: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            hop_bound: HopBound::default(),
            lookup_concurrency: DEFAULT_LOOKUP_CONCURRENCY,
            max_candidate_paths: DEFAULT_MAX_CANDIDATE_PATHS,
            hot_intermediates_only: false,
        }
    }
}

impl From<&RouterConfig> for DiscoveryOptions {
    fn from(config: &RouterConfig) -> Self {
        Self {
            hop_bound: config.hop_bound,
            lookup_concurrency: config.lookup_concurrency,
            max_candidate_paths: config.max_candidate_paths,
            hot_intermediates_only: config.hot_intermediates_only,
        }
    }
}

type Adjacency = HashMap<Pubkey, Vec<MarketState>>;

/// All loop-free paths from `input_mint` to `output_mint` within `max_hops`.
pub async fn discover_routes(
    directory: &dyn MarketDirectory,
    input_mint: Pubkey,
    output_mint: Pubkey,
    max_hops: usize,
    options: DiscoveryOptions,
) -> Result<Vec<Vec<DexRoute>>, RouterError> {
    if max_hops == 0 {
        return Err(RouterError::InvalidMaxHops);
    }
    if input_mint == output_mint {
        return Ok(Vec::new());
    }

    let adjacency = load_topology(directory, input_mint, output_mint, max_hops, options).await?;

    let (found, complete) = search_paths(&adjacency, input_mint, output_mint, max_hops, options);
    if !complete {
        warn!(
            input = %input_mint,
            output = %output_mint,
            cap = options.max_candidate_paths,
            "candidate path cap reached, search truncated"
        );
    }

    info!(
        input = %input_mint,
        output = %output_mint,
        max_hops,
        mints_loaded = adjacency.len(),
        paths = found.len(),
        "route discovery finished"
    );
    Ok(found)
}

/// Loads markets of every mint reachable in fewer than `max_hops` hops.
async fn load_topology(
    directory: &dyn MarketDirectory,
    input_mint: Pubkey,
    output_mint: Pubkey,
    max_hops: usize,
    options: DiscoveryOptions,
) -> Result<Adjacency, RouterError> {
    let mut adjacency: Adjacency = HashMap::new();
    let mut frontier = vec![input_mint];

    for level in 0..max_hops {
        if frontier.is_empty() {
            break;
        }
        let lookups: Vec<(Pubkey, anyhow::Result<Vec<MarketState>>)> = stream::iter(frontier)
            .map(|mint| async move { (mint, directory.markets_for_mint(&mint).await) })
            .buffer_unordered(options.lookup_concurrency.max(1))
            .collect()
            .await;

        let mut next = HashSet::new();
        for (mint, result) in lookups {
            let markets = result.map_err(|source| RouterError::Directory { mint, source })?;
            let mut seen = HashSet::with_capacity(markets.len());
            let markets: Vec<MarketState> =
                markets.into_iter().filter(|market| seen.insert(market.address)).collect();
            for market in &markets {
                if let Some((_, neighbour)) = market.traverse_from(&mint) {
                    let cold = options.hot_intermediates_only && !is_hot_mint(&neighbour);
                    if neighbour != output_mint && !cold && !adjacency.contains_key(&neighbour) {
                        next.insert(neighbour);
                    }
                }
            }
            adjacency.insert(mint, markets);
        }
        next.retain(|mint| !adjacency.contains_key(mint));
        debug!(level, loaded = adjacency.len(), next = next.len(), "topology level loaded");
        frontier = next.into_iter().collect();
    }
    Ok(adjacency)
}

/// DFS over a loaded topology. The flag is `false` when the candidate cap
/// stopped the search with edges still unexplored.
fn search_paths(
    adjacency: &Adjacency,
    input_mint: Pubkey,
    output_mint: Pubkey,
    max_hops: usize,
    options: DiscoveryOptions,
) -> (Vec<Vec<DexRoute>>, bool) {
    let mut found = Vec::new();
    let mut path = Vec::with_capacity(max_hops);
    let mut visited = vec![input_mint];
    let search = Search {
        adjacency,
        output_mint,
        max_hops,
        hop_bound: options.hop_bound,
        max_paths: options.max_candidate_paths.max(1),
        hot_intermediates_only: options.hot_intermediates_only,
    };
    let complete = search.walk(input_mint, &mut path, &mut visited, &mut found);
    (found, complete)
}

struct Search<'a> {
    adjacency: &'a Adjacency,
    output_mint: Pubkey,
    max_hops: usize,
    hop_bound: HopBound,
    max_paths: usize,
    hot_intermediates_only: bool,
}

impl Search<'_> {
    /// Returns `false` when the path cap is hit before every edge was tried.
    fn walk(
        &self,
        mint: Pubkey,
        path: &mut Vec<DexRoute>,
        visited: &mut Vec<Pubkey>,
        found: &mut Vec<Vec<DexRoute>>,
    ) -> bool {
        let Some(markets) = self.adjacency.get(&mint) else {
            return true;
        };
        for market in markets {
            if found.len() >= self.max_paths {
                return false;
            }
            let Some(hop) = DexRoute::through(market, &mint) else {
                continue;
            };
            // no cycles
            if visited.contains(&hop.output_mint) {
                continue;
            }
            if self.hot_intermediates_only
                && hop.output_mint != self.output_mint
                && !is_hot_mint(&hop.output_mint)
            {
                continue;
            }

            path.push(hop);
            if hop.output_mint == self.output_mint {
                if self.hop_bound.accepts(path.len(), self.max_hops) {
                    found.push(path.clone());
                }
            } else if path.len() < self.max_hops {
                visited.push(hop.output_mint);
                let complete = self.walk(hop.output_mint, path, visited, found);
                visited.pop();
                if !complete {
                    path.pop();
                    return false;
                }
            }
            path.pop();
        }
        true
    }
}
