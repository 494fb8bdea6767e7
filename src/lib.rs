pub mod common;
pub mod constants;
pub mod instruction;
pub mod parser;
pub mod routing;
pub mod trading;
pub mod utils;

use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

pub use crate::common::{
    AccountSubscriber, AccountSubscription, CleanupError, LedgerClient, MarketCache, MarketDirectory,
    AccountRole, MarketMeta, MarketState, ObserverHandle, RouterConfig, RouterError, SolanaRpcClient,
    SubscriptionHandle, SwapExecution, TransactionSigner, VenueAccounts,
};
pub use crate::instruction::{HopSwapParams, InstructionBuilderRegistry, SwapInstructionBuilder};
pub use crate::parser::RawMarketAccounts;
pub use crate::parser::types::{DexProtocol, FeeRate, PoolState, SwapDirection};
pub use crate::routing::{DexRoute, DiscoveryOptions, HopQuote, RoutingInfo, SplitPlan};
pub use crate::trading::{RetryPolicy, Sleeper, TransactionAssembler};
pub use crate::utils::{SwapQuote, quote_exact_in};

use crate::common::errors::QuoteError;
use crate::trading::TokioSleeper;

/// Route discovery, pricing and swap assembly over the markets a caller tracks
///
/// The market cache doubles as the default topology source; a separate
/// [`MarketDirectory`] can be plugged in with [`SwapRouter::with_directory`].
pub struct SwapRouter {
    config: RouterConfig,
    ledger: Arc<dyn LedgerClient>,
    cache: Arc<MarketCache>,
    directory: Arc<dyn MarketDirectory>,
    builders: InstructionBuilderRegistry,
    sleeper: Arc<dyn Sleeper>,
    assembler: TransactionAssembler,
}

impl SwapRouter {
    pub fn new(
        config: RouterConfig,
        ledger: Arc<dyn LedgerClient>,
        subscriber: Arc<dyn AccountSubscriber>,
    ) -> Self {
        Self::with_cache(config, ledger, Arc::new(MarketCache::new(subscriber)))
    }

    pub fn with_cache(config: RouterConfig, ledger: Arc<dyn LedgerClient>, cache: Arc<MarketCache>) -> Self {
        let builders = InstructionBuilderRegistry::with_default_builders();
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        let assembler = TransactionAssembler::from_config(ledger.clone(), builders.clone(), &config)
            .with_sleeper(sleeper.clone());
        Self { directory: cache.clone(), config, ledger, cache, builders, sleeper, assembler }
    }

    pub fn with_directory(mut self, directory: Arc<dyn MarketDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_instruction_builders(mut self, builders: InstructionBuilderRegistry) -> Self {
        self.builders = builders;
        self.rebuild_assembler();
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self.rebuild_assembler();
        self
    }

    fn rebuild_assembler(&mut self) {
        self.assembler =
            TransactionAssembler::from_config(self.ledger.clone(), self.builders.clone(), &self.config)
                .with_sleeper(self.sleeper.clone());
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    async fn with_deadline<T, F>(&self, operation: F) -> Result<T, RouterError>
    where
        F: Future<Output = Result<T, RouterError>>,
    {
        match self.config.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, operation)
                .await
                .map_err(|_| RouterError::DeadlineExceeded(limit))?,
            None => operation.await,
        }
    }

    /// Load the current state of a market and keep it updated from pushes.
    pub async fn track_market(&self, meta: MarketMeta) -> Result<MarketState, RouterError> {
        let state = self.cache.load_market(self.ledger.as_ref(), meta).await?;
        self.cache.subscribe(meta).await?;
        Ok(state)
    }

    /// Read a pool account, derive its market description and track it.
    pub async fn track_pool(
        &self,
        address: Pubkey,
        protocol: DexProtocol,
    ) -> Result<MarketState, RouterError> {
        let data = self.ledger.fetch_account(&address).await.map_err(RouterError::Ledger)?;
        let meta = MarketMeta::from_pool_account(address, protocol, &data)?;
        info!(market = %address, protocol = %protocol, "tracking pool");
        self.track_market(meta).await
    }

    /// Ranked routes for swapping `amount` of `input_mint` into `output_mint`.
    ///
    /// An empty list means no path exists. `NoRouteFound` means paths exist but
    /// none of them could be priced.
    pub async fn find_best_routes(
        &self,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: u64,
        max_hops: Option<usize>,
    ) -> Result<Vec<RoutingInfo>, RouterError> {
        self.with_deadline(self.find_best_routes_inner(input_mint, output_mint, amount, max_hops))
            .await
    }

    async fn find_best_routes_inner(
        &self,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: u64,
        max_hops: Option<usize>,
    ) -> Result<Vec<RoutingInfo>, RouterError> {
        if amount == 0 {
            return Err(QuoteError::InvalidAmount.into());
        }
        let max_hops = max_hops.unwrap_or(self.config.default_max_hops);
        let mut candidates = routing::discover_routes(
            self.directory.as_ref(),
            input_mint,
            output_mint,
            max_hops,
            DiscoveryOptions::from(&self.config),
        )
        .await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Prefer the cache's reserves over whatever the directory reported.
        for hop in candidates.iter_mut().flatten() {
            if let Some(state) = self.cache.get(&hop.market_address) {
                hop.pool_state = Some(state.pool_state);
            }
        }

        let ranked = routing::rank_routes(candidates, amount, self.config.slippage_bps);
        if ranked.is_empty() {
            return Err(RouterError::NoRouteFound { input_mint, output_mint });
        }
        Ok(ranked)
    }

    /// Split `amount` over the best market-disjoint routes by `percents`.
    pub async fn plan_split(
        &self,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: u64,
        percents: &[u8],
        max_hops: Option<usize>,
    ) -> Result<SplitPlan, RouterError> {
        let ranked = self.find_best_routes(input_mint, output_mint, amount, max_hops).await?;
        if ranked.is_empty() {
            return Err(RouterError::NoRouteFound { input_mint, output_mint });
        }
        routing::plan_split(&ranked, amount, percents, self.config.slippage_bps)
    }

    pub async fn build_swap_transaction(
        &self,
        routing: &RoutingInfo,
        user: &Pubkey,
        retry_budget: Option<u32>,
    ) -> Result<Transaction, RouterError> {
        self.with_deadline(self.assembler.build_swap_transaction(routing, user, retry_budget)).await
    }

    /// Assemble, sign, submit and confirm `routing`.
    pub async fn execute_route(
        &self,
        routing: &RoutingInfo,
        signer: &dyn TransactionSigner,
        retry_budget: Option<u32>,
    ) -> Result<SwapExecution, RouterError> {
        let user = signer.pubkey();
        let mut transaction = self.build_swap_transaction(routing, &user, retry_budget).await?;
        signer.sign_transaction(&mut transaction).map_err(RouterError::Signing)?;

        let signature = self.ledger.submit(&transaction).await.map_err(RouterError::Ledger)?;
        let confirmed = self.ledger.confirm(&signature).await.map_err(RouterError::Ledger)?;
        info!(%signature, confirmed, hops = routing.hops.len(), "swap submitted");
        Ok(SwapExecution { signature, confirmed })
    }

    pub fn register_market_observer<F>(&self, observer: F) -> ObserverHandle
    where
        F: Fn(&MarketState) + Send + Sync + 'static,
    {
        self.cache.register_observer(observer)
    }

    /// Release every subscription and observer. Safe to call more than once.
    pub async fn cleanup(&self) -> Vec<CleanupError> {
        self.cache.cleanup().await
    }
}
