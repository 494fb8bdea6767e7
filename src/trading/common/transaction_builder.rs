//! 交易组装
//!
//! Turns a priced [`RoutingInfo`] into one unsigned transaction: optional
//! compute-budget instructions, then the swap instructions of every hop in
//! order. Amounts come from the route's legs; the output of hop `i` is the
//! input of hop `i + 1`.

use solana_sdk::{message::Message, pubkey::Pubkey, transaction::Transaction};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    compute_budget_manager::compute_budget_instructions,
    retry::{RetryPolicy, Sleeper, TokioSleeper},
};
use crate::{
    common::{
        errors::{AssemblyError, QuoteError, RouterError},
        ledger::LedgerClient,
        types::RouterConfig,
    },
    constants::trade::trade::DEFAULT_SLIPPAGE,
    instruction::{HopSwapParams, InstructionBuilderRegistry},
    routing::types::RoutingInfo,
    utils::quote::quote_exact_in,
};

pub struct TransactionAssembler {
    ledger: Arc<dyn LedgerClient>,
    builders: InstructionBuilderRegistry,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryPolicy,
    slippage_bps: u64,
    compute_unit_limit: Option<u32>,
    compute_unit_price: Option<u64>,
}

impl TransactionAssembler {
    pub fn new(ledger: Arc<dyn LedgerClient>, builders: InstructionBuilderRegistry) -> Self {
        Self {
            ledger,
            builders,
            sleeper: Arc::new(TokioSleeper),
            retry: RetryPolicy::default(),
            slippage_bps: DEFAULT_SLIPPAGE,
            compute_unit_limit: None,
            compute_unit_price: None,
        }
    }

    pub fn from_config(
        ledger: Arc<dyn LedgerClient>,
        builders: InstructionBuilderRegistry,
        config: &RouterConfig,
    ) -> Self {
        Self::new(ledger, builders)
            .with_retry_policy(config.retry)
            .with_slippage_bps(config.slippage_bps)
            .with_compute_budget(config.compute_unit_limit, config.compute_unit_price)
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Used only for hops whose leg has to be re-quoted.
    pub fn with_slippage_bps(mut self, slippage_bps: u64) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    pub fn with_compute_budget(mut self, unit_limit: Option<u32>, unit_price: Option<u64>) -> Self {
        self.compute_unit_limit = unit_limit;
        self.compute_unit_price = unit_price;
        self
    }

    pub fn builders(&self) -> &InstructionBuilderRegistry {
        &self.builders
    }

    /// Assemble an unsigned transaction paid by `user`.
    ///
    /// `retry_budget` overrides the configured number of attempts. Only
    /// transient failures are retried.
    pub async fn build_swap_transaction(
        &self,
        routing: &RoutingInfo,
        user: &Pubkey,
        retry_budget: Option<u32>,
    ) -> Result<Transaction, RouterError> {
        let policy = self.retry.with_budget(retry_budget.unwrap_or(self.retry.max_attempts));
        let plans = self
            .plan_hops(routing, user)
            .map_err(|source| RouterError::SwapAssemblyFailed { attempts: 1, source })?;

        let mut attempts = 0;
        loop {
            let error = match self.try_assemble(&plans, user).await {
                Ok(transaction) => {
                    debug!(hops = plans.len(), attempts = attempts + 1, "swap transaction assembled");
                    return Ok(transaction);
                }
                Err(e) => e,
            };
            attempts += 1;
            if !error.is_transient() || attempts >= policy.max_attempts {
                warn!(attempts, error = %error, "swap assembly failed");
                return Err(RouterError::SwapAssemblyFailed { attempts, source: error });
            }
            let delay = policy.backoff(attempts - 1);
            warn!(
                attempt = attempts,
                max_attempts = policy.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "swap assembly attempt failed, retrying"
            );
            self.sleeper.sleep(delay).await;
        }
    }

    /// Per-hop amounts and structural checks; nothing here is worth retrying.
    fn plan_hops(&self, routing: &RoutingInfo, user: &Pubkey) -> Result<Vec<HopSwapParams>, AssemblyError> {
        if routing.hops.is_empty() {
            return Err(AssemblyError::EmptyRoute);
        }

        let mut plans = Vec::with_capacity(routing.hops.len());
        let mut amount_in = routing.input_amount;
        for (index, hop) in routing.hops.iter().enumerate() {
            if !self.builders.supports(hop.protocol) {
                return Err(AssemblyError::UnsupportedProtocol(hop.protocol));
            }
            if !hop.venue.fits(hop.protocol) {
                return Err(AssemblyError::MissingVenueAccounts { hop: index, protocol: hop.protocol });
            }
            if amount_in == 0 {
                return Err(AssemblyError::Quote { hop: index, source: QuoteError::InvalidAmount });
            }
            let (amount_out, minimum_amount_out) = match routing.legs.get(index) {
                Some(leg) => (leg.amount_out, leg.min_amount_out),
                None => {
                    let pool =
                        hop.pool_state.as_ref().ok_or(AssemblyError::MissingQuote { hop: index })?;
                    let quote = quote_exact_in(pool, amount_in, hop.direction, self.slippage_bps)
                        .map_err(|source| AssemblyError::Quote { hop: index, source })?;
                    (quote.expected_amount, quote.min_output_amount)
                }
            };
            plans.push(HopSwapParams { hop: *hop, user: *user, amount_in, minimum_amount_out });
            amount_in = amount_out;
        }
        Ok(plans)
    }

    async fn try_assemble(&self, plans: &[HopSwapParams], user: &Pubkey) -> Result<Transaction, AssemblyError> {
        let mut instructions =
            compute_budget_instructions(self.compute_unit_limit, self.compute_unit_price);
        for (index, params) in plans.iter().enumerate() {
            let builder = self
                .builders
                .get(params.hop.protocol)
                .ok_or(AssemblyError::UnsupportedProtocol(params.hop.protocol))?;
            let hop_instructions = builder
                .build_swap_instructions(params)
                .await
                .map_err(|source| AssemblyError::InstructionBuilder { hop: index, source })?;
            instructions.extend(hop_instructions);
        }

        let blockhash = self.ledger.latest_blockhash().await.map_err(AssemblyError::FreshnessToken)?;
        let message = Message::new_with_blockhash(&instructions, Some(user), &blockhash);
        Ok(Transaction::new_unsigned(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{
        fixtures::{market, mint},
        optimizer::simulate_route,
        types::DexRoute,
    };
    use crate::trading::common::retry::RecordingSleeper;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use solana_sdk::{hash::Hash, signature::Signature};
    use std::time::Duration;

    /// Fails `latest_blockhash` a fixed number of times, then succeeds.
    struct FlakyLedger {
        failures_left: Mutex<u32>,
    }

    #[async_trait]
    impl LedgerClient for FlakyLedger {
        async fn fetch_account(&self, _address: &Pubkey) -> anyhow::Result<Vec<u8>> {
            Err(anyhow!("not used"))
        }

        async fn latest_blockhash(&self) -> anyhow::Result<Hash> {
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(anyhow!("blockhash unavailable"));
            }
            Ok(Hash::new_from_array([7; 32]))
        }

        async fn submit(&self, _transaction: &Transaction) -> anyhow::Result<Signature> {
            Err(anyhow!("not used"))
        }

        async fn confirm(&self, _signature: &Signature) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn assembler(failures: u32, sleeper: Arc<RecordingSleeper>) -> TransactionAssembler {
        TransactionAssembler::new(
            Arc::new(FlakyLedger { failures_left: Mutex::new(failures) }),
            InstructionBuilderRegistry::with_default_builders(),
        )
        .with_sleeper(sleeper)
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(250)))
    }

    fn two_hop_route() -> RoutingInfo {
        let (a, b, c) = (mint(), mint(), mint());
        let x = market(a, b, 1_000_000, 2_000_000);
        let y = market(b, c, 2_000_000, 1_000_000);
        simulate_route(&[DexRoute::through(&x, &a).unwrap(), DexRoute::through(&y, &b).unwrap()], 10_000, 100)
            .unwrap()
    }

    #[test]
    fn test_plan_threads_amounts() {
        let route = two_hop_route();
        let assembler = assembler(0, Arc::new(RecordingSleeper::new()));
        let plans = assembler.plan_hops(&route, &Pubkey::new_unique()).unwrap();
        assert_eq!(plans[0].amount_in, 10_000);
        assert_eq!(plans[0].minimum_amount_out, 19_546);
        assert_eq!(plans[1].amount_in, 19_744);
        assert_eq!(plans[1].minimum_amount_out, route.min_output_amount);
    }

    #[test]
    fn test_plan_requotes_missing_legs() {
        let mut route = two_hop_route();
        let expected = route.legs.clone();
        route.legs.clear();
        let assembler = assembler(0, Arc::new(RecordingSleeper::new()));
        let plans = assembler.plan_hops(&route, &Pubkey::new_unique()).unwrap();
        assert_eq!(plans[1].amount_in, expected[0].amount_out);
        assert_eq!(plans[1].minimum_amount_out, expected[1].min_amount_out);

        route.hops[1].pool_state = None;
        assert!(matches!(
            assembler.plan_hops(&route, &Pubkey::new_unique()),
            Err(AssemblyError::MissingQuote { hop: 1 })
        ));
    }

    #[tokio::test]
    async fn test_retry_delays_are_linear() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let assembler = assembler(2, sleeper.clone());
        let user = Pubkey::new_unique();

        let transaction = assembler.build_swap_transaction(&two_hop_route(), &user, None).await.unwrap();
        assert_eq!(sleeper.delays(), vec![Duration::ZERO, Duration::from_millis(250)]);
        assert_eq!(transaction.message.account_keys[0], user);
        // two hops, each with an ATA creation and the swap
        assert_eq!(transaction.message.instructions.len(), 4);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let assembler = assembler(5, sleeper.clone());
        let err = assembler
            .build_swap_transaction(&two_hop_route(), &Pubkey::new_unique(), Some(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::SwapAssemblyFailed { attempts: 2, source: AssemblyError::FreshnessToken(_) }
        ));
        assert_eq!(sleeper.delays(), vec![Duration::ZERO]);
    }

    #[tokio::test]
    async fn test_structural_errors_are_not_retried() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let assembler = assembler(0, sleeper.clone());
        let mut route = two_hop_route();
        route.hops[0].protocol = crate::parser::types::DexProtocol::RaydiumClmm;

        let err = assembler
            .build_swap_transaction(&route, &Pubkey::new_unique(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::SwapAssemblyFailed { attempts: 1, source: AssemblyError::UnsupportedProtocol(_) }
        ));
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_missing_venue_accounts_fail_once() {
        use crate::{common::types::VenueAccounts, parser::types::DexProtocol};

        let sleeper = Arc::new(RecordingSleeper::new());
        let assembler = assembler(0, sleeper.clone());
        let mut route = two_hop_route();
        route.hops[1].protocol = DexProtocol::OrcaV2;
        assert_eq!(route.hops[1].venue, VenueAccounts::None);

        let err = assembler
            .build_swap_transaction(&route, &Pubkey::new_unique(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::SwapAssemblyFailed {
                attempts: 1,
                source: AssemblyError::MissingVenueAccounts { hop: 1, protocol: DexProtocol::OrcaV2 }
            }
        ));
        assert!(sleeper.delays().is_empty());

        route.hops[1].venue = VenueAccounts::OrcaV2 {
            pool_mint: Pubkey::new_unique(),
            fee_account: Pubkey::new_unique(),
        };
        assert!(assembler.build_swap_transaction(&route, &Pubkey::new_unique(), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_compute_budget_goes_first() {
        let assembler = assembler(0, Arc::new(RecordingSleeper::new()))
            .with_compute_budget(Some(300_000), Some(5_000));
        let transaction = assembler
            .build_swap_transaction(&two_hop_route(), &Pubkey::new_unique(), None)
            .await
            .unwrap();
        assert_eq!(transaction.message.instructions.len(), 6);
        let compute_budget_program = compute_budget_instructions(Some(1), None)[0].program_id;
        let first_program =
            transaction.message.account_keys[transaction.message.instructions[0].program_id_index as usize];
        assert_eq!(first_program, compute_budget_program);
    }
}
