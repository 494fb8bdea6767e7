//! 市场状态缓存
//!
//! Holds the latest decoded state of every tracked market, keyed by market
//! address. Entries are replaced as whole `Arc` snapshots, so a reader sees
//! either the previous or the new state of a market, never a mix.
//!
//! A market's state is decoded from several accounts (pool, both vaults and,
//! for Raydium CPMM, the shared `AmmConfig`). The latest buffer of each is
//! kept per market; a push for any of them re-decodes every market using that
//! account once all of its buffers have arrived.
//!
//! Decode, upsert and observer notification for one market run under that
//! market's lock; two updates of the same market never interleave their
//! notifications, while different markets update independently.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::{StreamExt, future::try_join_all};
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    common::{
        errors::{CleanupError, DecodeError, RouterError},
        ledger::{AccountSubscriber, LedgerClient, MarketDirectory, SubscriptionHandle},
        types::{AccountRole, MarketMeta, MarketState, VenueAccounts},
    },
    parser::{RawMarketAccounts, decode_pool_account, decode_pool_state},
};

/// Callback invoked with every new market state
pub type MarketObserver = Arc<dyn Fn(&MarketState) + Send + Sync>;

const INITIAL_CAPACITY: usize = 1_024;

// ==================== 观察者 ====================

#[derive(Default)]
struct ObserverRegistry {
    next_id: AtomicU64,
    observers: ArcSwap<Vec<(u64, MarketObserver)>>,
}

impl ObserverRegistry {
    fn register(self: &Arc<Self>, observer: MarketObserver) -> ObserverHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push((id, observer.clone()));
            next
        });
        ObserverHandle { id, registry: Arc::downgrade(self) }
    }

    fn remove(&self, id: u64) -> bool {
        let mut removed = false;
        self.observers.rcu(|current| {
            removed = current.iter().any(|(observer_id, _)| *observer_id == id);
            current.iter().filter(|(observer_id, _)| *observer_id != id).cloned().collect::<Vec<_>>()
        });
        removed
    }

    fn notify(&self, state: &MarketState) {
        let observers = self.observers.load_full();
        for (_, observer) in observers.iter() {
            observer(state);
        }
    }

    fn len(&self) -> usize {
        self.observers.load().len()
    }

    fn clear(&self) {
        self.observers.store(Arc::new(Vec::new()));
    }
}

/// Capability to remove one registered observer
///
/// Consumed by [`ObserverHandle::deregister`], so an observer can only be
/// removed once. Dropping the handle leaves the observer registered.
#[must_use = "dropping the handle makes the observer impossible to deregister"]
pub struct ObserverHandle {
    id: u64,
    registry: Weak<ObserverRegistry>,
}

impl ObserverHandle {
    /// Returns `false` if the observer was already cleared by `cleanup`.
    pub fn deregister(self) -> bool {
        self.registry.upgrade().is_some_and(|registry| registry.remove(self.id))
    }
}

// ==================== 缓存 ====================

struct ActiveSubscription {
    handle: Box<dyn SubscriptionHandle>,
    task: JoinHandle<()>,
}

/// Latest raw buffers of one market's component accounts
#[derive(Clone, Default)]
struct MarketParts {
    pool: Option<Vec<u8>>,
    base_vault: Option<Vec<u8>>,
    quote_vault: Option<Vec<u8>>,
    fee_config: Option<Vec<u8>>,
    observed_at: u64,
}

impl MarketParts {
    fn slot(&mut self, role: AccountRole) -> &mut Option<Vec<u8>> {
        match role {
            AccountRole::Pool => &mut self.pool,
            AccountRole::BaseVault => &mut self.base_vault,
            AccountRole::QuoteVault => &mut self.quote_vault,
            AccountRole::FeeConfig => &mut self.fee_config,
        }
    }

    /// `None` until every account the venue needs has been seen.
    fn raw(&self, meta: &MarketMeta) -> Option<RawMarketAccounts<'_>> {
        let fee_config = match meta.venue {
            VenueAccounts::RaydiumCpmm { .. } => Some(self.fee_config.as_deref()?),
            _ => None,
        };
        Some(RawMarketAccounts {
            pool: self.pool.as_deref()?,
            base_vault: self.base_vault.as_deref()?,
            quote_vault: self.quote_vault.as_deref()?,
            fee_config,
            observed_at: self.observed_at,
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_secs()).unwrap_or(0)
}

pub struct MarketCache {
    subscriber: Option<Arc<dyn AccountSubscriber>>,
    markets: DashMap<Pubkey, Arc<MarketState>>,
    metas: DashMap<Pubkey, MarketMeta>,
    /// mint → markets trading it
    mint_index: DashMap<Pubkey, Vec<Pubkey>>,
    /// account → (market, role) pairs reading it
    account_index: DashMap<Pubkey, Vec<(Pubkey, AccountRole)>>,
    parts: DashMap<Pubkey, Arc<Mutex<MarketParts>>>,
    /// keyed by subscribed account, not by market
    subscriptions: Mutex<HashMap<Pubkey, ActiveSubscription>>,
    observers: Arc<ObserverRegistry>,
}

impl MarketCache {
    pub fn new(subscriber: Arc<dyn AccountSubscriber>) -> Self {
        Self::build(Some(subscriber))
    }

    /// Cache fed only through `upsert` / `on_update` / `load_market`.
    pub fn without_subscriber() -> Self {
        Self::build(None)
    }

    fn build(subscriber: Option<Arc<dyn AccountSubscriber>>) -> Self {
        Self {
            subscriber,
            markets: DashMap::with_capacity(INITIAL_CAPACITY),
            metas: DashMap::with_capacity(INITIAL_CAPACITY),
            mint_index: DashMap::with_capacity(INITIAL_CAPACITY),
            account_index: DashMap::with_capacity(INITIAL_CAPACITY),
            parts: DashMap::with_capacity(INITIAL_CAPACITY),
            subscriptions: Mutex::new(HashMap::new()),
            observers: Arc::new(ObserverRegistry::default()),
        }
    }

    /// Copy of the current state of `address`.
    pub fn get(&self, address: &Pubkey) -> Option<MarketState> {
        self.markets.get(address).map(|state| **state)
    }

    /// Shared snapshot of the current state of `address`.
    pub fn snapshot(&self, address: &Pubkey) -> Option<Arc<MarketState>> {
        self.markets.get(address).map(|state| state.clone())
    }

    /// Markets trading `mint` on either side.
    pub fn markets_for(&self, mint: &Pubkey) -> Vec<MarketState> {
        let Some(addresses) = self.mint_index.get(mint).map(|entry| entry.clone()) else {
            return Vec::new();
        };
        addresses.iter().filter_map(|address| self.get(address)).collect()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Number of subscribed accounts (each market subscribes to all its components).
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_subscribed(&self, account: &Pubkey) -> bool {
        self.subscriptions.lock().contains_key(account)
    }

    /// Track `meta` and index the accounts its state is decoded from.
    fn register(&self, meta: MarketMeta) {
        self.metas.insert(meta.address, meta);
        for (account, role) in meta.component_accounts() {
            let mut users = self.account_index.entry(account).or_default();
            if !users.contains(&(meta.address, role)) {
                users.push((meta.address, role));
            }
        }
    }

    fn parts_cell(&self, address: Pubkey) -> Arc<Mutex<MarketParts>> {
        self.parts.entry(address).or_default().clone()
    }

    /// Replace the state of `state.address` and notify every observer.
    pub fn upsert(&self, state: MarketState) {
        let cell = self.parts_cell(state.address);
        let _guard = cell.lock();
        self.publish(state);
    }

    /// Caller holds the market's parts lock.
    fn publish(&self, state: MarketState) {
        let address = state.address;
        let previous = self.markets.insert(address, Arc::new(state));
        if previous.is_none() {
            if !self.metas.contains_key(&address) {
                self.register(state.meta());
            }
            self.index_mint(state.base_mint, address);
            self.index_mint(state.quote_mint, address);
            debug!(market = %address, protocol = %state.protocol, "market added to cache");
        }
        self.observers.notify(&state);
    }

    fn index_mint(&self, mint: Pubkey, address: Pubkey) {
        let mut markets = self.mint_index.entry(mint).or_default();
        if !markets.contains(&address) {
            markets.push(address);
        }
    }

    /// Store `updates` for `meta` and re-decode once every component is known.
    ///
    /// A buffer that fails to decode leaves the stored buffers and the cached
    /// state as they were.
    fn apply(
        &self,
        meta: &MarketMeta,
        updates: &[(AccountRole, &[u8])],
    ) -> Result<Option<MarketState>, RouterError> {
        for (role, data) in updates {
            if *role != AccountRole::Pool {
                continue;
            }
            let pool = decode_pool_account(meta.protocol, data)?;
            if (pool.base_vault, pool.quote_vault) != (meta.base_vault, meta.quote_vault) {
                return Err(RouterError::Decode(DecodeError::InvalidField {
                    protocol: meta.protocol,
                    field: "vaults",
                    reason: format!("pool account does not use the vaults tracked for {}", meta.address),
                }));
            }
        }

        let cell = self.parts_cell(meta.address);
        let mut parts = cell.lock();
        let previous = parts.clone();
        for (role, data) in updates {
            *parts.slot(*role) = Some(data.to_vec());
        }
        parts.observed_at = unix_now();

        let decoded = match parts.raw(meta) {
            Some(raw) => decode_pool_state(meta.protocol, &raw),
            None => return Ok(None),
        };
        match decoded {
            Ok(pool_state) => {
                let state = meta.with_pool_state(pool_state);
                self.publish(state);
                Ok(Some(state))
            }
            Err(e) => {
                *parts = previous;
                Err(e.into())
            }
        }
    }

    /// Decode a pushed account buffer and upsert every market reading it.
    ///
    /// Returns the markets whose state changed; markets still waiting for one
    /// of their other accounts are left out.
    pub fn on_update(&self, data: &[u8], account: &Pubkey) -> Result<Vec<MarketState>, RouterError> {
        let users = self
            .account_index
            .get(account)
            .map(|users| users.clone())
            .ok_or(RouterError::UnknownMarket(*account))?;

        let mut updated = Vec::with_capacity(users.len());
        let mut first_error = None;
        for (market, role) in users {
            let Some(meta) = self.metas.get(&market).map(|meta| *meta) else {
                continue;
            };
            match self.apply(&meta, &[(role, data)]) {
                Ok(Some(state)) => updated.push(state),
                Ok(None) => {}
                Err(e) => {
                    debug!(market = %market, account = %account, error = %e, "account update rejected");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(updated),
        }
    }

    /// Fetch every component account once and cache the decoded market.
    pub async fn load_market(
        &self,
        ledger: &dyn LedgerClient,
        meta: MarketMeta,
    ) -> Result<MarketState, RouterError> {
        self.register(meta);
        let components = meta.component_accounts();
        let buffers = try_join_all(
            components.iter().map(|(account, _)| ledger.fetch_account(account)),
        )
        .await
        .map_err(RouterError::Ledger)?;

        let updates: Vec<(AccountRole, &[u8])> = components
            .iter()
            .zip(buffers.iter())
            .map(|((_, role), data)| (*role, data.as_slice()))
            .collect();
        self.apply(&meta, &updates)?.ok_or(RouterError::UnknownMarket(meta.address))
    }

    /// Start receiving pushed updates for every account of a market.
    ///
    /// Accounts already subscribed, by this market or by another one sharing
    /// them, are skipped, so subscribing twice is a no-op.
    pub async fn subscribe(self: &Arc<Self>, meta: MarketMeta) -> Result<(), RouterError> {
        let subscriber = self.subscriber.clone().ok_or_else(|| RouterError::Subscription {
            address: meta.address,
            source: anyhow::anyhow!("no account subscriber configured"),
        })?;
        self.register(meta);

        let mut added = 0usize;
        for (account, role) in meta.component_accounts() {
            if self.is_subscribed(&account) {
                continue;
            }
            if self.subscribe_account(subscriber.as_ref(), account).await? {
                debug!(market = %meta.address, account = %account, role = ?role, "account subscribed");
                added += 1;
            }
        }
        if added > 0 {
            info!(market = %meta.address, protocol = %meta.protocol, accounts = added, "subscribed to market");
        }
        Ok(())
    }

    /// `false` if a concurrent subscribe won the race for `account`.
    async fn subscribe_account(
        self: &Arc<Self>,
        subscriber: &dyn AccountSubscriber,
        account: Pubkey,
    ) -> Result<bool, RouterError> {
        let subscription = subscriber
            .subscribe_account_changes(&account)
            .await
            .map_err(|source| RouterError::Subscription { address: account, source })?;

        let cache: Weak<MarketCache> = Arc::downgrade(self);
        let mut updates = subscription.updates;
        let task = tokio::spawn(async move {
            while let Some(data) = updates.next().await {
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                if let Err(e) = cache.on_update(&data, &account) {
                    warn!(account = %account, error = %e, "dropping account update");
                }
            }
            debug!(account = %account, "account update stream ended");
        });

        let duplicate = {
            let mut subscriptions = self.subscriptions.lock();
            match subscriptions.entry(account) {
                Entry::Occupied(_) => Some(ActiveSubscription { handle: subscription.handle, task }),
                Entry::Vacant(slot) => {
                    slot.insert(ActiveSubscription { handle: subscription.handle, task });
                    None
                }
            }
        };
        if let Some(duplicate) = duplicate {
            duplicate.task.abort();
            if let Err(e) = duplicate.handle.unsubscribe().await {
                warn!(account = %account, error = %e, "failed to drop duplicate subscription");
            }
            return Ok(false);
        }
        Ok(true)
    }

    pub fn register_observer<F>(&self, observer: F) -> ObserverHandle
    where
        F: Fn(&MarketState) + Send + Sync + 'static,
    {
        self.observers.register(Arc::new(observer))
    }

    /// Unsubscribe everything, clear observers and drop all cached markets.
    ///
    /// Every subscription is attempted even if earlier ones fail; failures are
    /// returned rather than aborting the cleanup.
    pub async fn cleanup(&self) -> Vec<CleanupError> {
        let drained: Vec<(Pubkey, ActiveSubscription)> =
            self.subscriptions.lock().drain().collect();

        let mut errors = Vec::new();
        let total = drained.len();
        for (address, subscription) in drained {
            subscription.task.abort();
            if let Err(source) = subscription.handle.unsubscribe().await {
                warn!(account = %address, error = %source, "unsubscribe failed");
                errors.push(CleanupError { address, source });
            }
        }

        self.observers.clear();
        self.markets.clear();
        self.metas.clear();
        self.mint_index.clear();
        self.account_index.clear();
        self.parts.clear();

        if total > 0 || !errors.is_empty() {
            info!(subscriptions = total, failures = errors.len(), "market cache cleaned up");
        }
        errors
    }
}

#[async_trait]
impl MarketDirectory for MarketCache {
    async fn markets_for_mint(&self, mint: &Pubkey) -> anyhow::Result<Vec<MarketState>> {
        Ok(self.markets_for(mint))
    }
}
