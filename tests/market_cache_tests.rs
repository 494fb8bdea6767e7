//! 市场缓存集成测试
//!
//! 运行测试:
//!     cargo test --test market_cache_tests -- --nocapture

mod common;

use common::{
    ChannelSubscriber, InMemoryLedger, amm_v4_meta, market_accounts, pool_account, token_account,
    wait_until,
};
use parking_lot::Mutex;
use sol_router_sdk::{MarketCache, RouterError};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

#[tokio::test]
async fn test_pushed_updates_reach_cache_and_observers() {
    let subscriber = Arc::new(ChannelSubscriber::new());
    let cache = Arc::new(MarketCache::new(subscriber.clone()));
    let meta = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let _handle = cache.register_observer(move |state| {
        recorder.lock().push((state.pool_state.reserve_base, state.pool_state.reserve_quote));
    });

    cache.subscribe(meta).await.unwrap();
    assert!(subscriber.push_all(market_accounts(&meta, 1_000, 2_000)));
    assert!(wait_until(|| seen.lock().len() == 1).await);

    assert!(subscriber.push(&meta.base_vault, token_account(meta.base_mint, 1_500)));
    assert!(wait_until(|| seen.lock().len() == 2).await);
    assert!(subscriber.push(&meta.quote_vault, token_account(meta.quote_mint, 2_500)));
    assert!(wait_until(|| seen.lock().len() == 3).await);

    assert_eq!(*seen.lock(), vec![(1_000, 2_000), (1_500, 2_000), (1_500, 2_500)]);
    let state = cache.get(&meta.address).unwrap();
    assert_eq!(state.pool_state.trade_fee.numerator, 30);
}

#[tokio::test]
async fn test_undecodable_push_is_dropped() {
    let subscriber = Arc::new(ChannelSubscriber::new());
    let cache = Arc::new(MarketCache::new(subscriber.clone()));
    let meta = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());
    cache.subscribe(meta).await.unwrap();

    subscriber.push(&meta.address, vec![1, 2, 3]);
    subscriber.push_all(market_accounts(&meta, 10, 20));
    assert!(wait_until(|| cache.get(&meta.address).is_some()).await);
    assert_eq!(cache.get(&meta.address).unwrap().pool_state.reserve_base, 10);
}

#[tokio::test]
async fn test_subscribe_twice_is_noop() {
    let subscriber = Arc::new(ChannelSubscriber::new());
    let cache = Arc::new(MarketCache::new(subscriber.clone()));
    let meta = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());

    cache.subscribe(meta).await.unwrap();
    cache.subscribe(meta).await.unwrap();
    // pool and both vaults
    assert_eq!(*subscriber.subscribe_calls.lock(), 3);
    assert_eq!(cache.subscription_count(), 3);
    assert!(cache.is_subscribed(&meta.quote_vault));
}

#[tokio::test]
async fn test_load_market_fetches_every_component() {
    let cache = MarketCache::without_subscriber();
    let ledger = InMemoryLedger::new();
    let meta = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());

    assert!(matches!(cache.load_market(&ledger, meta).await, Err(RouterError::Ledger(_))));

    // pool alone is not enough
    ledger.set_account(meta.address, pool_account(&meta));
    assert!(matches!(cache.load_market(&ledger, meta).await, Err(RouterError::Ledger(_))));
    assert!(cache.get(&meta.address).is_none());

    ledger.seed(market_accounts(&meta, 4_000, 8_000));
    let state = cache.load_market(&ledger, meta).await.unwrap();
    assert_eq!(state.pool_state.reserve_base, 4_000);
    assert_eq!(state.pool_state.reserve_quote, 8_000);
    assert_eq!(cache.markets_for(&meta.quote_mint).len(), 1);
}

#[tokio::test]
async fn test_cleanup_collects_failures_and_is_idempotent() {
    let subscriber = Arc::new(ChannelSubscriber::new());
    let cache = Arc::new(MarketCache::new(subscriber.clone()));
    let healthy = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());
    let broken = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());
    subscriber.fail_unsubscribe_for(broken.address);

    cache.subscribe(healthy).await.unwrap();
    cache.subscribe(broken).await.unwrap();
    subscriber.push_all(market_accounts(&healthy, 1, 1));
    assert!(wait_until(|| cache.get(&healthy.address).is_some()).await);
    let handle = cache.register_observer(|_| {});

    let errors = cache.cleanup().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].address, broken.address);
    let unsubscribed = subscriber.unsubscribed.lock().clone();
    assert_eq!(unsubscribed.len(), 5);
    for account in [healthy.address, healthy.base_vault, healthy.quote_vault, broken.base_vault] {
        assert!(unsubscribed.contains(&account));
    }
    assert_eq!(cache.subscription_count(), 0);
    assert_eq!(cache.observer_count(), 0);
    assert!(cache.is_empty());
    assert!(!handle.deregister());

    assert!(cache.cleanup().await.is_empty());
    assert_eq!(subscriber.unsubscribed.lock().len(), 5);
}

#[tokio::test]
async fn test_deregistered_observer_stops_receiving() {
    let subscriber = Arc::new(ChannelSubscriber::new());
    let cache = Arc::new(MarketCache::new(subscriber.clone()));
    let meta = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());
    cache.subscribe(meta).await.unwrap();

    let first = Arc::new(Mutex::new(0u32));
    let second = Arc::new(Mutex::new(0u32));
    let (a, b) = (first.clone(), second.clone());
    let first_handle = cache.register_observer(move |_| *a.lock() += 1);
    let _second_handle = cache.register_observer(move |_| *b.lock() += 1);

    subscriber.push_all(market_accounts(&meta, 1, 1));
    assert!(wait_until(|| *second.lock() == 1).await);

    assert!(first_handle.deregister());
    subscriber.push(&meta.base_vault, token_account(meta.base_mint, 2));
    assert!(wait_until(|| *second.lock() == 2).await);
    assert_eq!(*first.lock(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_of_one_market_are_serialized() {
    const UPDATES: u64 = 16;
    let cache = Arc::new(MarketCache::without_subscriber());
    let ledger = InMemoryLedger::new();
    let meta = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());
    ledger.seed(market_accounts(&meta, 1_000, 1_000));
    cache.load_market(&ledger, meta).await.unwrap();

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let (inside, max, count) = (active.clone(), peak.clone(), calls.clone());
    let _handle = cache.register_observer(move |state| {
        if state.address != meta.address {
            return;
        }
        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        inside.fetch_sub(1, Ordering::SeqCst);
        count.fetch_add(1, Ordering::SeqCst);
    });

    let mut updates = Vec::new();
    for i in 1..=UPDATES {
        let cache = cache.clone();
        let vault = meta.base_vault;
        let data = token_account(meta.base_mint, 1_000 + i);
        updates.push(tokio::task::spawn_blocking(move || {
            cache.on_update(&data, &vault).map(|states| states.len())
        }));
    }
    for result in futures::future::join_all(updates).await {
        assert_eq!(result.unwrap().unwrap(), 1);
    }

    assert_eq!(calls.load(Ordering::SeqCst), UPDATES as usize);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert!(cache.get(&meta.address).unwrap().pool_state.reserve_base > 1_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_updates_of_different_markets_do_not_block_each_other() {
    let cache = Arc::new(MarketCache::without_subscriber());
    let ledger = InMemoryLedger::new();
    let slow = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());
    let fast = amm_v4_meta(Pubkey::new_unique(), Pubkey::new_unique());
    ledger.seed(market_accounts(&slow, 1_000, 1_000));
    ledger.seed(market_accounts(&fast, 1_000, 1_000));
    cache.load_market(&ledger, slow).await.unwrap();
    cache.load_market(&ledger, fast).await.unwrap();

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (entered_tx, release_tx, release_rx) =
        (Mutex::new(entered_tx), Mutex::new(release_tx), Mutex::new(release_rx));
    let released = Arc::new(AtomicBool::new(false));
    let flag = released.clone();
    let _handle = cache.register_observer(move |state| {
        if state.address == slow.address {
            let _ = entered_tx.lock().send(());
            // holds the slow market's lock until the fast market has been published
            let ok = release_rx.lock().recv_timeout(Duration::from_secs(2)).is_ok();
            flag.store(ok, Ordering::SeqCst);
        } else if state.address == fast.address {
            let _ = release_tx.lock().send(());
        }
    });

    let slow_cache = cache.clone();
    let slow_update = tokio::task::spawn_blocking(move || {
        slow_cache.on_update(&token_account(slow.base_mint, 2_000), &slow.base_vault)
    });
    let entered =
        tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    assert!(entered.await.unwrap());

    cache.on_update(&token_account(fast.base_mint, 3_000), &fast.base_vault).unwrap();
    slow_update.await.unwrap().unwrap();

    assert!(released.load(Ordering::SeqCst));
    assert_eq!(cache.get(&fast.address).unwrap().pool_state.reserve_base, 3_000);
    assert_eq!(cache.get(&slow.address).unwrap().pool_state.reserve_base, 2_000);
}
