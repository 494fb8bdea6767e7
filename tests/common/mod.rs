//! 测试用内存实现
//!
//! In-memory ledger, account subscriber and market directory used by the
//! integration tests.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use sol_router_sdk::{
    AccountSubscriber, AccountSubscription, DexProtocol, LedgerClient, MarketDirectory, MarketMeta,
    MarketState, SubscriptionHandle, VenueAccounts,
    instruction::utils::{
        orca_v2_types::{self, SwapV1},
        raydium_amm_v4_types::{AmmInfo, Fees, pool_status},
    },
};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::{Account as TokenAccount, AccountState};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

// ==================== 账本 ====================

#[derive(Default)]
pub struct InMemoryLedger {
    pub accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    /// `latest_blockhash` fails this many times before succeeding
    pub blockhash_failures: Mutex<u32>,
    pub submitted: Mutex<Vec<Transaction>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().insert(address, data);
    }

    pub fn seed(&self, accounts: Vec<(Pubkey, Vec<u8>)>) {
        self.accounts.lock().extend(accounts);
    }

    pub fn fail_blockhash(&self, times: u32) {
        *self.blockhash_failures.lock() = times;
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>> {
        self.accounts.lock().get(address).cloned().ok_or_else(|| anyhow!("account {address} not found"))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        let mut failures = self.blockhash_failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(anyhow!("blockhash not available"));
        }
        Ok(Hash::new_from_array([9; 32]))
    }

    async fn submit(&self, transaction: &Transaction) -> Result<Signature> {
        let signature = transaction.signatures.first().copied().ok_or_else(|| anyhow!("unsigned"))?;
        if signature == Signature::default() {
            return Err(anyhow!("transaction is not signed"));
        }
        self.submitted.lock().push(transaction.clone());
        Ok(signature)
    }

    async fn confirm(&self, _signature: &Signature) -> Result<bool> {
        Ok(true)
    }
}

// ==================== 订阅 ====================

/// Account subscriber backed by unbounded channels
#[derive(Default)]
pub struct ChannelSubscriber {
    senders: Mutex<HashMap<Pubkey, UnboundedSender<Vec<u8>>>>,
    pub subscribe_calls: Mutex<u32>,
    pub unsubscribed: Arc<Mutex<Vec<Pubkey>>>,
    pub failing_unsubscribe: Arc<Mutex<HashSet<Pubkey>>>,
}

impl ChannelSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push raw account bytes to the subscriber of `address`.
    pub fn push(&self, address: &Pubkey, data: Vec<u8>) -> bool {
        self.senders.lock().get(address).is_some_and(|sender| sender.send(data).is_ok())
    }

    /// Push every buffer to its account's subscriber, in order.
    pub fn push_all(&self, accounts: Vec<(Pubkey, Vec<u8>)>) -> bool {
        accounts.into_iter().all(|(address, data)| self.push(&address, data))
    }

    pub fn fail_unsubscribe_for(&self, address: Pubkey) {
        self.failing_unsubscribe.lock().insert(address);
    }
}

struct ChannelHandle {
    address: Pubkey,
    unsubscribed: Arc<Mutex<Vec<Pubkey>>>,
    failing: Arc<Mutex<HashSet<Pubkey>>>,
}

#[async_trait]
impl SubscriptionHandle for ChannelHandle {
    async fn unsubscribe(self: Box<Self>) -> Result<()> {
        if self.failing.lock().contains(&self.address) {
            return Err(anyhow!("websocket already closed"));
        }
        self.unsubscribed.lock().push(self.address);
        Ok(())
    }
}

#[async_trait]
impl AccountSubscriber for ChannelSubscriber {
    async fn subscribe_account_changes(&self, address: &Pubkey) -> Result<AccountSubscription> {
        *self.subscribe_calls.lock() += 1;
        let (sender, receiver) = unbounded_channel();
        self.senders.lock().insert(*address, sender);
        let updates = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|data| (data, receiver))
        })
        .boxed();
        Ok(AccountSubscription {
            updates,
            handle: Box::new(ChannelHandle {
                address: *address,
                unsubscribed: self.unsubscribed.clone(),
                failing: self.failing_unsubscribe.clone(),
            }),
        })
    }
}

// ==================== 目录 ====================

/// Fixed topology; optionally slow to answer
#[derive(Default)]
pub struct StaticDirectory {
    pub markets: Vec<MarketState>,
    pub delay: Option<Duration>,
}

#[async_trait]
impl MarketDirectory for StaticDirectory {
    async fn markets_for_mint(&self, mint: &Pubkey) -> Result<Vec<MarketState>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .markets
            .iter()
            .filter(|market| market.base_mint == *mint || market.quote_mint == *mint)
            .copied()
            .collect())
    }
}

// ==================== 辅助函数 ====================

pub fn amm_v4_meta(base_mint: Pubkey, quote_mint: Pubkey) -> MarketMeta {
    MarketMeta {
        address: Pubkey::new_unique(),
        protocol: DexProtocol::RaydiumAmmV4,
        base_mint,
        quote_mint,
        base_vault: Pubkey::new_unique(),
        quote_vault: Pubkey::new_unique(),
        venue: VenueAccounts::None,
    }
}

pub fn orca_v2_meta(base_mint: Pubkey, quote_mint: Pubkey) -> MarketMeta {
    MarketMeta {
        address: Pubkey::new_unique(),
        protocol: DexProtocol::OrcaV2,
        base_mint,
        quote_mint,
        base_vault: Pubkey::new_unique(),
        quote_vault: Pubkey::new_unique(),
        venue: VenueAccounts::OrcaV2 {
            pool_mint: Pubkey::new_unique(),
            fee_account: Pubkey::new_unique(),
        },
    }
}

/// Initialized SPL token account holding `amount` of `mint`.
pub fn token_account(mint: Pubkey, amount: u64) -> Vec<u8> {
    let account = TokenAccount {
        mint,
        owner: Pubkey::new_unique(),
        amount,
        state: AccountState::Initialized,
        ..Default::default()
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    account.pack_into_slice(&mut data);
    data
}

/// Pool account bytes for `meta`, charging 0.3% of the input.
pub fn pool_account(meta: &MarketMeta) -> Vec<u8> {
    match (meta.protocol, meta.venue) {
        (DexProtocol::OrcaV2, VenueAccounts::OrcaV2 { pool_mint, fee_account }) => SwapV1 {
            version: orca_v2_types::CURRENT_VERSION,
            is_initialized: true,
            token_program_id: spl_token::ID,
            token_a: meta.base_vault,
            token_b: meta.quote_vault,
            pool_mint,
            token_a_mint: meta.base_mint,
            token_b_mint: meta.quote_mint,
            pool_fee_account: fee_account,
            fees: orca_v2_types::Fees {
                trade_fee_numerator: 20,
                trade_fee_denominator: 10_000,
                owner_trade_fee_numerator: 10,
                owner_trade_fee_denominator: 10_000,
                ..Default::default()
            },
            curve_type: orca_v2_types::curve_type::CONSTANT_PRODUCT,
            ..Default::default()
        }
        .to_bytes(),
        _ => AmmInfo {
            status: pool_status::SWAP_ONLY,
            fees: Fees {
                swap_fee_numerator: 30,
                swap_fee_denominator: 10_000,
                pnl_numerator: 0,
                pnl_denominator: 100,
                ..Default::default()
            },
            token_coin: meta.base_vault,
            token_pc: meta.quote_vault,
            coin_mint: meta.base_mint,
            pc_mint: meta.quote_mint,
            ..Default::default()
        }
        .to_bytes(),
    }
}

/// Pool and vault accounts of `meta` holding the given reserves.
pub fn market_accounts(meta: &MarketMeta, base_reserve: u64, quote_reserve: u64) -> Vec<(Pubkey, Vec<u8>)> {
    vec![
        (meta.address, pool_account(meta)),
        (meta.base_vault, token_account(meta.base_mint, base_reserve)),
        (meta.quote_vault, token_account(meta.quote_mint, quote_reserve)),
    ]
}

/// Both vault accounts of `meta`, for pushing a reserve change.
pub fn vault_accounts(meta: &MarketMeta, base_reserve: u64, quote_reserve: u64) -> Vec<(Pubkey, Vec<u8>)> {
    market_accounts(meta, base_reserve, quote_reserve).split_off(1)
}

/// Poll `condition` until it holds or a second has passed.
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
