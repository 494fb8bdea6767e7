//! 外部协作者接口
//!
//! The router never owns a transport. Everything that talks to the ledger,
//! pushes account changes, lists markets or signs transactions is injected
//! through these traits.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::common::types::MarketState;

/// Non-blocking RPC client used by the default [`LedgerClient`] implementation
pub type SolanaRpcClient = solana_client::nonblocking::rpc_client::RpcClient;

/// Request/response access to the ledger
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Raw account data
    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>>;
    /// Freshness token for a new transaction
    async fn latest_blockhash(&self) -> Result<Hash>;
    async fn submit(&self, transaction: &Transaction) -> Result<Signature>;
    /// `true` once the signature is confirmed
    async fn confirm(&self, signature: &Signature) -> Result<bool>;
}

#[async_trait]
impl LedgerClient for SolanaRpcClient {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>> {
        Ok(self.get_account(address).await?.data)
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.get_latest_blockhash().await?)
    }

    async fn submit(&self, transaction: &Transaction) -> Result<Signature> {
        Ok(self.send_transaction(transaction).await?)
    }

    async fn confirm(&self, signature: &Signature) -> Result<bool> {
        Ok(self.confirm_transaction(signature).await?)
    }
}

/// Ends one account subscription
#[async_trait]
pub trait SubscriptionHandle: Send + Sync {
    async fn unsubscribe(self: Box<Self>) -> Result<()>;
}

/// A live account subscription: raw account bytes plus the handle that ends it
pub struct AccountSubscription {
    pub updates: BoxStream<'static, Vec<u8>>,
    pub handle: Box<dyn SubscriptionHandle>,
}

/// Push source for account changes
#[async_trait]
pub trait AccountSubscriber: Send + Sync {
    async fn subscribe_account_changes(&self, address: &Pubkey) -> Result<AccountSubscription>;
}

/// Topology source for route discovery
#[async_trait]
pub trait MarketDirectory: Send + Sync {
    async fn markets_for_mint(&self, mint: &Pubkey) -> Result<Vec<MarketState>>;
}

/// Turns an assembled transaction into a submittable one
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;
    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<()>;
}

impl TransactionSigner for Keypair {
    fn pubkey(&self) -> Pubkey {
        Signer::pubkey(self)
    }

    fn sign_transaction(&self, transaction: &mut Transaction) -> Result<()> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_sign(&[self], blockhash)?;
        Ok(())
    }
}
