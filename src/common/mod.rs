pub mod errors;
pub mod fast_fn;
pub mod ledger;
pub mod market_cache;
pub mod types;

pub use errors::*;
pub use ledger::{
    AccountSubscriber, AccountSubscription, LedgerClient, MarketDirectory, SolanaRpcClient,
    SubscriptionHandle, TransactionSigner,
};
pub use market_cache::{MarketCache, MarketObserver, ObserverHandle};
pub use types::*;
