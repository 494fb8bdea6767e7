//! 错误类型定义
//!
//! Decode and protocol-support errors are structural and never retried.
//! Quote errors drop the enclosing path. Assembly errors are retried when transient.

use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

use crate::parser::types::DexProtocol;

/// Pool account decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{protocol} account has wrong length: expected {expected} bytes, got {actual}")]
    WrongLength { protocol: DexProtocol, expected: usize, actual: usize },
    #[error("{protocol} account has invalid field `{field}`: {reason}")]
    InvalidField { protocol: DexProtocol, field: &'static str, reason: String },
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}

/// Quote-time errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("market has no liquidity on one side")]
    IlliquidMarket,
    #[error("input amount must be greater than zero")]
    InvalidAmount,
    #[error("slippage {0} bps exceeds 10000 bps")]
    InvalidSlippage(u64),
    #[error("route has no hops")]
    EmptyRoute,
    #[error("hop has no pool snapshot")]
    MissingPoolState,
    #[error("route produces no output")]
    ZeroOutput,
}

/// Errors raised while assembling one swap transaction attempt
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("route has no hops")]
    EmptyRoute,
    #[error("no quote or pool snapshot for hop {hop}")]
    MissingQuote { hop: usize },
    #[error("hop {hop} quote failed: {source}")]
    Quote { hop: usize, source: QuoteError },
    #[error("no instruction builder registered for {0}")]
    UnsupportedProtocol(DexProtocol),
    #[error("hop {hop} lacks the {protocol} accounts its swap instruction needs")]
    MissingVenueAccounts { hop: usize, protocol: DexProtocol },
    #[error("failed to fetch recent blockhash: {0}")]
    FreshnessToken(anyhow::Error),
    #[error("instruction builder failed for hop {hop}: {source}")]
    InstructionBuilder { hop: usize, source: anyhow::Error },
}

impl AssemblyError {
    /// Only network-facing failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, AssemblyError::FreshnessToken(_) | AssemblyError::InstructionBuilder { .. })
    }
}

/// A single failed unsubscribe collected by `cleanup`
#[derive(Debug, thiserror::Error)]
#[error("failed to unsubscribe market {address}: {source}")]
pub struct CleanupError {
    pub address: Pubkey,
    pub source: anyhow::Error,
}

/// Router-level errors returned by the public operations
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("decode failed: {0}")]
    Decode(DecodeError),
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("quote failed: {0}")]
    Quote(#[from] QuoteError),
    #[error("max_hops must be at least 1")]
    InvalidMaxHops,
    #[error("no route found from {input_mint} to {output_mint}")]
    NoRouteFound { input_mint: Pubkey, output_mint: Pubkey },
    #[error("no tracked market uses account {0}")]
    UnknownMarket(Pubkey),
    #[error("market directory lookup failed for {mint}: {source}")]
    Directory { mint: Pubkey, source: anyhow::Error },
    #[error("subscription failed for {address}: {source}")]
    Subscription { address: Pubkey, source: anyhow::Error },
    #[error("ledger call failed: {0}")]
    Ledger(anyhow::Error),
    #[error("signing failed: {0}")]
    Signing(anyhow::Error),
    #[error("swap assembly failed after {attempts} attempt(s): {source}")]
    SwapAssemblyFailed {
        attempts: u32,
        #[source]
        source: AssemblyError,
    },
    #[error("invalid split: {0}")]
    InvalidSplit(String),
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl From<DecodeError> for RouterError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedProtocol(tag) => RouterError::UnsupportedProtocol(tag),
            other => RouterError::Decode(other),
        }
    }
}
