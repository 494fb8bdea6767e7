//! 池状态解析的核心数据类型定义

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::errors::DecodeError;
use crate::constants::platforms;

/// Supported AMM venues
///
/// Closed set: adding a venue means adding a variant, which makes every
/// `match` over decoders and instruction builders fail to compile until the
/// new venue is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DexProtocol {
    RaydiumAmmV4,
    RaydiumCpmm,
    /// Concentrated liquidity; known to the router but has no constant-product decoder.
    RaydiumClmm,
    OrcaV2,
}

impl DexProtocol {
    pub const ALL: [DexProtocol; 4] = [
        DexProtocol::RaydiumAmmV4,
        DexProtocol::RaydiumCpmm,
        DexProtocol::RaydiumClmm,
        DexProtocol::OrcaV2,
    ];

    /// 协议标识字符串
    pub fn tag(&self) -> &'static str {
        match self {
            DexProtocol::RaydiumAmmV4 => platforms::RAYDIUM_AMM_V4,
            DexProtocol::RaydiumCpmm => platforms::RAYDIUM_CPMM,
            DexProtocol::RaydiumClmm => platforms::RAYDIUM_CLMM,
            DexProtocol::OrcaV2 => platforms::ORCA_V2,
        }
    }
}

impl fmt::Display for DexProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DexProtocol {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DexProtocol::ALL
            .into_iter()
            .find(|protocol| protocol.tag() == s)
            .ok_or_else(|| DecodeError::UnsupportedProtocol(s.to_string()))
    }
}

/// Exact fee fraction `numerator / denominator`
///
/// Kept in the venue's own on-chain scale so quoting never gains precision
/// the program itself does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FeeRate {
    pub numerator: u64,
    pub denominator: u64,
}

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate { numerator: 0, denominator: 1 };

    /// Returns `None` unless `0 <= numerator / denominator < 1`.
    pub fn new(numerator: u64, denominator: u64) -> Option<Self> {
        (denominator > 0 && numerator < denominator).then_some(Self { numerator, denominator })
    }

    /// Fee stored in basis-like units with the given scale (e.g. 25 / 10_000).
    pub fn from_scaled(units: u64, scale: u64) -> Option<Self> {
        Self::new(units, scale)
    }

    pub fn as_f64(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// `amount * (1 - fee)`, floored.
    pub fn apply_to(&self, amount: u64) -> u128 {
        let den = self.denominator.max(1) as u128;
        amount as u128 * (den - self.numerator.min(self.denominator) as u128) / den
    }

    /// `amount * fee`, floored.
    pub fn fee_on(&self, amount: u64) -> u128 {
        let den = self.denominator.max(1) as u128;
        amount as u128 * self.numerator as u128 / den
    }
}

/// Uniform constant-product pool state decoded from any supported venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolState {
    pub reserve_base: u64,
    pub reserve_quote: u64,
    /// Unix seconds of the last on-chain update
    pub last_update_timestamp: u64,
    pub trade_fee: FeeRate,
    pub owner_fee: FeeRate,
}

impl PoolState {
    /// The constant-product invariant `k`
    pub fn invariant(&self) -> u128 {
        self.reserve_base as u128 * self.reserve_quote as u128
    }

    /// `(reserve_in, reserve_out)` for a trade in the given direction.
    pub fn reserves_for(&self, direction: SwapDirection) -> (u64, u64) {
        match direction {
            SwapDirection::BaseToQuote => (self.reserve_base, self.reserve_quote),
            SwapDirection::QuoteToBase => (self.reserve_quote, self.reserve_base),
        }
    }
}

/// 交易方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    /// 卖出 base，得到 quote
    BaseToQuote,
    /// 卖出 quote，得到 base
    QuoteToBase,
}
