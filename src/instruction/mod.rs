//! 各协议 swap 指令构建
//!
//! One [`SwapInstructionBuilder`] per venue, looked up by [`DexProtocol`]
//! through the [`InstructionBuilderRegistry`].

pub mod orca_v2;
pub mod raydium_amm_v4;
pub mod raydium_cpmm;
pub mod utils;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    common::fast_fn::create_associated_token_account_idempotent_fast,
    constants::TOKEN_PROGRAM,
    parser::types::DexProtocol,
    routing::types::DexRoute,
};

pub use orca_v2::OrcaV2InstructionBuilder;
pub use raydium_amm_v4::RaydiumAmmV4InstructionBuilder;
pub use raydium_cpmm::RaydiumCpmmInstructionBuilder;

/// Everything a venue builder needs for one hop
#[derive(Debug, Clone, Copy)]
pub struct HopSwapParams {
    pub hop: DexRoute,
    /// Wallet that pays, signs and owns the token accounts
    pub user: Pubkey,
    pub amount_in: u64,
    pub minimum_amount_out: u64,
}

impl HopSwapParams {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.amount_in == 0 {
            return Err(anyhow!("Amount cannot be zero"));
        }
        Ok(())
    }
}

#[async_trait]
pub trait SwapInstructionBuilder: Send + Sync {
    fn protocol(&self) -> DexProtocol;

    async fn build_swap_instructions(&self, params: &HopSwapParams) -> Result<Vec<Instruction>>;
}

/// Idempotent ATA creation for the hop's output mint.
pub(crate) fn create_output_ata(params: &HopSwapParams) -> Instruction {
    create_associated_token_account_idempotent_fast(
        &params.user,
        &params.user,
        &params.hop.output_mint,
        &TOKEN_PROGRAM,
    )
}

#[derive(Clone, Default)]
pub struct InstructionBuilderRegistry {
    builders: HashMap<DexProtocol, Arc<dyn SwapInstructionBuilder>>,
}

impl InstructionBuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builders for every constant-product venue.
    pub fn with_default_builders() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RaydiumAmmV4InstructionBuilder));
        registry.register(Arc::new(RaydiumCpmmInstructionBuilder));
        registry.register(Arc::new(OrcaV2InstructionBuilder));
        registry
    }

    /// Replaces any builder already registered for the same protocol.
    pub fn register(&mut self, builder: Arc<dyn SwapInstructionBuilder>) {
        self.builders.insert(builder.protocol(), builder);
    }

    pub fn get(&self, protocol: DexProtocol) -> Option<Arc<dyn SwapInstructionBuilder>> {
        self.builders.get(&protocol).cloned()
    }

    pub fn supports(&self, protocol: DexProtocol) -> bool {
        self.builders.contains_key(&protocol)
    }
}
