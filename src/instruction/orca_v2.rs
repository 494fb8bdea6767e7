use crate::{
    common::{fast_fn::get_associated_token_address_with_program_id_fast, types::VenueAccounts},
    constants::{TOKEN_PROGRAM, TOKEN_PROGRAM_META},
    instruction::{
        HopSwapParams, SwapInstructionBuilder, create_output_ata,
        utils::orca_v2::{SWAP_DATA_LEN, SWAP_DISCRIMINATOR, accounts, get_swap_authority_pda},
    },
    parser::types::DexProtocol,
};
use anyhow::{Result, anyhow};
use solana_sdk::instruction::{AccountMeta, Instruction};

/// Instruction builder for Orca token-swap v2
///
/// The pool's LP mint and fee account travel with the hop, read from the
/// swap account when the market was tracked.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrcaV2InstructionBuilder;

#[async_trait::async_trait]
impl SwapInstructionBuilder for OrcaV2InstructionBuilder {
    fn protocol(&self) -> DexProtocol {
        DexProtocol::OrcaV2
    }

    async fn build_swap_instructions(&self, params: &HopSwapParams) -> Result<Vec<Instruction>> {
        params.validate()?;
        let hop = &params.hop;
        if hop.protocol != DexProtocol::OrcaV2 {
            return Err(anyhow!("Hop {} is not an Orca v2 pool", hop.market_address));
        }
        let VenueAccounts::OrcaV2 { pool_mint, fee_account } = hop.venue else {
            return Err(anyhow!("Pool mint and fee account unknown for {}", hop.market_address));
        };

        let source = get_associated_token_address_with_program_id_fast(
            &params.user,
            &hop.input_mint,
            &TOKEN_PROGRAM,
        );
        let destination = get_associated_token_address_with_program_id_fast(
            &params.user,
            &hop.output_mint,
            &TOKEN_PROGRAM,
        );
        let (swap_source, swap_destination) = hop.vaults_in_out();

        let accounts: [AccountMeta; 10] = [
            AccountMeta::new_readonly(hop.market_address, false), // Swap
            AccountMeta::new_readonly(get_swap_authority_pda(&hop.market_address), false), // Authority
            AccountMeta::new_readonly(params.user, true),        // User Transfer Authority
            AccountMeta::new(source, false),                     // User Source
            AccountMeta::new(swap_source, false),                // Swap Source Vault
            AccountMeta::new(swap_destination, false),           // Swap Destination Vault
            AccountMeta::new(destination, false),                // User Destination
            AccountMeta::new(pool_mint, false),                  // Pool Mint
            AccountMeta::new(fee_account, false),                // Pool Fee Account
            TOKEN_PROGRAM_META,                                  // Token Program (readonly)
        ];

        let mut data = [0u8; SWAP_DATA_LEN];
        data[..1].copy_from_slice(SWAP_DISCRIMINATOR);
        data[1..9].copy_from_slice(&params.amount_in.to_le_bytes());
        data[9..17].copy_from_slice(&params.minimum_amount_out.to_le_bytes());

        Ok(vec![
            create_output_ata(params),
            Instruction::new_with_bytes(accounts::ORCA_TOKEN_SWAP_V2, &data, accounts.to_vec()),
        ])
    }
}
