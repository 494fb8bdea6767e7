use crate::{
    common::{fast_fn::get_associated_token_address_with_program_id_fast, types::VenueAccounts},
    constants::{TOKEN_PROGRAM, TOKEN_PROGRAM_META},
    instruction::{
        HopSwapParams, SwapInstructionBuilder, create_output_ata,
        utils::raydium_cpmm::{
            SWAP_BASE_IN_DISCRIMINATOR, SWAP_DATA_LEN, accounts, get_observation_state_pda,
        },
    },
    parser::types::DexProtocol,
};
use anyhow::{Result, anyhow};
use solana_sdk::instruction::{AccountMeta, Instruction};

/// Instruction builder for Raydium CPMM (`swap_base_input`)
///
/// 程序地址: CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C
///
/// Each pool belongs to one `AmmConfig` fee tier; the config comes with the hop.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaydiumCpmmInstructionBuilder;

#[async_trait::async_trait]
impl SwapInstructionBuilder for RaydiumCpmmInstructionBuilder {
    fn protocol(&self) -> DexProtocol {
        DexProtocol::RaydiumCpmm
    }

    async fn build_swap_instructions(&self, params: &HopSwapParams) -> Result<Vec<Instruction>> {
        params.validate()?;
        let hop = &params.hop;
        if hop.protocol != DexProtocol::RaydiumCpmm {
            return Err(anyhow!("Hop {} is not a Raydium CPMM pool", hop.market_address));
        }

        let VenueAccounts::RaydiumCpmm { amm_config } = hop.venue else {
            return Err(anyhow!("Amm config unknown for {}", hop.market_address));
        };

        let input_token_account = get_associated_token_address_with_program_id_fast(
            &params.user,
            &hop.input_mint,
            &TOKEN_PROGRAM,
        );
        let output_token_account = get_associated_token_address_with_program_id_fast(
            &params.user,
            &hop.output_mint,
            &TOKEN_PROGRAM,
        );
        let (input_vault, output_vault) = hop.vaults_in_out();
        let observation_state = get_observation_state_pda(&hop.market_address);

        let accounts: [AccountMeta; 13] = [
            AccountMeta::new(params.user, true),              // Payer (signer)
            accounts::AUTHORITY_META,                         // Authority (readonly)
            AccountMeta::new_readonly(amm_config, false),      // Amm Config (readonly)
            AccountMeta::new(hop.market_address, false),      // Pool State
            AccountMeta::new(input_token_account, false),     // Input Token Account
            AccountMeta::new(output_token_account, false),    // Output Token Account
            AccountMeta::new(input_vault, false),             // Input Vault Account
            AccountMeta::new(output_vault, false),            // Output Vault Account
            TOKEN_PROGRAM_META,                               // Input Token Program (readonly)
            TOKEN_PROGRAM_META,                               // Output Token Program (readonly)
            AccountMeta::new_readonly(hop.input_mint, false), // Input token mint (readonly)
            AccountMeta::new_readonly(hop.output_mint, false), // Output token mint (readonly)
            AccountMeta::new(observation_state, false),       // Observation State Account
        ];

        let mut data = [0u8; SWAP_DATA_LEN];
        data[..8].copy_from_slice(SWAP_BASE_IN_DISCRIMINATOR);
        data[8..16].copy_from_slice(&params.amount_in.to_le_bytes());
        data[16..24].copy_from_slice(&params.minimum_amount_out.to_le_bytes());

        Ok(vec![
            create_output_ata(params),
            Instruction::new_with_bytes(accounts::RAYDIUM_CPMM, &data, accounts.to_vec()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::SwapDirection;
    use crate::routing::fixtures::{market, mint};
    use crate::routing::types::DexRoute;
    use solana_sdk::pubkey::Pubkey;

    fn params(venue: VenueAccounts) -> HopSwapParams {
        let (a, b) = (mint(), mint());
        let mut market = market(a, b, 1_000, 1_000);
        market.protocol = DexProtocol::RaydiumCpmm;
        market.venue = venue;
        HopSwapParams {
            // entering with the quote mint: vaults swap roles
            hop: DexRoute::through(&market, &b).unwrap(),
            user: Pubkey::new_unique(),
            amount_in: 5_000,
            minimum_amount_out: 4_000,
        }
    }

    #[tokio::test]
    async fn test_swap_base_input_layout() {
        let amm_config = Pubkey::new_unique();
        let params = params(VenueAccounts::RaydiumCpmm { amm_config });
        assert_eq!(params.hop.direction, SwapDirection::QuoteToBase);
        let instructions = RaydiumCpmmInstructionBuilder
            .build_swap_instructions(&params)
            .await
            .unwrap();
        assert_eq!(instructions.len(), 2);

        let swap = &instructions[1];
        assert_eq!(swap.program_id, accounts::RAYDIUM_CPMM);
        assert_eq!(swap.data[..8], [143, 190, 90, 218, 196, 30, 51, 222]);
        assert_eq!(swap.data[8..16], 5_000u64.to_le_bytes());
        assert_eq!(swap.data[16..24], 4_000u64.to_le_bytes());
        assert_eq!(swap.accounts.len(), 13);
        assert_eq!(swap.accounts[2].pubkey, amm_config);
        assert_eq!(swap.accounts[6].pubkey, params.hop.quote_vault);
        assert_eq!(swap.accounts[7].pubkey, params.hop.base_vault);
        assert_eq!(swap.accounts[10].pubkey, params.hop.input_mint);
        assert_eq!(swap.accounts[12].pubkey, get_observation_state_pda(&params.hop.market_address));
    }

    #[tokio::test]
    async fn test_requires_amm_config() {
        let err = RaydiumCpmmInstructionBuilder
            .build_swap_instructions(&params(VenueAccounts::None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Amm config unknown"));
    }
}
