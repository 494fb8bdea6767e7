use crate::{
    common::fast_fn::get_associated_token_address_with_program_id_fast,
    constants::{TOKEN_PROGRAM, TOKEN_PROGRAM_META},
    instruction::{
        HopSwapParams, SwapInstructionBuilder, create_output_ata,
        utils::raydium_amm_v4::{SWAP_BASE_IN_DISCRIMINATOR, SWAP_DATA_LEN, accounts},
    },
    parser::types::DexProtocol,
};
use anyhow::{Result, anyhow};
use solana_sdk::instruction::{AccountMeta, Instruction};

/// Instruction builder for Raydium AMM V4 (Raydium Liquidity Pool V4) protocol
///
/// Raydium AMM V4 使用恒定乘积公式（x * y = k）进行交易
/// 程序地址: 675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8
pub struct RaydiumAmmV4InstructionBuilder;

#[async_trait::async_trait]
impl SwapInstructionBuilder for RaydiumAmmV4InstructionBuilder {
    fn protocol(&self) -> DexProtocol {
        DexProtocol::RaydiumAmmV4
    }

    async fn build_swap_instructions(&self, params: &HopSwapParams) -> Result<Vec<Instruction>> {
        params.validate()?;
        let hop = &params.hop;
        if hop.protocol != DexProtocol::RaydiumAmmV4 {
            return Err(anyhow!("Hop {} is not a Raydium AMM V4 market", hop.market_address));
        }

        let user_source_token_account = get_associated_token_address_with_program_id_fast(
            &params.user,
            &hop.input_mint,
            &TOKEN_PROGRAM,
        );
        let user_destination_token_account = get_associated_token_address_with_program_id_fast(
            &params.user,
            &hop.output_mint,
            &TOKEN_PROGRAM,
        );
        let amm = hop.market_address;

        // Pools without an OpenBook market take the amm account in every serum slot.
        let accounts: [AccountMeta; 17] = [
            TOKEN_PROGRAM_META,                                      // Token Program (readonly)
            AccountMeta::new(amm, false),                            // Amm
            accounts::AUTHORITY_META,                                // Authority (readonly)
            AccountMeta::new(amm, false),                            // Amm Open Orders
            AccountMeta::new(hop.base_vault, false),                 // Pool Coin Token Account
            AccountMeta::new(hop.quote_vault, false),                // Pool Pc Token Account
            AccountMeta::new(amm, false),                            // Serum Program
            AccountMeta::new(amm, false),                            // Serum Market
            AccountMeta::new(amm, false),                            // Serum Bids
            AccountMeta::new(amm, false),                            // Serum Asks
            AccountMeta::new(amm, false),                            // Serum Event Queue
            AccountMeta::new(amm, false),                            // Serum Coin Vault Account
            AccountMeta::new(amm, false),                            // Serum Pc Vault Account
            AccountMeta::new(amm, false),                            // Serum Vault Signer
            AccountMeta::new(user_source_token_account, false),      // User Source Token Account
            AccountMeta::new(user_destination_token_account, false), // User Destination Token Account
            AccountMeta::new(params.user, true),                     // User Source Owner
        ];

        let mut data = [0u8; SWAP_DATA_LEN];
        data[..1].copy_from_slice(SWAP_BASE_IN_DISCRIMINATOR);
        data[1..9].copy_from_slice(&params.amount_in.to_le_bytes());
        data[9..17].copy_from_slice(&params.minimum_amount_out.to_le_bytes());

        Ok(vec![
            create_output_ata(params),
            Instruction::new_with_bytes(accounts::RAYDIUM_AMM_V4, &data, accounts.to_vec()),
        ])
    }
}
