use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

pub const TOKEN_PROGRAM: Pubkey = spl_token::ID;
pub const ASSOCIATED_TOKEN_PROGRAM: Pubkey = spl_associated_token_account::ID;

// META

pub const TOKEN_PROGRAM_META: AccountMeta =
    AccountMeta { pubkey: TOKEN_PROGRAM, is_signer: false, is_writable: false };
