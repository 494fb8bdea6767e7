/// Constants related to program accounts and authorities
pub mod accounts {
    use solana_sdk::{instruction::AccountMeta, pubkey, pubkey::Pubkey};

    pub const AUTHORITY: Pubkey = pubkey!("5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1");
    pub const RAYDIUM_AMM_V4: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

    // META

    pub const AUTHORITY_META: AccountMeta =
        AccountMeta { pubkey: AUTHORITY, is_signer: false, is_writable: false };
}

pub const SWAP_BASE_IN_DISCRIMINATOR: &[u8] = &[9];

/// discriminator + amount_in + minimum_amount_out
pub const SWAP_DATA_LEN: usize = 17;
