use solana_sdk::pubkey::Pubkey;

/// Constants used as seeds for deriving PDAs (Program Derived Addresses)
pub mod seeds {
    pub const OBSERVATION_STATE_SEED: &[u8] = b"observation";
}

/// Constants related to program accounts and authorities
pub mod accounts {
    use solana_sdk::{instruction::AccountMeta, pubkey, pubkey::Pubkey};

    pub const AUTHORITY: Pubkey = pubkey!("GpMZbSM2GgvTKHJirzeGfMFoaZ8UR2X7F4v8vHTvxFbL");
    pub const RAYDIUM_CPMM: Pubkey = pubkey!("CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C");

    // META

    pub const AUTHORITY_META: AccountMeta =
        AccountMeta { pubkey: AUTHORITY, is_signer: false, is_writable: false };
}

/// Anchor `swap_base_input`
pub const SWAP_BASE_IN_DISCRIMINATOR: &[u8] = &[143, 190, 90, 218, 196, 30, 51, 222];

pub const SWAP_DATA_LEN: usize = 24;

pub fn get_observation_state_pda(pool_state: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[seeds::OBSERVATION_STATE_SEED, pool_state.as_ref()],
        &accounts::RAYDIUM_CPMM,
    )
    .0
}
