use solana_sdk::pubkey::Pubkey;

pub mod accounts {
    use solana_sdk::{pubkey, pubkey::Pubkey};

    pub const ORCA_TOKEN_SWAP_V2: Pubkey = pubkey!("9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP");
}

/// Token-swap `Swap` instruction tag
pub const SWAP_DISCRIMINATOR: &[u8] = &[1];

pub const SWAP_DATA_LEN: usize = 17;

/// Swap authority: PDA of the swap account under the program.
pub fn get_swap_authority_pda(swap: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[swap.as_ref()], &accounts::ORCA_TOKEN_SWAP_V2).0
}
