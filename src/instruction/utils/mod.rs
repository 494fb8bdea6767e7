pub mod orca_v2;
pub mod raydium_amm_v4;
pub mod raydium_cpmm;

// types
pub mod orca_v2_types;
pub mod raydium_amm_v4_types;
pub mod raydium_cpmm_types;
