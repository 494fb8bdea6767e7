pub mod trade_platform {
    pub const RAYDIUM_AMM_V4: &str = "raydium_amm_v4"; // Raydium Liquidity Pool V4 (程序地址: 675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8)
    pub const RAYDIUM_CPMM: &str = "raydium_cpmm";
    pub const RAYDIUM_CLMM: &str = "raydium_clmm";
    pub const ORCA_V2: &str = "orca_v2"; // Orca Token Swap V2 (程序地址: 9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP)
}
