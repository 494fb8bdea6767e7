pub mod trade {
    /// Default slippage tolerance in basis points (1%).
    pub const DEFAULT_SLIPPAGE: u64 = 100;
    /// Basis-point denominator used for slippage.
    pub const BPS_DENOMINATOR: u64 = 10_000;
    pub const DEFAULT_MAX_HOPS: usize = 2;
    pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 8;
    pub const DEFAULT_MAX_CANDIDATE_PATHS: usize = 512;
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
}
