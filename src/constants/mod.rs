pub mod accounts;
pub mod tokens;
pub mod trade;
pub mod trade_platform;

pub use accounts::*;
pub use tokens::*;
pub use trade_platform::trade_platform as platforms;
