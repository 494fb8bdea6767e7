//! 池账户解析模块

pub mod pool_codec;
pub mod types;
pub mod utils;

pub use pool_codec::{
    PoolAccount, RawMarketAccounts, decode_pool_account, decode_pool_state, decode_pool_state_by_tag,
};
pub use types::*;
pub use utils::BinaryReader;
