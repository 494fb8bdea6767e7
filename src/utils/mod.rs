pub mod calc;
pub mod quote;

pub use quote::{SwapQuote, quote_exact_in};
