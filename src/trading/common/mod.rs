pub mod compute_budget_manager;
pub mod retry;
pub mod transaction_builder;

pub use retry::{RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
pub use transaction_builder::TransactionAssembler;
