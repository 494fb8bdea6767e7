pub mod common;

pub use common::{RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper, TransactionAssembler};
