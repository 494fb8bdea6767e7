pub mod discovery;
pub mod optimizer;
pub mod split;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use discovery::{DiscoveryOptions, discover_routes};
pub use optimizer::{rank_routes, simulate_route};
pub use split::{SplitAllocation, SplitPlan, allocate_amounts, plan_split, select_disjoint_routes};
pub use types::{DexRoute, HopQuote, RoutingInfo};
