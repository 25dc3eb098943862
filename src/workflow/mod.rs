pub mod harvest_flow;
pub mod item_ctx;

pub use harvest_flow::{HarvestFlow, HarvestOutcome, HarvestState};
pub use item_ctx::ItemCtx;
