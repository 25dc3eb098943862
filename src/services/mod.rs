pub mod extraction;
pub mod skip_ledger;
pub mod timestamp;

pub use skip_ledger::{SkipLedger, STORE_LINK_COLUMN};
pub use timestamp::normalize_timestamp;
