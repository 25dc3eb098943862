pub mod game;
pub mod ledger;
pub mod loaders;
pub mod review;

pub use game::{item_slug, AttributeLabel, CatalogRow, EnrichedAttributes, GameRecord};
pub use ledger::{SkipLedgerEntry, SkipReason};
pub use loaders::{load_catalog, parse_catalog};
pub use review::{HelpfulVotes, RawReview, ReviewRecord, UNKNOWN};
