//! Photo sorting on top of the Graph client:
//!
//! - Classification of drive items (mime-type prefixes, capture timestamps)
//! - A background queue that batches moves twenty at a time
//! - The run orchestrator tying enumeration, classification, folder
//!   resolution and moving together into a single report

pub mod classify;
pub mod move_queue;
pub mod run;

pub use classify::{capture_timestamp, should_move, DEFAULT_ALLOWED_TYPES};
pub use move_queue::{BatchMoveQueue, MoveOrder, MoveStats};
pub use run::{sort_photos, RunReport, SortOptions};
