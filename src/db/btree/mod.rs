//! On-disk B-tree: fixed 512-byte blocks, a bounded page cache, and
//! the search/insert/split algorithms that keep the tree balanced.

pub mod cache;
pub mod codec;
pub mod engine;
pub mod loader;
pub mod store;
pub mod traversal;

pub use codec::{BLOCK_SIZE, MAX_CHILDREN, MAX_KEYS, MIN_KEYS};
pub use engine::BTree;
pub use loader::{load, LoadSummary};
