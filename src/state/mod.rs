//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ItemKind`: Distinguishes pages (parsed for links) from assets (saved only)
//! - `ItemState`: Tracks the lifecycle of an individual work item
//! - `Throttle`: Per-worker politeness delay between successive requests

mod item_state;
mod throttle;

// Re-export main types
pub use item_state::{ItemKind, ItemState};
pub use throttle::Throttle;
