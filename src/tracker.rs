mod filesystem;
mod traits;

pub use filesystem::FileTracker;
pub use traits::{Tracker, MANIFEST_SLOT};
