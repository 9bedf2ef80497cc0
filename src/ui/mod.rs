pub mod progress;

pub use progress::{ProgressStats, ProgressTracker};
