//! Terminal display utilities for the command-line front end.

pub mod progress;

pub use progress::{create_progress_bar, spawn_build_progress};
