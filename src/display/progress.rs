//! Progress tracking utilities for index builds.

use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::indexing::{ProgressEvent, ProgressPhase};

/// Create a styled progress bar for file processing.
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render build events from `events` on a progress bar until the sender hangs up.
///
/// The bar tracks files while loading and requests while embedding.
pub fn spawn_build_progress(events: Receiver<ProgressEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let pb = create_progress_bar(0, "Loading files");
        for event in events {
            match event.phase {
                ProgressPhase::Loading => {
                    pb.set_length(event.total as u64);
                    pb.set_position(event.attempted as u64);
                }
                ProgressPhase::Embedding { batch, batches } => {
                    pb.set_length(batches as u64);
                    pb.set_position(batch.saturating_sub(1) as u64);
                    pb.set_message(format!("Embedding ({} files)", event.loaded));
                }
                ProgressPhase::Complete => {
                    pb.finish_with_message(format!(
                        "Indexed {} files, skipped {}",
                        event.loaded, event.skipped
                    ));
                    return;
                }
            }
        }
        pb.finish_and_clear();
    })
}
