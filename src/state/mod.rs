//! State module for tracking chain progress
//!
//! The only durable state is the checkpoint: how many pages have been fully
//! processed and which page was the last one. It lives next to the assets
//! in the output directory.

mod checkpoint;

pub use checkpoint::{
    checkpoint_path, load_checkpoint, save_checkpoint, Checkpoint, CheckpointError,
    CHECKPOINT_FILENAME, MAX_PAGE_INDEX,
};
