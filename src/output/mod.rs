//! Output module for delivering harvested records
//!
//! This module handles:
//! - Writing each run's records to a local JSON file
//! - Batching records to the optional webhook sink
//! - Recording run statistics

mod local;
pub mod stats;
mod webhook;

pub use local::{output_file_name, JsonFileSink, OutputResult, RecordSink};
pub use stats::{print_statistics, RunStats};
pub use webhook::{DeliveryPipeline, DeliveryStats};
