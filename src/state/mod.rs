//! State management for crawl runs
//!
//! This module contains the phase state machine each marketplace crawler
//! walks through during a run.

mod crawl_phase;

pub use crawl_phase::{CrawlPhase, PhaseTracker};
