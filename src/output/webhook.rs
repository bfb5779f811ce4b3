//! Webhook delivery pipeline
//!
//! Records are buffered into fixed-size batches and POSTed as a JSON array.
//! Consecutive sends are separated by a pacing floor. A failed batch is
//! logged and counted, never returned to the caller.

use crate::crawler::PacingFloor;
use crate::record::CanonicalRecord;
use reqwest::Client;
use std::time::Duration;

/// Counters reported by [`DeliveryPipeline::flush`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Records in batches accepted with a 2xx response
    pub sent: u64,

    /// Records in batches that failed
    pub failed: u64,

    /// Batches attempted
    pub batches: u64,
}

/// Buffers records and delivers them to the webhook in batches
///
/// Without an endpoint the pipeline accepts everything and sends nothing.
#[derive(Debug)]
pub struct DeliveryPipeline {
    client: Client,
    endpoint: Option<String>,
    batch_size: usize,
    pacing: PacingFloor,
    buffer: Vec<CanonicalRecord>,
    stats: DeliveryStats,
}

impl DeliveryPipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (its timeout applies to each send)
    /// * `endpoint` - Webhook URL; `None` disables delivery
    /// * `batch_size` - Records per POST (at least 1)
    /// * `batch_delay` - Pacing floor between consecutive sends
    pub fn new(
        client: Client,
        endpoint: Option<String>,
        batch_size: usize,
        batch_delay: Duration,
    ) -> Self {
        let batch_size = batch_size.max(1);
        if endpoint.is_none() {
            tracing::info!("No webhook configured; delivery disabled");
        }

        Self {
            client,
            endpoint,
            batch_size,
            pacing: PacingFloor::new(batch_delay),
            buffer: Vec::with_capacity(batch_size),
            stats: DeliveryStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Records waiting for the next send
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Accepts one record, sending a batch once the buffer is full
    pub async fn push(&mut self, record: CanonicalRecord) {
        if !self.is_enabled() {
            return;
        }

        self.buffer.push(record);
        if self.buffer.len() >= self.batch_size {
            self.send_buffered().await;
        }
    }

    /// Sends any partial final batch and returns the delivery counters
    ///
    /// Consumes the pipeline, so it can only run once.
    pub async fn flush(mut self) -> DeliveryStats {
        if !self.buffer.is_empty() {
            self.send_buffered().await;
        }

        if self.is_enabled() {
            tracing::info!(
                "Webhook delivery finished: {} sent, {} failed in {} batches",
                self.stats.sent,
                self.stats.failed,
                self.stats.batches
            );
        }

        self.stats
    }

    async fn send_buffered(&mut self) {
        let Some(endpoint) = self.endpoint.as_deref() else {
            self.buffer.clear();
            return;
        };

        let batch = std::mem::take(&mut self.buffer);
        let count = batch.len() as u64;

        self.pacing.wait().await;
        let result = self.client.post(endpoint).json(&batch).send().await;
        self.pacing.mark_finished();

        self.stats.batches += 1;
        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Sent batch of {} records to webhook", count);
                self.stats.sent += count;
            }
            Ok(response) => {
                tracing::error!(
                    "Webhook rejected batch of {} records: HTTP {}",
                    count,
                    response.status().as_u16()
                );
                self.stats.failed += count;
            }
            Err(e) => {
                tracing::error!("Failed to send batch of {} records: {}", count, e);
                self.stats.failed += count;
            }
        }
    }
}
