// src/notify/dispatch.rs
use metrics::counter;
use std::time::Duration;

use super::ChatSink;
use crate::error::NotifierError;
use crate::render::{MessageBody, OutboundMessage};

/// What one dispatch pass achieved.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub chunks_total: usize,
    pub chunks_sent: usize,
    /// Ids carried by chunks the platform accepted, in send order.
    pub delivered_ids: Vec<String>,
    /// The error that stopped the pass; later chunks were not attempted.
    pub failure: Option<NotifierError>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failure.is_none() && self.chunks_sent == self.chunks_total
    }
}

/// Send `messages` in consecutive chunks of at most `limit` objects, one
/// request per chunk, sleeping `pacing` between requests. No retries: the
/// first rejected chunk ends the pass.
pub async fn dispatch(
    sink: &dyn ChatSink,
    messages: &[OutboundMessage],
    limit: usize,
    pacing: Duration,
) -> DispatchReport {
    let limit = limit.max(1);
    let mut report = DispatchReport {
        chunks_total: messages.len().div_ceil(limit),
        ..DispatchReport::default()
    };

    for (i, chunk) in messages.chunks(limit).enumerate() {
        if i > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }

        let bodies: Vec<MessageBody> = chunk.iter().map(|m| m.body.clone()).collect();
        counter!("notifier_dispatch_requests_total").increment(1);

        match sink.send(&bodies).await {
            Ok(()) => {
                report.chunks_sent += 1;
                report
                    .delivered_ids
                    .extend(chunk.iter().flat_map(|m| m.item_ids.iter().cloned()));
                tracing::info!(
                    platform = %sink.platform(),
                    chunk = i + 1,
                    of = report.chunks_total,
                    objects = chunk.len(),
                    "chunk delivered"
                );
            }
            Err(e) => {
                counter!("notifier_dispatch_failures_total").increment(1);
                tracing::error!(
                    platform = %sink.platform(),
                    chunk = i + 1,
                    of = report.chunks_total,
                    error = %e,
                    "chunk rejected; stopping dispatch"
                );
                report.failure = Some(e);
                break;
            }
        }
    }

    report
}
