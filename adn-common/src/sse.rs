//! Server-Sent Events (SSE) utilities
//!
//! Turns the EventBus into an SSE stream with periodic heartbeats.

use crate::events::{AdnEvent, EventBus};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Create an SSE stream forwarding bus events
///
/// When `job_filter` is set only events for that job are forwarded.
/// Lagging receivers skip the dropped events and keep streaming.
pub fn create_event_sse_stream(
    event_bus: &EventBus,
    service_name: &'static str,
    job_filter: Option<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    let event: AdnEvent = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "SSE: client lagged, events dropped");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if job_filter.is_some_and(|id| id != event.job_id()) {
                        continue;
                    }

                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            yield Ok(Event::default().event(event.event_type()).data(json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event: {}", e);
                        }
                    }
                }
            }
        }

        info!("SSE: {} event stream closed", service_name);
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
