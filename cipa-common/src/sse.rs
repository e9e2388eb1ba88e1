//! Server-Sent Events (SSE) utilities

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::CipaEvent;

/// Interval between heartbeat comments
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Forward bus events accepted by `filter` to an SSE client
///
/// Sends a `ConnectionStatus` event first, then heartbeats and matching events.
/// When `stop_after` returns true for a forwarded event the stream ends.
pub fn forward_events<F, S>(
    mut rx: broadcast::Receiver<CipaEvent>,
    stream_name: &'static str,
    filter: F,
    stop_after: S,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: Fn(&CipaEvent) -> bool + Send + 'static,
    S: Fn(&CipaEvent) -> bool + Send + 'static,
{
    info!("New SSE client connected to {}", stream_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    match received {
                        Ok(event) if filter(&event) => {
                            let event_type = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    debug!("SSE: Forwarding {} on {}", event_type, stream_name);
                                    yield Ok(Event::default().event(event_type).data(json));
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                                }
                            }
                            if stop_after(&event) {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("SSE: {} lagged, skipped {} events", stream_name, skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }

        info!("SSE: {} stream ended", stream_name);
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat"))
}
