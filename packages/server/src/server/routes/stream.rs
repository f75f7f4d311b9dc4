//! SSE streaming endpoint.
//!
//! GET /api/events/stream
//!
//! Subscribes to the in-process publisher and forwards each progress event as
//! an SSE event named after its kind. Subscribers see events from the moment
//! of connection onward; history is served by the run endpoints, not replayed
//! here.

use std::convert::Infallible;

use axum::extract::Extension;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::server::app::AppState;

pub async fn stream_events(
    Extension(state): Extension<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.publisher.subscribe().await;

    let stream = UnboundedReceiverStream::new(subscription.into_receiver()).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(event.kind.as_str()).data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
