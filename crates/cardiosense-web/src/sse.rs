//! Server-Sent Events (SSE) stream of prediction and advice events.

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::extract::State;
use futures_core::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::SharedState;

/// SSE endpoint that dashboards subscribe to for live activity.
/// Lagged receivers skip the missed events rather than disconnect.
pub async fn sse_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx)
        .filter_map(|result| {
            result.ok().and_then(|event| {
                let name = event_name(&event);
                serde_json::to_string(&event).ok().map(|data| {
                    Ok(Event::default().event(name).data(data))
                })
            })
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn event_name(event: &crate::state::AppEvent) -> &'static str {
    use crate::state::AppEvent;
    match event {
        AppEvent::PredictionMade { .. }       => "prediction",
        AppEvent::BatchCompleted { .. }       => "batch",
        AppEvent::RecommendationServed { .. } => "recommendation",
    }
}
