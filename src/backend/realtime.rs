//! Realtime delivery of `dashboardUpdate` events.
//!
//! Two transports carry the same publications: a WebSocket for browser
//! clients and Server-Sent Events for the terminal client. Both start with
//! the current snapshot and then forward every publication in order.

use std::convert::Infallible;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        Response,
    },
};
use futures::{SinkExt, Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::broadcast::{BroadcastChannel, Published, Subscription, DASHBOARD_UPDATE};
use crate::backend::AppState;
use crate::dashboard::DashboardView;

#[derive(Serialize)]
struct RealtimeMessage<'a> {
    event: &'static str,
    data: &'a DashboardView,
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let channel = state.gateway.channel().clone();
    let subscription = channel.subscribe();
    ws.on_upgrade(move |socket| push_over_websocket(socket, subscription, channel))
}

async fn push_over_websocket(
    socket: WebSocket,
    mut subscription: Subscription,
    channel: BroadcastChannel,
) {
    info!(subscribers = channel.subscriber_count(), "realtime websocket connected");
    let (mut sender, mut receiver) = socket.split();

    // Inbound frames are only watched for the close; clients never send data.
    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            next = subscription.next() => {
                let Some(published) = next else { break };
                let message = RealtimeMessage {
                    event: DASHBOARD_UPDATE,
                    data: published.view.as_ref(),
                };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "failed to encode dashboard view");
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
                debug!(seq = published.seq, "dashboard view pushed over websocket");
            }
            _ = &mut inbound => break,
        }
    }

    inbound.abort();
    drop(subscription);
    info!(subscribers = channel.subscriber_count(), "realtime websocket disconnected");
}

pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let channel = state.gateway.channel();
    let subscription = channel.subscribe();
    info!(subscribers = channel.subscriber_count(), "realtime event stream connected");
    let events = subscription
        .into_stream()
        .filter_map(|published| async move { sse_event(&published) })
        .map(Ok);

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn sse_event(published: &Published) -> Option<Event> {
    match Event::default()
        .event(DASHBOARD_UPDATE)
        .id(published.seq.to_string())
        .json_data(published.view.as_ref())
    {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "failed to encode dashboard view");
            None
        }
    }
}
