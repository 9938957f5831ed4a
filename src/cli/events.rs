//! Live dashboard feed over server-sent events.
//!
//! A background task holds the `/realtime/events` stream open, decodes each
//! `dashboardUpdate` into a [`DashboardView`] and forwards it to the UI loop.
//! When the stream drops it waits and reconnects; the server replays the
//! latest view to every new subscriber, so nothing needs to be fetched again.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::api::Client;
use crate::backend::broadcast::DASHBOARD_UPDATE;
use crate::dashboard::DashboardView;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum Update {
    Connected,
    Disconnected(String),
    View(Box<DashboardView>),
}

/// One complete event from the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` parser. Feed it raw chunks as they
/// arrive; it yields events once their terminating blank line is seen.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    current: SseEvent,
    has_data: bool,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if self.has_data {
                    out.push(std::mem::take(&mut self.current));
                } else {
                    self.current = SseEvent::default();
                }
                self.has_data = false;
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (line, ""),
            };
            match field {
                "event" => self.current.event = Some(value.to_string()),
                "id" => self.current.id = Some(value.to_string()),
                "data" => {
                    if self.has_data {
                        self.current.data.push('\n');
                    }
                    self.current.data.push_str(value);
                    self.has_data = true;
                }
                _ => {}
            }
        }
        out
    }
}

/// Decodes a `dashboardUpdate` payload; other event types are ignored.
pub fn decode_view(ev: &SseEvent) -> Option<DashboardView> {
    if ev.event.as_deref().unwrap_or("message") != DASHBOARD_UPDATE {
        return None;
    }
    match serde_json::from_str(&ev.data) {
        Ok(view) => Some(view),
        Err(e) => {
            warn!(error = %e, "malformed dashboard update");
            None
        }
    }
}

/// Spawns the subscription task. It stops once the receiver is dropped.
pub fn spawn_listener(client: Client, tx: UnboundedSender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let reason = match listen_once(&client, &tx).await {
                Ok(()) => "stream closed".to_string(),
                Err(e) => e.to_string(),
            };
            if tx.is_closed() {
                debug!("ui gone, stopping realtime listener");
                return;
            }
            warn!(reason = %reason, "realtime stream lost, reconnecting");
            if tx.send(Update::Disconnected(reason)).is_err() {
                return;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

async fn listen_once(client: &Client, tx: &UnboundedSender<Update>) -> anyhow::Result<()> {
    let resp = client
        .http()
        .get(client.events_url())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    info!("subscribed to realtime updates");
    if tx.send(Update::Connected).is_err() {
        return Ok(());
    }

    let mut decoder = SseDecoder::default();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for ev in decoder.feed(&chunk) {
            if let Some(view) = decode_view(&ev) {
                if tx.send(Update::View(Box::new(view))).is_err() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}
