use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::kernel::event::{Event, SubscriptionId};
use crate::kernel::time;

/// Only this event type carries telemetry.
pub const UPDATE_EVENT: &str = "update";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Incremental `text/event-stream` parser. Chunks may split lines anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let mut raw = std::mem::take(&mut self.line);
                if raw.last() == Some(&b'\r') {
                    raw.pop();
                }
                let line = String::from_utf8_lossy(&raw);
                if let Some(frame) = self.process_line(&line) {
                    frames.push(frame);
                }
            } else {
                self.line.push(byte);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
            id: self.id.clone(),
        })
    }
}

/// Drive one subscription until the stream ends, fails or `cancel` fires.
///
/// Reports `StreamOpened` once headers arrive and `StreamLost` on any
/// failure. A cancelled subscription reports nothing.
pub async fn subscribe(
    client: Client,
    url: String,
    subscription: SubscriptionId,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let lost = |reason: String| Event::StreamLost { subscription, reason };

    let request = client
        .get(&url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send();

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        res = request => res,
    };

    let response = match response {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            let _ = tx.send(lost(format!("server returned {}", r.status()))).await;
            return;
        }
        Err(e) => {
            let _ = tx.send(lost(e.to_string())).await;
            return;
        }
    };

    info!("Stream {:?} connected to {}", subscription, url);
    if tx.send(Event::StreamOpened { subscription }).await.is_err() {
        return;
    }

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Stream {:?} closed", subscription);
                return;
            }
            chunk = body.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                for frame in decoder.feed(&bytes) {
                    if frame.event != UPDATE_EVENT {
                        debug!("Ignoring '{}' event", frame.event);
                        continue;
                    }
                    let event = Event::StreamMessage {
                        subscription,
                        payload: frame.data,
                        received_at: time::now(),
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                let _ = tx.send(lost(e.to_string())).await;
                return;
            }
            None => {
                let _ = tx.send(lost("stream ended".to_string())).await;
                return;
            }
        }
    }
}
